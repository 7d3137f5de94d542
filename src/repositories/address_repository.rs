use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    models::{Address, AddressId, AddressType},
};

/// Row of the backend `addresses` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub id: String,
    pub user_id: Uuid,
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub is_default: bool,
    #[serde(rename = "type")]
    pub address_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AddressRecord {
    pub fn from_address(user_id: Uuid, address: &Address, created_at: DateTime<Utc>) -> Self {
        Self {
            id: address.id.to_string(),
            user_id,
            name: address.name.clone(),
            phone: address.phone.clone(),
            address_line1: address.address_line1.clone(),
            address_line2: address.address_line2.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            pincode: address.pincode.clone(),
            is_default: address.is_default,
            address_type: address.address_type.to_string(),
            created_at,
            updated_at: None,
        }
    }

    /// Copies the mutable columns of `address` onto this row.
    fn overwrite(&mut self, address: &Address, updated_at: DateTime<Utc>) {
        self.name = address.name.clone();
        self.phone = address.phone.clone();
        self.address_line1 = address.address_line1.clone();
        self.address_line2 = address.address_line2.clone();
        self.city = address.city.clone();
        self.state = address.state.clone();
        self.pincode = address.pincode.clone();
        self.is_default = address.is_default;
        self.address_type = address.address_type.to_string();
        self.updated_at = Some(updated_at);
    }
}

impl From<AddressRecord> for Address {
    fn from(record: AddressRecord) -> Self {
        let address_type = AddressType::from_str(&record.address_type).unwrap_or_else(|_| {
            warn!(address_id = %record.id, value = %record.address_type, "Unknown address type, using Other");
            AddressType::Other
        });

        Address {
            id: AddressId::from(record.id),
            name: record.name,
            phone: record.phone,
            address_line1: record.address_line1,
            address_line2: record.address_line2,
            city: record.city,
            state: record.state,
            pincode: record.pincode,
            address_type,
            is_default: record.is_default,
        }
    }
}

/// Persistence seam for a user's addresses.
///
/// Implementations stamp `created_at` on insert and `updated_at` on update.
/// Failures are reported as [`ServiceError::Persistence`]; a missing row is
/// [`ServiceError::NotFound`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// All rows for `user_id`, oldest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<AddressRecord>, ServiceError>;
    async fn insert(&self, user_id: Uuid, address: &Address)
        -> Result<AddressRecord, ServiceError>;
    async fn update(&self, address: &Address) -> Result<AddressRecord, ServiceError>;
    /// Removes a row and returns it as stored.
    async fn delete(&self, id: &AddressId) -> Result<AddressRecord, ServiceError>;
    /// Puts a deleted row back unchanged, keeping its `created_at` and its
    /// place in the listing order.
    async fn restore(&self, record: &AddressRecord) -> Result<(), ServiceError>;
}

/// In-memory address table
///
/// Rows are listed by insertion sequence. Deleted rows leave their sequence
/// behind so a restore lands in the same place.
#[derive(Debug, Default)]
pub struct InMemoryAddressRepository {
    rows: DashMap<AddressId, (u64, AddressRecord)>,
    retired: DashMap<AddressId, u64>,
    sequence: AtomicU64,
}

impl InMemoryAddressRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &AddressId) -> Option<AddressRecord> {
        self.rows.get(id).map(|row| row.value().1.clone())
    }

    /// Every stored row across all users, in listing order.
    pub fn records(&self) -> Vec<AddressRecord> {
        let mut rows: Vec<(u64, AddressRecord)> =
            self.rows.iter().map(|row| row.value().clone()).collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, record)| record).collect()
    }
}

#[async_trait]
impl AddressRepository for InMemoryAddressRepository {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<AddressRecord>, ServiceError> {
        let mut rows: Vec<(u64, AddressRecord)> = self
            .rows
            .iter()
            .filter(|row| row.value().1.user_id == user_id)
            .map(|row| row.value().clone())
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        Ok(rows.into_iter().map(|(_, record)| record).collect())
    }

    async fn insert(
        &self,
        user_id: Uuid,
        address: &Address,
    ) -> Result<AddressRecord, ServiceError> {
        use dashmap::mapref::entry::Entry;

        match self.rows.entry(address.id.clone()) {
            Entry::Occupied(_) => Err(ServiceError::Persistence(format!(
                "duplicate key value violates unique constraint on addresses.id ({})",
                address.id
            ))),
            Entry::Vacant(slot) => {
                let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
                let record = AddressRecord::from_address(user_id, address, Utc::now());
                slot.insert((seq, record.clone()));
                debug!(address_id = %address.id, "Inserted address row");
                Ok(record)
            }
        }
    }

    async fn update(&self, address: &Address) -> Result<AddressRecord, ServiceError> {
        let mut row = self
            .rows
            .get_mut(&address.id)
            .ok_or_else(|| ServiceError::not_found("Address", &address.id))?;
        row.value_mut().1.overwrite(address, Utc::now());
        Ok(row.value().1.clone())
    }

    async fn delete(&self, id: &AddressId) -> Result<AddressRecord, ServiceError> {
        let (_, (seq, record)) = self
            .rows
            .remove(id)
            .ok_or_else(|| ServiceError::not_found("Address", id))?;
        self.retired.insert(id.clone(), seq);
        debug!(address_id = %id, "Deleted address row");
        Ok(record)
    }

    async fn restore(&self, record: &AddressRecord) -> Result<(), ServiceError> {
        use dashmap::mapref::entry::Entry;

        let id = AddressId::from(record.id.as_str());
        match self.rows.entry(id.clone()) {
            Entry::Occupied(_) => Err(ServiceError::Persistence(format!(
                "duplicate key value violates unique constraint on addresses.id ({})",
                id
            ))),
            Entry::Vacant(slot) => {
                let seq = self
                    .retired
                    .remove(&id)
                    .map(|(_, seq)| seq)
                    .unwrap_or_else(|| self.sequence.fetch_add(1, Ordering::SeqCst));
                slot.insert((seq, record.clone()));
                debug!(address_id = %id, "Restored address row");
                Ok(())
            }
        }
    }
}
