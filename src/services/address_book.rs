use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::{
    errors::ServiceError,
    models::{Address, AddressId, AddressPatch, NewAddress},
    services::default_slot,
};

/// The shopper's delivery addresses.
///
/// Holds addresses in insertion order and keeps two invariants through every
/// operation:
/// - a non-empty book has exactly one default address;
/// - the selected address, if any, is still in the book.
///
/// The book is plain owned state. Construct one explicitly and hand it to the
/// code that needs it; see [`AddressBookService`](super::address_sync::AddressBookService)
/// for a persistence-backed wrapper.
///
/// Deserializing goes through [`from_addresses`](Self::from_addresses), so a
/// stored snapshot cannot smuggle in a second default or a stale selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredAddressBook")]
pub struct AddressBook {
    addresses: Vec<Address>,
    selected_id: Option<AddressId>,
}

/// Serialized shape of an [`AddressBook`].
#[derive(Deserialize)]
struct StoredAddressBook {
    addresses: Vec<Address>,
    #[serde(default)]
    selected_id: Option<AddressId>,
}

impl TryFrom<StoredAddressBook> for AddressBook {
    type Error = ServiceError;

    fn try_from(stored: StoredAddressBook) -> Result<Self, Self::Error> {
        let mut book = Self::from_addresses(stored.addresses)?;
        match stored.selected_id {
            Some(id) if book.get(&id).is_some() => book.selected_id = Some(id),
            Some(id) => warn!(address_id = %id, "Dropping selection of unknown address"),
            None => {}
        }
        Ok(book)
    }
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book from existing records, e.g. rows loaded from the backend.
    ///
    /// Duplicate ids are rejected. Default flags are normalized: the first
    /// flagged address stays default, extra flags are cleared, and with no
    /// flag at all the first address becomes the default.
    pub fn from_addresses(mut addresses: Vec<Address>) -> Result<Self, ServiceError> {
        let mut seen = HashSet::with_capacity(addresses.len());
        for address in &addresses {
            if !seen.insert(address.id.clone()) {
                return Err(ServiceError::ValidationError(format!(
                    "Duplicate address id {}",
                    address.id
                )));
            }
        }

        if default_slot::default_count(&addresses) != 1 && !addresses.is_empty() {
            warn!(
                count = addresses.len(),
                "Normalizing default flag on loaded addresses"
            );
        }
        default_slot::repair(&mut addresses);

        Ok(Self {
            addresses,
            selected_id: None,
        })
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn get(&self, id: &AddressId) -> Option<&Address> {
        self.addresses.iter().find(|a| &a.id == id)
    }

    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default)
    }

    pub fn selected_id(&self) -> Option<&AddressId> {
        self.selected_id.as_ref()
    }

    /// Adds a new address and returns it with its generated id.
    ///
    /// The first address in an empty book always becomes the default, as does
    /// any address added with `is_default` set.
    pub fn add(&mut self, input: NewAddress) -> Address {
        let id = self.fresh_id();
        let becomes_default = input.is_default || self.addresses.is_empty();

        let mut address = Address::from_input(id, input);
        address.is_default = becomes_default;
        self.addresses.push(address);

        let last = self.addresses.len() - 1;
        if becomes_default {
            default_slot::promote(&mut self.addresses, last);
        }
        self.check_invariants();

        let added = &self.addresses[last];
        debug!(address_id = %added.id, is_default = added.is_default, "Address added");
        added.clone()
    }

    /// Applies a partial update to an address.
    ///
    /// `is_default: Some(true)` moves the default to this address.
    /// `is_default: Some(false)` is ignored: a default can only be moved by
    /// promoting another address.
    pub fn update(&mut self, id: &AddressId, patch: AddressPatch) -> Result<(), ServiceError> {
        let index = self.position(id)?;

        if patch.is_default == Some(true) {
            default_slot::promote(&mut self.addresses, index);
        } else if patch.is_default == Some(false) && self.addresses[index].is_default {
            debug!(address_id = %id, "Ignoring request to unset the default address");
        }

        self.addresses[index].apply(patch);
        self.check_invariants();

        debug!(address_id = %id, "Address updated");
        Ok(())
    }

    /// Removes an address and returns it.
    ///
    /// Removing the default promotes the first remaining address (insertion
    /// order). Removing the selected address clears the selection, so
    /// [`resolve_active`](Self::resolve_active) falls back to the default.
    pub fn remove(&mut self, id: &AddressId) -> Result<Address, ServiceError> {
        let index = self.position(id)?;
        let removed = self.addresses.remove(index);

        if removed.is_default && !self.addresses.is_empty() {
            default_slot::promote(&mut self.addresses, 0);
        }
        if self.selected_id.as_ref() == Some(id) {
            self.selected_id = None;
        }
        self.check_invariants();

        debug!(address_id = %id, was_default = removed.is_default, "Address removed");
        Ok(removed)
    }

    /// Makes `id` the one default address. Idempotent.
    pub fn set_default(&mut self, id: &AddressId) -> Result<(), ServiceError> {
        let index = self.position(id)?;
        default_slot::promote(&mut self.addresses, index);
        self.check_invariants();

        debug!(address_id = %id, "Default address changed");
        Ok(())
    }

    /// Chooses `id` for delivery of the current checkout. Leaves the default
    /// untouched.
    pub fn select(&mut self, id: &AddressId) -> Result<(), ServiceError> {
        self.position(id)?;
        self.selected_id = Some(id.clone());

        debug!(address_id = %id, "Address selected");
        Ok(())
    }

    /// Forgets the explicit selection; the default applies again.
    pub fn clear_selection(&mut self) {
        self.selected_id = None;
    }

    /// The address checkout should deliver to: the selected one if it is
    /// still present, else the default, else `None` for an empty book.
    pub fn resolve_active(&self) -> Option<&Address> {
        self.selected_id
            .as_ref()
            .and_then(|id| self.get(id))
            .or_else(|| self.default_address())
    }

    fn position(&self, id: &AddressId) -> Result<usize, ServiceError> {
        self.addresses
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| {
                warn!(address_id = %id, "Address not found");
                ServiceError::not_found("Address", id)
            })
    }

    fn fresh_id(&self) -> AddressId {
        loop {
            let id = AddressId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn check_invariants(&self) {
        debug_assert!(
            self.addresses.is_empty() || default_slot::default_count(&self.addresses) == 1,
            "address book must hold exactly one default"
        );
        debug_assert!(
            self.selected_id
                .as_ref()
                .map_or(true, |id| self.get(id).is_some()),
            "selected address must be present"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AddressType;
    use assert_matches::assert_matches;

    fn input(name: &str, is_default: bool) -> NewAddress {
        NewAddress {
            name: name.into(),
            phone: "+91 9876543210".into(),
            address_line1: "42, Tech Park".into(),
            address_line2: None,
            city: "Bangalore".into(),
            state: "Karnataka".into(),
            pincode: "560066".into(),
            address_type: AddressType::Work,
            is_default,
        }
    }

    fn defaults(book: &AddressBook) -> Vec<&str> {
        book.addresses()
            .iter()
            .filter(|a| a.is_default)
            .map(|a| a.name.as_str())
            .collect()
    }

    #[test]
    fn first_address_becomes_default() {
        let mut book = AddressBook::new();
        let a = book.add(input("A", false));

        assert!(a.is_default);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn adding_a_default_demotes_the_previous_one() {
        let mut book = AddressBook::new();
        let a = book.add(input("A", false));
        let b = book.add(input("B", true));

        assert!(!book.get(&a.id).unwrap().is_default);
        assert!(book.get(&b.id).unwrap().is_default);
        assert_eq!(defaults(&book), vec!["B"]);
    }

    #[test]
    fn non_default_add_appends_without_touching_default() {
        let mut book = AddressBook::new();
        book.add(input("A", false));
        let b = book.add(input("B", false));

        assert!(!b.is_default);
        assert_eq!(defaults(&book), vec!["A"]);
        assert_eq!(book.addresses()[1].id, b.id);
    }

    #[test]
    fn set_default_then_resolve_without_selection() {
        let mut book = AddressBook::new();
        let a = book.add(input("A", false));
        book.add(input("B", true));

        book.set_default(&a.id).unwrap();
        assert_eq!(defaults(&book), vec!["A"]);
        assert_eq!(book.resolve_active().unwrap().id, a.id);

        // idempotent
        let before = book.clone();
        book.set_default(&a.id).unwrap();
        assert_eq!(book, before);
    }

    #[test]
    fn removing_selected_falls_back_to_default() {
        let mut book = AddressBook::new();
        let a = book.add(input("A", false));
        let b = book.add(input("B", false));

        book.select(&b.id).unwrap();
        assert_eq!(book.resolve_active().unwrap().id, b.id);

        book.remove(&b.id).unwrap();
        assert_eq!(book.selected_id(), None);
        assert_eq!(book.resolve_active().unwrap().id, a.id);
    }

    #[test]
    fn removing_default_promotes_first_remaining() {
        let mut book = AddressBook::new();
        let a = book.add(input("A", false));
        let b = book.add(input("B", false));
        let c = book.add(input("C", false));

        book.set_default(&b.id).unwrap();
        let removed = book.remove(&b.id).unwrap();

        assert!(removed.is_default);
        assert!(book.get(&a.id).unwrap().is_default);
        assert!(!book.get(&c.id).unwrap().is_default);
    }

    #[test]
    fn removing_last_address_empties_the_book() {
        let mut book = AddressBook::new();
        let a = book.add(input("A", false));
        book.select(&a.id).unwrap();
        book.remove(&a.id).unwrap();

        assert!(book.is_empty());
        assert!(book.resolve_active().is_none());
        assert!(book.default_address().is_none());
    }

    #[test]
    fn update_missing_id_leaves_book_unchanged() {
        let mut book = AddressBook::new();
        book.add(input("A", false));
        let snapshot = book.clone();

        let err = book
            .update(
                &AddressId::from("nonexistent"),
                AddressPatch {
                    city: Some("X".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();

        assert_matches!(err, ServiceError::NotFound(_));
        assert_eq!(book, snapshot);
    }

    #[test]
    fn every_lookup_operation_reports_not_found() {
        let mut book = AddressBook::new();
        book.add(input("A", false));
        let snapshot = book.clone();
        let missing = AddressId::from("missing");

        assert_matches!(book.remove(&missing), Err(ServiceError::NotFound(_)));
        assert_matches!(book.set_default(&missing), Err(ServiceError::NotFound(_)));
        assert_matches!(book.select(&missing), Err(ServiceError::NotFound(_)));
        assert_eq!(book, snapshot);
    }

    #[test]
    fn update_with_default_flag_applies_other_fields_too() {
        let mut book = AddressBook::new();
        let a = book.add(input("A", false));
        let b = book.add(input("B", false));

        book.update(
            &b.id,
            AddressPatch {
                city: Some("Mysore".into()),
                is_default: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

        let b_now = book.get(&b.id).unwrap();
        assert!(b_now.is_default);
        assert_eq!(b_now.city, "Mysore");
        assert!(!book.get(&a.id).unwrap().is_default);
    }

    #[test]
    fn update_cannot_unset_the_only_default() {
        let mut book = AddressBook::new();
        let a = book.add(input("A", false));

        book.update(
            &a.id,
            AddressPatch {
                is_default: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(book.get(&a.id).unwrap().is_default);
    }

    #[test]
    fn update_keeps_id() {
        let mut book = AddressBook::new();
        let a = book.add(input("A", false));
        book.update(
            &a.id,
            AddressPatch {
                name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(book.addresses()[0].id, a.id);
        assert_eq!(book.addresses()[0].name, "Renamed");
    }

    #[test]
    fn select_does_not_change_default() {
        let mut book = AddressBook::new();
        let a = book.add(input("A", false));
        let b = book.add(input("B", false));

        book.select(&b.id).unwrap();
        assert_eq!(book.default_address().unwrap().id, a.id);
        assert_eq!(book.selected_id(), Some(&b.id));

        book.clear_selection();
        assert_eq!(book.resolve_active().unwrap().id, a.id);
    }

    #[test]
    fn from_addresses_normalizes_defaults() {
        let mut seed = AddressBook::new();
        let mut a = seed.add(input("A", false));
        let mut b = seed.add(input("B", false));
        a.is_default = false;
        b.is_default = false;

        let book = AddressBook::from_addresses(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(book.default_address().unwrap().id, a.id);

        a.is_default = true;
        b.is_default = true;
        let book = AddressBook::from_addresses(vec![a.clone(), b]).unwrap();
        assert_eq!(defaults(&book), vec!["A"]);
    }

    #[test]
    fn from_addresses_rejects_duplicate_ids() {
        let mut seed = AddressBook::new();
        let a = seed.add(input("A", false));

        let err = AddressBook::from_addresses(vec![a.clone(), a]).unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[test]
    fn deserializing_repairs_defaults_and_stale_selection() {
        let mut seed = AddressBook::new();
        let mut a = seed.add(input("A", false));
        let mut b = seed.add(input("B", false));
        a.is_default = true;
        b.is_default = true;

        let json = serde_json::json!({
            "addresses": [a.clone(), b.clone()],
            "selected_id": "gone",
        });
        let mut book: AddressBook = serde_json::from_value(json).unwrap();

        assert_eq!(defaults(&book), vec!["A"]);
        assert_eq!(book.selected_id(), None);

        book.update(
            &b.id,
            AddressPatch {
                city: Some("Mysore".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(defaults(&book), vec!["A"]);
    }

    #[test]
    fn deserializing_keeps_a_valid_selection() {
        let mut book = AddressBook::new();
        book.add(input("A", false));
        let b = book.add(input("B", false));
        book.select(&b.id).unwrap();

        let restored: AddressBook =
            serde_json::from_str(&serde_json::to_string(&book).unwrap()).unwrap();
        assert_eq!(restored, book);
    }

    #[test]
    fn deserializing_rejects_duplicate_ids() {
        let mut seed = AddressBook::new();
        let a = seed.add(input("A", false));

        let json = serde_json::json!({ "addresses": [a.clone(), a] });
        assert!(serde_json::from_value::<AddressBook>(json).is_err());
    }

    #[test]
    fn from_empty_list_is_empty_book() {
        let book = AddressBook::from_addresses(Vec::new()).unwrap();
        assert!(book.is_empty());
        assert!(book.resolve_active().is_none());
    }
}
