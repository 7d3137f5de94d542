use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Address, AddressId, AddressPatch, NewAddress},
    repositories::{AddressRecord, AddressRepository},
    services::address_book::AddressBook,
};

/// A backend write that has been confirmed and can be undone.
#[derive(Debug)]
enum AppliedWrite {
    Inserted(Address),
    Updated { before: Address },
    Deleted(AddressRecord),
}

/// Address book for one signed-in user, kept in step with the backend
/// `addresses` table.
///
/// Writes are confirmed before they become visible: every mutation is computed
/// on a copy of the book, the changed rows are written to the repository, and
/// the copy replaces the live book only once all writes succeeded. If a write
/// fails, writes already made for that mutation are reverted (best effort),
/// the live book is left as it was and the persistence error is returned.
///
/// Mutations are serialized by the internal lock.
pub struct AddressBookService {
    user_id: Uuid,
    book: RwLock<AddressBook>,
    repository: Arc<dyn AddressRepository>,
    event_sender: Option<EventSender>,
}

impl AddressBookService {
    /// Creates a service over an empty book.
    pub fn new(user_id: Uuid, repository: Arc<dyn AddressRepository>) -> Self {
        Self {
            user_id,
            book: RwLock::new(AddressBook::new()),
            repository,
            event_sender: None,
        }
    }

    /// Creates a service seeded with the user's stored addresses.
    #[instrument(skip(repository))]
    pub async fn load(
        user_id: Uuid,
        repository: Arc<dyn AddressRepository>,
    ) -> Result<Self, ServiceError> {
        let rows = repository.list_for_user(user_id).await?;
        let count = rows.len();
        let book = AddressBook::from_addresses(rows.into_iter().map(Address::from).collect())?;

        info!(%user_id, count, "Loaded address book");
        Ok(Self {
            user_id,
            book: RwLock::new(book),
            repository,
            event_sender: None,
        })
    }

    pub fn with_events(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Copy of the current book.
    pub async fn snapshot(&self) -> AddressBook {
        self.book.read().await.clone()
    }

    pub async fn resolve_active(&self) -> Option<Address> {
        self.book.read().await.resolve_active().cloned()
    }

    #[instrument(skip(self, input), fields(user_id = %self.user_id))]
    pub async fn add(&self, input: NewAddress) -> Result<Address, ServiceError> {
        input.validate()?;

        let mut book = self.book.write().await;
        let mut draft = book.clone();
        let added = draft.add(input);

        self.commit(&mut book, draft).await?;

        self.emit(Event::AddressAdded(added.id.clone())).await;
        if added.is_default {
            self.emit(Event::DefaultAddressChanged(added.id.clone())).await;
        }
        info!(address_id = %added.id, "Address added");
        Ok(added)
    }

    #[instrument(skip(self, patch), fields(user_id = %self.user_id))]
    pub async fn update(&self, id: &AddressId, patch: AddressPatch) -> Result<(), ServiceError> {
        patch.validate()?;

        let mut book = self.book.write().await;
        let previous_default = book.default_address().map(|a| a.id.clone());
        let mut draft = book.clone();
        draft.update(id, patch)?;

        self.commit(&mut book, draft).await?;

        self.emit(Event::AddressUpdated(id.clone())).await;
        self.emit_default_change(&book, previous_default).await;
        info!(address_id = %id, "Address updated");
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn remove(&self, id: &AddressId) -> Result<Address, ServiceError> {
        let mut book = self.book.write().await;
        let previous_default = book.default_address().map(|a| a.id.clone());
        let mut draft = book.clone();
        let removed = draft.remove(id)?;

        self.commit(&mut book, draft).await?;

        self.emit(Event::AddressRemoved(id.clone())).await;
        self.emit_default_change(&book, previous_default).await;
        info!(address_id = %id, "Address removed");
        Ok(removed)
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn set_default(&self, id: &AddressId) -> Result<(), ServiceError> {
        let mut book = self.book.write().await;
        let previous_default = book.default_address().map(|a| a.id.clone());
        let mut draft = book.clone();
        draft.set_default(id)?;

        self.commit(&mut book, draft).await?;

        self.emit_default_change(&book, previous_default).await;
        Ok(())
    }

    /// Selection is session state only and never reaches the backend.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn select(&self, id: &AddressId) -> Result<(), ServiceError> {
        self.book.write().await.select(id)?;
        self.emit(Event::AddressSelected(id.clone())).await;
        Ok(())
    }

    /// Writes the rows that differ between `book` and `draft`, then swaps
    /// `draft` in. On failure `book` is untouched.
    async fn commit(&self, book: &mut AddressBook, draft: AddressBook) -> Result<(), ServiceError> {
        let mut applied = Vec::new();

        if let Err(e) = self.write_changes(book, &draft, &mut applied).await {
            error!(error = %e, writes = applied.len(), "Address write failed, reverting");
            self.revert(applied).await;
            return Err(e);
        }

        *book = draft;
        Ok(())
    }

    /// Order matters: deletes, then updates of rows that end up without the
    /// default flag, then inserts, then the update that sets the flag. Every
    /// row losing the flag is written before any row gaining it, so the table
    /// never holds two defaults for the user, and reverting in reverse order
    /// keeps that true.
    async fn write_changes(
        &self,
        before: &AddressBook,
        after: &AddressBook,
        applied: &mut Vec<AppliedWrite>,
    ) -> Result<(), ServiceError> {
        for old in before.addresses() {
            if after.get(&old.id).is_none() {
                let row = self.repository.delete(&old.id).await?;
                applied.push(AppliedWrite::Deleted(row));
            }
        }

        let (promoted, demoted): (Vec<_>, Vec<_>) = after
            .addresses()
            .iter()
            .filter_map(|new| before.get(&new.id).map(|old| (old, new)))
            .filter(|(old, new)| old != new)
            .partition(|(_, new)| new.is_default);

        for (old, new) in demoted {
            self.update_row(old, new, applied).await?;
        }

        for new in after.addresses() {
            if before.get(&new.id).is_none() {
                self.repository.insert(self.user_id, new).await?;
                applied.push(AppliedWrite::Inserted(new.clone()));
            }
        }

        for (old, new) in promoted {
            self.update_row(old, new, applied).await?;
        }

        Ok(())
    }

    async fn update_row(
        &self,
        old: &Address,
        new: &Address,
        applied: &mut Vec<AppliedWrite>,
    ) -> Result<(), ServiceError> {
        self.repository.update(new).await?;
        applied.push(AppliedWrite::Updated {
            before: old.clone(),
        });
        Ok(())
    }

    async fn revert(&self, applied: Vec<AppliedWrite>) {
        for write in applied.into_iter().rev() {
            let result = match &write {
                AppliedWrite::Inserted(address) => {
                    self.repository.delete(&address.id).await.map(|_| ())
                }
                AppliedWrite::Updated { before } => {
                    self.repository.update(before).await.map(|_| ())
                }
                AppliedWrite::Deleted(row) => self.repository.restore(row).await,
            };
            if let Err(e) = result {
                warn!(error = %e, ?write, "Could not revert address write; reload to resync");
            }
        }
    }

    async fn emit_default_change(&self, book: &AddressBook, previous: Option<AddressId>) {
        let current = book.default_address().map(|a| a.id.clone());
        if let Some(current) = current {
            if previous.as_ref() != Some(&current) {
                self.emit(Event::DefaultAddressChanged(current)).await;
            }
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }
}
