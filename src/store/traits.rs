use crate::model::{Id, ListQuery, Persona, PersonaData, PersonaPage};
use crate::store::{ConnectionStatus, StoreResult};
use chrono::{DateTime, Utc};

/// Data-access operations over the persona collection.
#[async_trait::async_trait]
pub trait PersonaStore: Send + Sync {
    /// Insert a validated record. Fails with `DuplicateKey` when the cedula is taken.
    async fn create_persona(&self, data: PersonaData) -> StoreResult<Persona>;
    /// Fails with `InvalidIdentifier` when `id` is not a well-formed id.
    async fn get_persona(&self, id: &Id) -> StoreResult<Option<Persona>>;
    async fn find_by_cedula(&self, cedula: &str) -> StoreResult<Option<Persona>>;
    /// Filtered, sorted page of records plus totals.
    async fn list_personas(&self, query: &ListQuery) -> StoreResult<PersonaPage>;
    /// Replace the mutable fields of an existing record.
    async fn update_persona(&self, id: &Id, data: PersonaData) -> StoreResult<Persona>;
    /// Remove a record and return it.
    async fn delete_persona(&self, id: &Id) -> StoreResult<Persona>;
    async fn count_personas(&self, search: Option<&str>) -> StoreResult<u64>;
    /// Records whose `createdAt` is at or after `since`.
    async fn count_personas_since(&self, since: DateTime<Utc>) -> StoreResult<u64>;
    async fn delete_all_personas(&self) -> StoreResult<u64>;
}

/// Connection observation and teardown.
#[async_trait::async_trait]
pub trait StoreLifecycle: Send + Sync {
    /// Current connectivity. An unreachable backend is reported as
    /// `connected: false`, not as an error.
    async fn connection_status(&self) -> anyhow::Result<ConnectionStatus>;
    async fn close(&self);
}

pub trait Store: PersonaStore + StoreLifecycle + Send + Sync {}
impl<T: PersonaStore + StoreLifecycle> Store for T {}
