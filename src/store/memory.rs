use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{
    parse_id, total_pages, Id, ListQuery, Persona, PersonaData, PersonaPage, SortField, SortOrder,
};
use crate::store::traits::{PersonaStore, StoreLifecycle};
use crate::store::{ConnectionState, ConnectionStatus, StoreError, StoreResult};

#[derive(Debug)]
struct MemoryState {
    personas: HashMap<Id, Persona>,
    state: ConnectionState,
}

/// Process-local store used by tests and for running without a database.
///
/// Cedula uniqueness is enforced under the write lock, so it holds the same
/// guarantee a unique index gives the PostgreSQL store.
#[derive(Debug)]
pub struct InMemoryStore {
    inner: RwLock<MemoryState>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryState {
                personas: HashMap::new(),
                state: ConnectionState::Connected,
            }),
        }
    }

    /// Start from existing records, keeping their ids and timestamps.
    /// A record whose cedula is already held by an earlier one is dropped.
    pub fn with_personas(personas: impl IntoIterator<Item = Persona>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for persona in personas {
                if inner.personas.values().any(|p| p.cedula == persona.cedula) {
                    log::warn!(
                        "Skipping persona {} with duplicate cedula {}",
                        persona.id,
                        persona.cedula
                    );
                    continue;
                }
                inner.personas.insert(persona.id.clone(), persona);
            }
        }
        store
    }

    /// Simulate the backend going away or coming back.
    pub fn set_connected(&self, connected: bool) {
        self.inner.write().state = if connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
    }

    pub fn len(&self) -> usize {
        self.inner.read().personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Normalize a client id to the canonical key used in the map.
fn key(id: &Id) -> StoreResult<Id> {
    Ok(parse_id(id)?.to_string())
}

fn compare(a: &Persona, b: &Persona, field: SortField) -> Ordering {
    let primary = match field {
        SortField::Nombres => a.nombres.cmp(&b.nombres),
        SortField::Apellidos => a.apellidos.cmp(&b.apellidos),
        SortField::Cedula => a.cedula.cmp(&b.cedula),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait::async_trait]
impl PersonaStore for InMemoryStore {
    async fn create_persona(&self, data: PersonaData) -> StoreResult<Persona> {
        let mut inner = self.inner.write();
        if inner.personas.values().any(|p| p.cedula == data.cedula) {
            return Err(StoreError::DuplicateKey {
                cedula: data.cedula,
            });
        }
        let persona = Persona::new(data);
        inner.personas.insert(persona.id.clone(), persona.clone());
        Ok(persona)
    }

    async fn get_persona(&self, id: &Id) -> StoreResult<Option<Persona>> {
        let key = key(id)?;
        Ok(self.inner.read().personas.get(&key).cloned())
    }

    async fn find_by_cedula(&self, cedula: &str) -> StoreResult<Option<Persona>> {
        Ok(self
            .inner
            .read()
            .personas
            .values()
            .find(|p| p.cedula == cedula)
            .cloned())
    }

    async fn list_personas(&self, query: &ListQuery) -> StoreResult<PersonaPage> {
        let inner = self.inner.read();
        let mut matching: Vec<&Persona> = inner
            .personas
            .values()
            .filter(|p| query.search_term().map_or(true, |term| p.matches_search(term)))
            .collect();

        matching.sort_by(|a, b| {
            let ordering = compare(a, b, query.sort_by);
            match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as u64;
        let skip = usize::try_from(query.skip()).unwrap_or(usize::MAX);
        let personas = matching
            .into_iter()
            .skip(skip)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(PersonaPage {
            personas,
            page: query.page,
            limit: query.limit,
            total,
            pages: total_pages(total, query.limit),
        })
    }

    async fn update_persona(&self, id: &Id, data: PersonaData) -> StoreResult<Persona> {
        let key = key(id)?;
        let mut inner = self.inner.write();
        if !inner.personas.contains_key(&key) {
            return Err(StoreError::NotFound);
        }
        if inner
            .personas
            .values()
            .any(|p| p.cedula == data.cedula && p.id != key)
        {
            return Err(StoreError::DuplicateKey {
                cedula: data.cedula,
            });
        }
        let persona = inner.personas.get_mut(&key).ok_or(StoreError::NotFound)?;
        persona.apply(data);
        Ok(persona.clone())
    }

    async fn delete_persona(&self, id: &Id) -> StoreResult<Persona> {
        let key = key(id)?;
        self.inner
            .write()
            .personas
            .remove(&key)
            .ok_or(StoreError::NotFound)
    }

    async fn count_personas(&self, search: Option<&str>) -> StoreResult<u64> {
        let term = search.map(str::trim).unwrap_or_default();
        Ok(self
            .inner
            .read()
            .personas
            .values()
            .filter(|p| p.matches_search(term))
            .count() as u64)
    }

    async fn count_personas_since(&self, since: DateTime<Utc>) -> StoreResult<u64> {
        Ok(self
            .inner
            .read()
            .personas
            .values()
            .filter(|p| p.created_at >= since)
            .count() as u64)
    }

    async fn delete_all_personas(&self) -> StoreResult<u64> {
        let mut inner = self.inner.write();
        let removed = inner.personas.len() as u64;
        inner.personas.clear();
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl StoreLifecycle for InMemoryStore {
    async fn connection_status(&self) -> anyhow::Result<ConnectionStatus> {
        Ok(ConnectionStatus::new(self.inner.read().state, "memory", "personas"))
    }

    async fn close(&self) {
        self.inner.write().state = ConnectionState::Disconnected;
    }
}
