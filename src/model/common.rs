use uuid::Uuid;

use crate::store::StoreError;

pub type Id = String;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Parse a client supplied identifier into the UUID the stores key records by.
pub fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id.trim()).map_err(|_| StoreError::InvalidIdentifier(id.to_string()))
}
