use crate::model::{generate_id, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A stored person record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: Id,
    pub nombres: String,
    pub apellidos: String,
    pub cedula: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Persona {
    /// Build a fresh record with a generated id and both timestamps set to now.
    pub fn new(data: PersonaData) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            nombres: data.nombres,
            apellidos: data.apellidos,
            cedula: data.cedula,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the client-mutable fields, keeping id and creation time.
    pub fn apply(&mut self, data: PersonaData) {
        self.nombres = data.nombres;
        self.apellidos = data.apellidos;
        self.cedula = data.cedula;
        self.updated_at = Utc::now();
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombres, self.apellidos)
    }

    /// Case-insensitive literal substring match on given names or surnames.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.nombres.to_lowercase().contains(&term) || self.apellidos.to_lowercase().contains(&term)
    }
}

/// Validated, trimmed field values ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaData {
    pub nombres: String,
    pub apellidos: String,
    pub cedula: String,
}

/// Request body for create and update.
///
/// Every field is optional at the wire level so that missing values surface as
/// validation messages instead of deserialization failures, and so that an
/// update can carry only the fields it changes.
///
/// JSON numbers are accepted and kept in their textual form, so
/// `"cedula": 1234567890` reads the same as `"cedula": "1234567890"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaInput {
    #[serde(default, deserialize_with = "text_or_number")]
    pub nombres: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub apellidos: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub cedula: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<TextOrNumber>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Number(number) => number.to_string(),
    }))
}

impl PersonaInput {
    pub fn new(nombres: &str, apellidos: &str, cedula: &str) -> Self {
        Self {
            nombres: Some(nombres.to_string()),
            apellidos: Some(apellidos.to_string()),
            cedula: Some(cedula.to_string()),
        }
    }

    /// Fill the fields this input leaves out with the values of `existing`.
    pub fn overlay(self, existing: &Persona) -> Self {
        Self {
            nombres: self.nombres.or_else(|| Some(existing.nombres.clone())),
            apellidos: self.apellidos.or_else(|| Some(existing.apellidos.clone())),
            cedula: self.cedula.or_else(|| Some(existing.cedula.clone())),
        }
    }
}
