use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use crate::model::{PersonaData, PersonaInput};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const CEDULA_DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field-level problem found in one request, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("validation failed: {}", join_messages(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }

    /// `Ok(value)` when nothing was pushed, otherwise the collected errors.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors.iter().map(|e| &e.message).join("; ")
}

struct NameRules {
    field: &'static str,
    required: &'static str,
    too_short: &'static str,
    too_long: &'static str,
}

const NOMBRES: NameRules = NameRules {
    field: "nombres",
    required: "Los nombres son obligatorios",
    too_short: "Los nombres deben tener al menos 2 caracteres",
    too_long: "Los nombres no pueden exceder 50 caracteres",
};

const APELLIDOS: NameRules = NameRules {
    field: "apellidos",
    required: "Los apellidos son obligatorios",
    too_short: "Los apellidos deben tener al menos 2 caracteres",
    too_long: "Los apellidos no pueden exceder 50 caracteres",
};

const CEDULA_REQUIRED: &str = "La cédula es obligatoria";
const CEDULA_FORMAT: &str = "La cédula debe tener exactamente 10 dígitos numéricos";

fn check_name(value: Option<&str>, rules: &NameRules, errors: &mut ValidationErrors) -> String {
    let trimmed = value.map(str::trim).unwrap_or_default();
    let chars = trimmed.chars().count();
    if chars == 0 {
        errors.push(rules.field, rules.required);
    } else if chars < NAME_MIN_CHARS {
        errors.push(rules.field, rules.too_short);
    } else if chars > NAME_MAX_CHARS {
        errors.push(rules.field, rules.too_long);
    }
    trimmed.to_string()
}

/// `^\d{10}$` over ASCII digits only.
pub fn is_valid_cedula(cedula: &str) -> bool {
    cedula.len() == CEDULA_DIGITS && cedula.bytes().all(|b| b.is_ascii_digit())
}

fn check_cedula(value: Option<&str>, errors: &mut ValidationErrors) -> String {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.push("cedula", CEDULA_REQUIRED);
    } else if !is_valid_cedula(trimmed) {
        errors.push("cedula", CEDULA_FORMAT);
    }
    trimmed.to_string()
}

/// Validate and normalize a candidate record. Performs no I/O.
pub fn validate_persona(input: &PersonaInput) -> Result<PersonaData, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let nombres = check_name(input.nombres.as_deref(), &NOMBRES, &mut errors);
    let apellidos = check_name(input.apellidos.as_deref(), &APELLIDOS, &mut errors);
    let cedula = check_cedula(input.cedula.as_deref(), &mut errors);

    errors.into_result(PersonaData {
        nombres,
        apellidos,
        cedula,
    })
}
