use crate::logic::validate_persona;
use crate::model::{Persona, PersonaData, PersonaInput};
use crate::store::traits::PersonaStore;
use anyhow::{Context, Result};

const SAMPLE_PERSONAS: &[(&str, &str, &str)] = &[
    ("Juan Carlos", "Pérez González", "1712345678"),
    ("María Fernanda", "López Ramírez", "0923456789"),
    ("Luis Alberto", "Anchundia Soza", "1309876543"),
    ("Ana Lucía", "Torres Vega", "0102030405"),
    ("Pedro José", "Mendoza Castillo", "1804567890"),
    ("Gabriela", "Sánchez Moreira", "0601234567"),
    ("Diego Andrés", "Zambrano Loor", "1316549870"),
    ("Valentina", "Cedeño Vera", "0912378456"),
    ("Jorge Luis", "Macías Intriago", "1723456789"),
    ("Camila", "Ortiz Paredes", "0501987654"),
];

/// Validated sample records used to populate an empty installation.
pub fn sample_personas() -> Result<Vec<PersonaData>> {
    SAMPLE_PERSONAS
        .iter()
        .map(|(nombres, apellidos, cedula)| {
            validate_persona(&PersonaInput::new(nombres, apellidos, cedula))
                .with_context(|| format!("Invalid sample persona {}", cedula))
        })
        .collect()
}

/// Insert the sample records, skipping any whose cedula is already stored.
pub async fn load_seed_data<S: PersonaStore + ?Sized>(store: &S) -> Result<Vec<Persona>> {
    let mut inserted = Vec::new();
    for data in sample_personas()? {
        if store.find_by_cedula(&data.cedula).await?.is_some() {
            log::debug!("Skipping sample persona {}: already present", data.cedula);
            continue;
        }
        let persona = store
            .create_persona(data)
            .await
            .context("Failed to insert sample persona")?;
        inserted.push(persona);
    }
    Ok(inserted)
}

/// Remove every record and insert the sample set.
pub async fn reset_with_seed_data<S: PersonaStore + ?Sized>(store: &S) -> Result<Vec<Persona>> {
    let removed = store
        .delete_all_personas()
        .await
        .context("Failed to clear personas")?;
    log::info!("Removed {} existing personas", removed);
    load_seed_data(store).await
}
