use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a persona with cedula {cedula} already exists")]
    DuplicateKey { cedula: String },
    #[error("persona not found")]
    NotFound,
    #[error("invalid persona id: {0}")]
    InvalidIdentifier(String),
    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// SQLSTATE for `unique_violation`.
pub const PG_UNIQUE_VIOLATION: &str = "23505";

impl StoreError {
    /// Classify a failed write, turning unique-constraint violations into
    /// `DuplicateKey` for the given cedula.
    pub fn from_write(err: sqlx::Error, cedula: &str, context: &'static str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                return StoreError::DuplicateKey {
                    cedula: cedula.to_string(),
                };
            }
        }
        StoreError::Unclassified(anyhow::Error::new(err).context(context))
    }

    pub fn unclassified(err: sqlx::Error, context: &'static str) -> Self {
        StoreError::Unclassified(anyhow::Error::new(err).context(context))
    }
}
