use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::model::{parse_id, total_pages, Id, ListQuery, Persona, PersonaData, PersonaPage};
use crate::store::traits::{PersonaStore, StoreLifecycle};
use crate::store::{ConnectionState, ConnectionStatus, StoreError, StoreResult};

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS personas (
        id UUID PRIMARY KEY,
        nombres TEXT NOT NULL,
        apellidos TEXT NOT NULL,
        cedula TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT personas_cedula_key UNIQUE (cedula)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS personas_nombres_apellidos_idx ON personas (nombres, apellidos)",
    "CREATE INDEX IF NOT EXISTS personas_created_at_idx ON personas (created_at)",
];

const PERSONA_COLUMNS: &str = "id, nombres, apellidos, cedula, created_at, updated_at";

// Rows match when no pattern is bound or either name column matches it.
const SEARCH_CLAUSE: &str = "($1::TEXT IS NULL OR nombres ILIKE $1 OR apellidos ILIKE $1)";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    host: String,
    database: String,
    ping_timeout: Duration,
}

impl PostgresStore {
    /// Create the connection pool. Connection establishment is bounded by
    /// `connect_timeout_ms` and every statement by `socket_timeout_ms`.
    pub async fn connect(database_url: &str, config: &DatabaseConfig) -> Result<Self> {
        let options = PgConnectOptions::from_str(database_url)
            .context("Invalid PostgreSQL connection string")?
            .options([("statement_timeout", config.socket_timeout_ms.to_string())]);

        let host = format!("{}:{}", options.get_host(), options.get_port());
        let database = options.get_database().unwrap_or_default().to_string();
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.unwrap_or(10))
            .acquire_timeout(connect_timeout)
            .connect_with(options)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self {
            pool,
            host,
            database,
            ping_timeout: connect_timeout,
        })
    }

    /// Create the `personas` table and its indexes when missing.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create personas schema")?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

fn persona_from_row(row: &PgRow) -> Result<Persona, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;
    Ok(Persona {
        id: id.to_string(),
        nombres: row.try_get("nombres")?,
        apellidos: row.try_get("apellidos")?,
        cedula: row.try_get("cedula")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// `%term%` with LIKE metacharacters escaped so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl PersonaStore for PostgresStore {
    async fn create_persona(&self, data: PersonaData) -> StoreResult<Persona> {
        let sql = format!(
            "INSERT INTO personas (id, nombres, apellidos, cedula) VALUES ($1, $2, $3, $4) RETURNING {}",
            PERSONA_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&data.nombres)
            .bind(&data.apellidos)
            .bind(&data.cedula)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_write(e, &data.cedula, "Failed to insert persona"))?;

        persona_from_row(&row).map_err(|e| StoreError::unclassified(e, "Failed to decode persona"))
    }

    async fn get_persona(&self, id: &Id) -> StoreResult<Option<Persona>> {
        let uuid = parse_id(id)?;
        let sql = format!("SELECT {} FROM personas WHERE id = $1", PERSONA_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::unclassified(e, "Failed to fetch persona"))?;

        row.as_ref()
            .map(persona_from_row)
            .transpose()
            .map_err(|e| StoreError::unclassified(e, "Failed to decode persona"))
    }

    async fn find_by_cedula(&self, cedula: &str) -> StoreResult<Option<Persona>> {
        let sql = format!("SELECT {} FROM personas WHERE cedula = $1", PERSONA_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(cedula)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::unclassified(e, "Failed to fetch persona by cedula"))?;

        row.as_ref()
            .map(persona_from_row)
            .transpose()
            .map_err(|e| StoreError::unclassified(e, "Failed to decode persona"))
    }

    async fn list_personas(&self, query: &ListQuery) -> StoreResult<PersonaPage> {
        let pattern = query.search_term().map(like_pattern);
        let total = self.count_personas(query.search_term()).await?;

        // Sort column and direction come from closed enums, never from raw input.
        let sql = format!(
            "SELECT {} FROM personas WHERE {} ORDER BY {} {dir}, id {dir} LIMIT $2 OFFSET $3",
            PERSONA_COLUMNS,
            SEARCH_CLAUSE,
            query.sort_by.column(),
            dir = query.sort_order.sql(),
        );
        let rows = sqlx::query(&sql)
            .bind(pattern)
            .bind(i64::from(query.limit))
            .bind(to_i64(query.skip()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::unclassified(e, "Failed to list personas"))?;

        let personas = rows
            .iter()
            .map(persona_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::unclassified(e, "Failed to decode persona"))?;

        Ok(PersonaPage {
            personas,
            page: query.page,
            limit: query.limit,
            total,
            pages: total_pages(total, query.limit),
        })
    }

    async fn update_persona(&self, id: &Id, data: PersonaData) -> StoreResult<Persona> {
        let uuid = parse_id(id)?;
        let sql = format!(
            r#"
            UPDATE personas
            SET nombres = $2, apellidos = $3, cedula = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PERSONA_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(uuid)
            .bind(&data.nombres)
            .bind(&data.apellidos)
            .bind(&data.cedula)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::from_write(e, &data.cedula, "Failed to update persona"))?;

        let Some(row) = row else {
            return Err(StoreError::NotFound);
        };
        persona_from_row(&row).map_err(|e| StoreError::unclassified(e, "Failed to decode persona"))
    }

    async fn delete_persona(&self, id: &Id) -> StoreResult<Persona> {
        let uuid = parse_id(id)?;
        let sql = format!("DELETE FROM personas WHERE id = $1 RETURNING {}", PERSONA_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::unclassified(e, "Failed to delete persona"))?;

        let Some(row) = row else {
            return Err(StoreError::NotFound);
        };
        persona_from_row(&row).map_err(|e| StoreError::unclassified(e, "Failed to decode persona"))
    }

    async fn count_personas(&self, search: Option<&str>) -> StoreResult<u64> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);
        let sql = format!("SELECT COUNT(*) AS count FROM personas WHERE {}", SEARCH_CLAUSE);
        let count: i64 = sqlx::query(&sql)
            .bind(pattern)
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get("count"))
            .map_err(|e| StoreError::unclassified(e, "Failed to count personas"))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn count_personas_since(&self, since: DateTime<Utc>) -> StoreResult<u64> {
        let count: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM personas WHERE created_at >= $1")
                .bind(since)
                .fetch_one(&self.pool)
                .await
                .and_then(|row| row.try_get("count"))
                .map_err(|e| StoreError::unclassified(e, "Failed to count recent personas"))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn delete_all_personas(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM personas")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::unclassified(e, "Failed to clear personas"))?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl StoreLifecycle for PostgresStore {
    async fn connection_status(&self) -> Result<ConnectionStatus> {
        if self.pool.is_closed() {
            return Ok(ConnectionStatus::new(
                ConnectionState::Disconnected,
                &self.host,
                &self.database,
            ));
        }

        let ping = sqlx::query("SELECT 1").execute(&self.pool);
        let state = match tokio::time::timeout(self.ping_timeout, ping).await {
            Ok(Ok(_)) => ConnectionState::Connected,
            Ok(Err(e)) => {
                log::warn!("PostgreSQL ping failed: {}", e);
                ConnectionState::Disconnected
            }
            Err(_) => {
                log::warn!("PostgreSQL ping timed out after {:?}", self.ping_timeout);
                ConnectionState::Disconnected
            }
        };

        Ok(ConnectionStatus::new(state, &self.host, &self.database))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
