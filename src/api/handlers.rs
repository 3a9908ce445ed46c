use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::api::envelope::ApiResponse;
use crate::api::error::{ApiError, ApiResult, MSG_INTERNAL};
use crate::logic::{validate_persona, ValidationErrors};
use crate::model::{Id, ListParams, ListQuery, Persona, PersonaInput, PersonaListResponse};
use crate::store::{ConnectionStatus, Store, StoreError};

pub type AppState<S> = Arc<S>;

/// Window used for the "recent" count of the statistics endpoint.
pub const RECENT_WINDOW_DAYS: i64 = 30;

pub async fn root() -> &'static str {
    "¡Hola Mundo!"
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub database: ConnectionStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

/// Liveness plus store connectivity. An unreachable store is reported in the
/// body; only a failure to determine the status yields a 500.
pub async fn health_check<S: Store>(State(store): State<AppState<S>>) -> Response {
    let timestamp = Utc::now().to_rfc3339();
    match store.connection_status().await {
        Ok(database) => Json(HealthResponse {
            status: "OK".to_string(),
            message: "La aplicación está funcionando correctamente".to_string(),
            database,
            timestamp,
        })
        .into_response(),
        Err(e) => {
            log::error!("Failed to determine store status: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthErrorResponse {
                    error: MSG_INTERNAL.to_string(),
                    message: e.to_string(),
                    timestamp,
                }),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_personas: u64,
    pub personas_recientes: u64,
    pub fecha_consulta: String,
}

pub async fn create_persona<S: Store>(
    State(store): State<AppState<S>>,
    payload: Result<Json<PersonaInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Persona>>)> {
    let Json(input) = payload?;
    let data = validate_persona(&input)?;

    // The unique index still decides races; this only avoids a failed insert.
    if store.find_by_cedula(&data.cedula).await?.is_some() {
        return Err(ApiError::duplicate_on_create(data.cedula));
    }

    let persona = store.create_persona(data).await?;
    log::info!("Created persona {} ({})", persona.id, persona.cedula);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Persona creada exitosamente", persona)),
    ))
}

pub async fn list_personas<S: Store>(
    State(store): State<AppState<S>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<PersonaListResponse>>> {
    let Query(params) = params?;
    let query = ListQuery::try_from(params)?;

    let page = store.list_personas(&query).await?;

    Ok(Json(ApiResponse::ok(
        "Personas obtenidas exitosamente",
        PersonaListResponse::from(page),
    )))
}

pub async fn get_persona<S: Store>(
    State(store): State<AppState<S>>,
    id: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<ApiResponse<Persona>>> {
    let Path(id) = id?;
    let persona = store
        .get_persona(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("id {}", id)))?;

    Ok(Json(ApiResponse::ok("Persona obtenida exitosamente", persona)))
}

pub async fn get_persona_by_cedula<S: Store>(
    State(store): State<AppState<S>>,
    cedula: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ApiResponse<Persona>>> {
    let Path(cedula) = cedula
        .map_err(|r| ApiError::Validation(ValidationErrors::single("cedula", r.body_text())))?;
    let persona = store
        .find_by_cedula(cedula.trim())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("cédula {}", cedula)))?;

    Ok(Json(ApiResponse::ok("Persona obtenida exitosamente", persona)))
}

/// Partial update: fields left out of the body keep their stored value, and
/// the merged record is validated as a whole.
pub async fn update_persona<S: Store>(
    State(store): State<AppState<S>>,
    id: Result<Path<Id>, PathRejection>,
    payload: Result<Json<PersonaInput>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Persona>>> {
    let Path(id) = id?;
    let Json(patch) = payload?;

    let existing = store
        .get_persona(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("id {}", id)))?;

    let data = validate_persona(&patch.overlay(&existing))?;

    if data.cedula != existing.cedula {
        if let Some(holder) = store.find_by_cedula(&data.cedula).await? {
            if holder.id != existing.id {
                return Err(ApiError::duplicate_on_update(data.cedula));
            }
        }
    }

    let persona = store
        .update_persona(&id, data)
        .await
        .map_err(ApiError::from_update)?;
    log::info!("Updated persona {}", persona.id);

    Ok(Json(ApiResponse::ok("Persona actualizada exitosamente", persona)))
}

pub async fn delete_persona<S: Store>(
    State(store): State<AppState<S>>,
    id: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<ApiResponse<Persona>>> {
    let Path(id) = id?;
    let persona = store.delete_persona(&id).await.map_err(|e| match e {
        StoreError::NotFound => ApiError::not_found(format!("id {}", id)),
        other => other.into(),
    })?;
    log::info!("Deleted persona {} ({})", persona.id, persona.cedula);

    Ok(Json(ApiResponse::ok("Persona eliminada exitosamente", persona)))
}

pub async fn persona_stats<S: Store>(
    State(store): State<AppState<S>>,
) -> ApiResult<Json<ApiResponse<StatsResponse>>> {
    let now = Utc::now();
    let total_personas = store.count_personas(None).await?;
    let personas_recientes = store
        .count_personas_since(now - Duration::days(RECENT_WINDOW_DAYS))
        .await?;

    Ok(Json(ApiResponse::ok(
        "Estadísticas obtenidas exitosamente",
        StatsResponse {
            total_personas,
            personas_recientes,
            fecha_consulta: now.to_rfc3339(),
        },
    )))
}

pub async fn route_not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::with_error(
            "Ruta no encontrada",
            "El recurso solicitado no existe".to_string(),
        )),
    )
}
