use axum::{error_handling::HandleErrorLayer, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;

use crate::api::error::{handle_panic, handle_timeout};
use crate::api::{docs, handlers};
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Liveness
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check::<S>))
        // API Documentation
        .route("/api-docs", get(docs::get_api_docs))
        .route("/api-docs/openapi.json", get(docs::get_openapi_spec))
        // Personas
        .route(
            "/api/personas",
            get(handlers::list_personas::<S>).post(handlers::create_persona::<S>),
        )
        .route("/api/personas/stats", get(handlers::persona_stats::<S>))
        .route(
            "/api/personas/cedula/:cedula",
            get(handlers::get_persona_by_cedula::<S>),
        )
        .route(
            "/api/personas/:id",
            get(handlers::get_persona::<S>)
                .put(handlers::update_persona::<S>)
                .delete(handlers::delete_persona::<S>),
        )
        .fallback(handlers::route_not_found)
}

/// Router with state attached and every request bounded by `request_timeout`.
/// Timeouts and panics are answered with the regular error envelope.
pub fn build_app<S: Store + 'static>(store: Arc<S>, request_timeout: Duration) -> Router {
    create_router()
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Id, ListQuery, Persona, PersonaData, PersonaPage};
    use crate::store::{
        ConnectionStatus, InMemoryStore, PersonaStore, StoreLifecycle, StoreResult,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// In-memory store with injectable slowness and failures.
    #[derive(Default)]
    struct ScriptedStore {
        inner: InMemoryStore,
        list_delay: Option<Duration>,
        status_fails: bool,
        count_panics: bool,
    }

    #[async_trait::async_trait]
    impl PersonaStore for ScriptedStore {
        async fn create_persona(&self, data: PersonaData) -> StoreResult<Persona> {
            self.inner.create_persona(data).await
        }

        async fn get_persona(&self, id: &Id) -> StoreResult<Option<Persona>> {
            self.inner.get_persona(id).await
        }

        async fn find_by_cedula(&self, cedula: &str) -> StoreResult<Option<Persona>> {
            self.inner.find_by_cedula(cedula).await
        }

        async fn list_personas(&self, query: &ListQuery) -> StoreResult<PersonaPage> {
            if let Some(delay) = self.list_delay {
                tokio::time::sleep(delay).await;
            }
            self.inner.list_personas(query).await
        }

        async fn update_persona(&self, id: &Id, data: PersonaData) -> StoreResult<Persona> {
            self.inner.update_persona(id, data).await
        }

        async fn delete_persona(&self, id: &Id) -> StoreResult<Persona> {
            self.inner.delete_persona(id).await
        }

        async fn count_personas(&self, search: Option<&str>) -> StoreResult<u64> {
            if self.count_panics {
                panic!("count exploded");
            }
            self.inner.count_personas(search).await
        }

        async fn count_personas_since(&self, since: DateTime<Utc>) -> StoreResult<u64> {
            self.inner.count_personas_since(since).await
        }

        async fn delete_all_personas(&self) -> StoreResult<u64> {
            self.inner.delete_all_personas().await
        }
    }

    #[async_trait::async_trait]
    impl StoreLifecycle for ScriptedStore {
        async fn connection_status(&self) -> anyhow::Result<ConnectionStatus> {
            if self.status_fails {
                anyhow::bail!("driver state unavailable");
            }
            self.inner.connection_status().await
        }

        async fn close(&self) {
            self.inner.close().await
        }
    }

    fn app_with(store: Arc<InMemoryStore>) -> Router {
        build_app(store, Duration::from_secs(5))
    }

    fn app() -> Router {
        app_with(Arc::new(InMemoryStore::new()))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn create(app: &Router, nombres: &str, apellidos: &str, cedula: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/personas",
            Some(json!({"nombres": nombres, "apellidos": apellidos, "cedula": cedula})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_create_then_duplicate() {
        let app = app();
        let payload = json!({"nombres": "Ana", "apellidos": "Ruiz", "cedula": "1234567890"});

        let (status, body) = send(&app, Method::POST, "/api/personas", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Persona creada exitosamente");
        assert_eq!(body["data"]["cedula"], "1234567890");

        let (status, body) = send(&app, Method::POST, "/api/personas", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Ya existe una persona con esta cédula");
        assert_eq!(body["data"], Value::Null);
    }

    #[tokio::test]
    async fn test_create_accepts_numeric_cedula() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/personas",
            Some(json!({"nombres": "Ana", "apellidos": "Ruiz", "cedula": 1234567890u64})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["cedula"], "1234567890");
    }

    #[tokio::test]
    async fn test_create_reports_all_validation_errors() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/personas",
            Some(json!({"nombres": "A", "cedula": "12345"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Error de validación");
        assert_eq!(
            body["errors"],
            json!([
                "Los nombres deben tener al menos 2 caracteres",
                "Los apellidos son obligatorios",
                "La cédula debe tener exactamente 10 dígitos numéricos"
            ])
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_failure() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/personas")
            .header("content-type", "application/json")
            .body(Body::from("{\"nombres\": "))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Error de validación");
        assert!(body["errors"].as_array().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_get_by_id_and_cedula() {
        let app = app();
        let created = create(&app, "Ana", "Ruiz", "1234567890").await;
        let id = created["id"].as_str().unwrap();

        let (status, body) = send(&app, Method::GET, &format!("/api/personas/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], created);

        let (status, body) = send(&app, Method::GET, "/api/personas/cedula/1234567890", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], created["id"]);

        let (status, body) = send(&app, Method::GET, "/api/personas/cedula/0000000000", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Persona no encontrada");
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let app = app();
        for method in [Method::GET, Method::DELETE] {
            let (status, body) = send(&app, method, "/api/personas/not-an-id", None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "ID de persona inválido");
        }

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/personas/not-an-id",
            Some(json!({"nombres": "Ana"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "ID de persona inválido");
    }

    #[tokio::test]
    async fn test_list_pagination_defaults_and_second_page() {
        let app = app();
        for i in 1..=12 {
            create(&app, &format!("Nombre{i:02}"), "Apellido", &format!("{i:010}")).await;
        }

        let (status, body) = send(&app, Method::GET, "/api/personas", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Personas obtenidas exitosamente");
        assert_eq!(
            body["data"]["pagination"],
            json!({"page": 1, "limit": 10, "total": 12, "pages": 2})
        );
        assert_eq!(body["data"]["personas"].as_array().unwrap().len(), 10);

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/personas?page=2&limit=5&sortBy=cedula&sortOrder=asc",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["pagination"]["pages"], 3);
        let cedulas: Vec<_> = body["data"]["personas"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["cedula"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            cedulas,
            vec!["0000000006", "0000000007", "0000000008", "0000000009", "0000000010"]
        );
    }

    #[tokio::test]
    async fn test_list_search_and_bad_sort_key() {
        let app = app();
        create(&app, "Ana", "Ruiz", "1111111111").await;
        create(&app, "Luis", "Mora", "2222222222").await;

        let (status, body) = send(&app, Method::GET, "/api/personas?search=RUI", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["pagination"]["total"], 1);
        assert_eq!(body["data"]["personas"][0]["nombres"], "Ana");

        let (status, body) = send(&app, Method::GET, "/api/personas?sortBy=password", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Error de validación");
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_rules() {
        let app = app();
        let ana = create(&app, "Ana", "Ruiz", "1111111111").await;
        create(&app, "Luis", "Mora", "2222222222").await;
        let uri = format!("/api/personas/{}", ana["id"].as_str().unwrap());

        let (status, body) =
            send(&app, Method::PUT, &uri, Some(json!({"cedula": "2222222222"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Ya existe otra persona con esta cédula");

        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({"nombres": "  Ana Lucía ", "cedula": "1111111111"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Persona actualizada exitosamente");
        assert_eq!(body["data"]["nombres"], "Ana Lucía");
        assert_eq!(body["data"]["apellidos"], "Ruiz");
        assert_eq!(body["data"]["createdAt"], ana["createdAt"]);

        let (status, body) = send(&app, Method::PUT, &uri, Some(json!({"apellidos": "X"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["errors"],
            json!(["Los apellidos deben tener al menos 2 caracteres"])
        );

        let missing = format!("/api/personas/{}", crate::model::generate_id());
        let (status, _) = send(&app, Method::PUT, &missing, Some(json!({"nombres": "Ana"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let app = app();
        let ana = create(&app, "Ana", "Ruiz", "1111111111").await;
        let uri = format!("/api/personas/{}", ana["id"].as_str().unwrap());

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Persona eliminada exitosamente");
        assert_eq!(body["data"]["id"], ana["id"]);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_stats_counts_last_thirty_days() {
        let mut old = Persona::new(PersonaData {
            nombres: "Vieja".to_string(),
            apellidos: "Persona".to_string(),
            cedula: "1000000000".to_string(),
        });
        old.created_at = Utc::now() - ChronoDuration::days(60);
        let fresh = Persona::new(PersonaData {
            nombres: "Nueva".to_string(),
            apellidos: "Persona".to_string(),
            cedula: "2000000000".to_string(),
        });
        let app = app_with(Arc::new(InMemoryStore::with_personas([old, fresh])));

        let (status, body) = send(&app, Method::GET, "/api/personas/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Estadísticas obtenidas exitosamente");
        assert_eq!(body["data"]["totalPersonas"], 2);
        assert_eq!(body["data"]["personasRecientes"], 1);
        assert!(body["data"]["fechaConsulta"].is_string());
    }

    #[tokio::test]
    async fn test_health_reports_disconnected_store() {
        let store = Arc::new(InMemoryStore::new());
        let app = app_with(store.clone());

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["database"]["connected"], true);
        assert_eq!(body["database"]["state"], 1);

        store.set_connected(false);
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"]["connected"], false);
        assert_eq!(body["database"]["state"], 0);
    }

    #[tokio::test]
    async fn test_root_docs_and_fallback() {
        let app = app();
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], "¡Hola Mundo!".as_bytes());

        let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["openapi"], "3.0.3");

        let (status, body) = send(&app, Method::GET, "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_timed_out_request_uses_envelope() {
        let store = ScriptedStore {
            list_delay: Some(Duration::from_millis(300)),
            ..Default::default()
        };
        let app = build_app(Arc::new(store), Duration::from_millis(50));

        let (status, body) = send(&app, Method::GET, "/api/personas", None).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Tiempo de espera agotado");
        assert!(body["error"].is_string());
        assert_eq!(body["data"], Value::Null);
    }

    #[tokio::test]
    async fn test_non_utf8_path_segment_is_invalid_id() {
        let app = app();
        for method in [Method::GET, Method::DELETE] {
            let (status, body) = send(&app, method, "/api/personas/%FF", None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], "ID de persona inválido");
            assert!(body["error"].is_string());
        }

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/personas/%FF",
            Some(json!({"nombres": "Ana"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "ID de persona inválido");

        let (status, body) = send(&app, Method::GET, "/api/personas/cedula/%FF", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Error de validación");
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_health_fails_when_status_is_unknown() {
        let store = ScriptedStore {
            status_fails: true,
            ..Default::default()
        };
        let app = build_app(Arc::new(store), Duration::from_secs(5));

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error interno del servidor");
        assert_eq!(body["message"], "driver state unavailable");
        assert!(body["timestamp"].is_string());
        assert!(body.get("database").is_none());
    }

    #[tokio::test]
    async fn test_handler_panic_uses_envelope() {
        let store = ScriptedStore {
            count_panics: true,
            ..Default::default()
        };
        let app = build_app(Arc::new(store), Duration::from_secs(5));

        let (status, body) = send(&app, Method::GET, "/api/personas/stats", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Error interno del servidor");
    }
}
