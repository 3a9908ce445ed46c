use axum::response::{Html, Json};
use serde_json::{json, Value};

pub async fn get_api_docs() -> Html<&'static str> {
    Html(
        r#"
<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>API Personas - Documentación</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui.css" />
    <style>
        body {
            margin: 0;
            background: #fafafa;
        }
        .swagger-ui .topbar {
            display: none;
        }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            SwaggerUIBundle({
                url: '/api-docs/openapi.json',
                dom_id: '#swagger-ui',
                deepLinking: true,
                docExpansion: 'list',
                filter: true,
                tryItOutEnabled: true
            });
        };
    </script>
</body>
</html>
"#,
    )
}

fn persona_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string", "format": "uuid", "readOnly": true },
            "nombres": { "type": "string", "minLength": 2, "maxLength": 50, "example": "Ana" },
            "apellidos": { "type": "string", "minLength": 2, "maxLength": 50, "example": "Ruiz" },
            "cedula": { "type": "string", "pattern": "^\\d{10}$", "example": "1234567890" },
            "createdAt": { "type": "string", "format": "date-time", "readOnly": true },
            "updatedAt": { "type": "string", "format": "date-time", "readOnly": true }
        }
    })
}

fn envelope(data: Value) -> Value {
    json!({
        "type": "object",
        "properties": {
            "success": { "type": "boolean" },
            "message": { "type": "string" },
            "data": data
        }
    })
}

fn error_responses(codes: &[&str]) -> Value {
    let mut responses = serde_json::Map::new();
    for code in codes {
        let description = match *code {
            "400" => "Validación fallida, cédula duplicada o ID inválido",
            "404" => "Persona no encontrada",
            _ => "Error interno del servidor",
        };
        responses.insert(
            code.to_string(),
            json!({
                "description": description,
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
            }),
        );
    }
    Value::Object(responses)
}

fn with_errors(mut ok: Value, codes: &[&str]) -> Value {
    if let (Some(target), Value::Object(errors)) = (ok.as_object_mut(), error_responses(codes)) {
        target.extend(errors);
    }
    ok
}

fn id_parameter() -> Value {
    json!({ "name": "id", "in": "path", "required": true, "schema": { "type": "string", "format": "uuid" } })
}

fn persona_ok(description: &str) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/PersonaResponse" } } }
    })
}

/// OpenAPI 3 description of the service.
pub async fn get_openapi_spec() -> Json<Value> {
    let persona_body = json!({
        "required": true,
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/PersonaInput" } } }
    });

    Json(json!({
        "openapi": "3.0.3",
        "info": {
            "title": "API Personas",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "CRUD de personas (nombres, apellidos, cédula) con paginación, búsqueda y estadísticas",
            "license": { "name": "MIT", "url": "https://opensource.org/licenses/MIT" }
        },
        "servers": [{ "url": "/", "description": "Servidor actual" }],
        "tags": [
            { "name": "Sistema", "description": "Estado del servicio" },
            { "name": "Personas", "description": "Gestión de personas" }
        ],
        "paths": {
            "/": {
                "get": {
                    "tags": ["Sistema"],
                    "summary": "Mensaje de bienvenida",
                    "responses": { "200": { "description": "Texto plano", "content": { "text/plain": { "schema": { "type": "string" } } } } }
                }
            },
            "/health": {
                "get": {
                    "tags": ["Sistema"],
                    "summary": "Estado de la aplicación y de la base de datos",
                    "responses": {
                        "200": { "description": "Estado", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/HealthResponse" } } } },
                        "500": { "description": "No se pudo determinar el estado" }
                    }
                }
            },
            "/api/personas": {
                "post": {
                    "tags": ["Personas"],
                    "summary": "Crear una persona",
                    "requestBody": persona_body.clone(),
                    "responses": with_errors(json!({ "201": persona_ok("Persona creada exitosamente") }), &["400", "500"])
                },
                "get": {
                    "tags": ["Personas"],
                    "summary": "Listar personas con paginación, búsqueda y orden",
                    "parameters": [
                        { "name": "page", "in": "query", "schema": { "type": "integer", "minimum": 1, "default": 1 } },
                        { "name": "limit", "in": "query", "schema": { "type": "integer", "minimum": 1, "maximum": 100, "default": 10 } },
                        { "name": "search", "in": "query", "schema": { "type": "string" }, "description": "Coincidencia parcial en nombres o apellidos, sin distinguir mayúsculas" },
                        { "name": "sortBy", "in": "query", "schema": { "type": "string", "enum": ["nombres", "apellidos", "cedula", "createdAt", "updatedAt"], "default": "createdAt" } },
                        { "name": "sortOrder", "in": "query", "schema": { "type": "string", "enum": ["asc", "desc"], "default": "desc" } }
                    ],
                    "responses": with_errors(json!({
                        "200": {
                            "description": "Personas obtenidas exitosamente",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/PersonaListResponse" } } }
                        }
                    }), &["400", "500"])
                }
            },
            "/api/personas/stats": {
                "get": {
                    "tags": ["Personas"],
                    "summary": "Total de personas y creadas en los últimos 30 días",
                    "responses": with_errors(json!({
                        "200": {
                            "description": "Estadísticas obtenidas exitosamente",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/StatsResponse" } } }
                        }
                    }), &["500"])
                }
            },
            "/api/personas/cedula/{cedula}": {
                "get": {
                    "tags": ["Personas"],
                    "summary": "Obtener una persona por cédula",
                    "parameters": [{ "name": "cedula", "in": "path", "required": true, "schema": { "type": "string", "pattern": "^\\d{10}$" } }],
                    "responses": with_errors(json!({ "200": persona_ok("Persona obtenida exitosamente") }), &["404", "500"])
                }
            },
            "/api/personas/{id}": {
                "get": {
                    "tags": ["Personas"],
                    "summary": "Obtener una persona por ID",
                    "parameters": [id_parameter()],
                    "responses": with_errors(json!({ "200": persona_ok("Persona obtenida exitosamente") }), &["400", "404", "500"])
                },
                "put": {
                    "tags": ["Personas"],
                    "summary": "Actualizar una persona (los campos omitidos se conservan)",
                    "parameters": [id_parameter()],
                    "requestBody": persona_body,
                    "responses": with_errors(json!({ "200": persona_ok("Persona actualizada exitosamente") }), &["400", "404", "500"])
                },
                "delete": {
                    "tags": ["Personas"],
                    "summary": "Eliminar una persona",
                    "parameters": [id_parameter()],
                    "responses": with_errors(json!({ "200": persona_ok("Persona eliminada exitosamente") }), &["400", "404", "500"])
                }
            }
        },
        "components": {
            "schemas": {
                "Persona": persona_schema(),
                "PersonaInput": {
                    "type": "object",
                    "required": ["nombres", "apellidos", "cedula"],
                    "properties": {
                        "nombres": { "type": "string", "example": "Ana" },
                        "apellidos": { "type": "string", "example": "Ruiz" },
                        "cedula": { "type": "string", "example": "1234567890" }
                    }
                },
                "PersonaResponse": envelope(json!({ "$ref": "#/components/schemas/Persona" })),
                "PersonaListResponse": envelope(json!({
                    "type": "object",
                    "properties": {
                        "personas": { "type": "array", "items": { "$ref": "#/components/schemas/Persona" } },
                        "pagination": {
                            "type": "object",
                            "properties": {
                                "page": { "type": "integer" },
                                "limit": { "type": "integer" },
                                "total": { "type": "integer" },
                                "pages": { "type": "integer" }
                            }
                        }
                    }
                })),
                "StatsResponse": envelope(json!({
                    "type": "object",
                    "properties": {
                        "totalPersonas": { "type": "integer" },
                        "personasRecientes": { "type": "integer" },
                        "fechaConsulta": { "type": "string", "format": "date-time" }
                    }
                })),
                "ErrorResponse": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean", "example": false },
                        "message": { "type": "string" },
                        "data": { "nullable": true },
                        "errors": { "type": "array", "items": { "type": "string" } },
                        "error": { "type": "string" }
                    }
                },
                "HealthResponse": {
                    "type": "object",
                    "properties": {
                        "status": { "type": "string", "example": "OK" },
                        "message": { "type": "string" },
                        "database": {
                            "type": "object",
                            "properties": {
                                "connected": { "type": "boolean" },
                                "state": { "type": "integer", "description": "0 desconectado, 1 conectado, 2 conectando, 3 desconectando" },
                                "host": { "type": "string" },
                                "name": { "type": "string" }
                            }
                        },
                        "timestamp": { "type": "string", "format": "date-time" }
                    }
                }
            }
        }
    }))
}
