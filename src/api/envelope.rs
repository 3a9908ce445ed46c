use serde::Serialize;

/// Uniform response wrapper used by every `/api/personas` endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
            errors: None,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn with_errors(message: &str, errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            data: None,
            errors: Some(errors),
            error: None,
        }
    }

    pub fn with_error(message: &str, error: String) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            data: None,
            errors: None,
            error: Some(error),
        }
    }
}
