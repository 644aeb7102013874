use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Bad Request",
    "message": "Validation failed: hold_material_qty_kg",
    "details": {"fields": [{"field": "hold_material_qty_kg", "message": "exceeds lot remaining 50.00"}]},
    "request_id": "req-abc123xyz",
    "timestamp": "2025-03-14T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Field-level or per-entry validation details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error occurred
    pub timestamp: String,
}

/// A validation failure attached to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Field errors of one rejected entry of a bulk request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EntryError {
    pub index: usize,
    pub fields: Vec<FieldError>,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Validation failed: {}", field_names(.0))]
    InvalidFields(Vec<FieldError>),

    #[error("Bulk request rejected: {} of {total} entries invalid", entries.len())]
    BulkRejected {
        total: usize,
        entries: Vec<EntryError>,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

fn field_names(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Body-level message when a JSON field is absent.
pub const REQUIRED: &str = "This field is required.";

/// Maps a rejected JSON body onto field errors.
///
/// Deserialization failures name the offending field through the path axum
/// reports (`[1].qty: invalid type ...`, `missing field `material``); syntax
/// and content-type failures land on `non_field_errors`.
impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                ServiceError::InvalidFields(vec![json_data_field_error(&err.body_text())])
            }
            JsonRejection::JsonSyntaxError(_) => {
                ServiceError::field("non_field_errors", "Malformed JSON body.")
            }
            JsonRejection::MissingJsonContentType(_) => ServiceError::field(
                "non_field_errors",
                "Expected request with `Content-Type: application/json`.",
            ),
            other => ServiceError::field("non_field_errors", other.body_text()),
        }
    }
}

fn json_data_field_error(text: &str) -> FieldError {
    let detail = text
        .split_once("target type: ")
        .map(|(_, rest)| rest)
        .unwrap_or(text);
    let detail = detail
        .rsplit_once(" at line ")
        .map(|(head, _)| head)
        .unwrap_or(detail);

    let (path, message) = match detail.split_once(": ") {
        Some((path, message)) if !path.contains(' ') => (Some(path), message),
        _ => (None, detail),
    };
    if let Some(missing) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        let field = match path {
            Some(path) => format!("{}.{}", path, missing),
            None => missing.to_string(),
        };
        return FieldError::new(field, REQUIRED);
    }
    match path {
        Some(path) => FieldError::new(path, message),
        None => FieldError::new("non_field_errors", message),
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    FieldError::new(field.to_string(), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ServiceError::InvalidFields(fields)
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// Single-field validation failure.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::InvalidFields(vec![FieldError::new(field, message)])
    }

    /// Field errors carried by this error, if it is a field-level validation failure.
    pub fn field_errors(&self) -> Option<Vec<FieldError>> {
        match self {
            Self::InvalidFields(fields) => Some(fields.clone()),
            Self::ValidationError(msg) | Self::InvalidInput(msg) => {
                Some(vec![FieldError::new("non_field_errors", msg.clone())])
            }
            _ => None,
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::InvalidFields(_)
            | Self::BulkRejected { .. }
            | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InternalError(_)
            | Self::MigrationError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::MigrationError(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Structured details rendered into [`ErrorResponse::details`].
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InvalidFields(fields) => Some(json!({ "fields": fields })),
            Self::BulkRejected { entries, .. } => Some(json!({ "entries": entries })),
            _ => None,
        }
    }
}

fn error_body(status: StatusCode, message: String, details: Option<serde_json::Value>) -> ErrorResponse {
    ErrorResponse {
        error: status.canonical_reason().unwrap_or("Error").to_string(),
        message,
        details,
        request_id: current_request_id(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = error_body(status, self.response_message(), self.details());
        (status, Json(body)).into_response()
    }
}

/// API Error type for HTTP responses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ServiceError(service_error) => service_error.into_response(),
            ApiError::BadRequest(msg) => {
                let body = error_body(StatusCode::BAD_REQUEST, msg, None);
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::NotFound(msg) => {
                let body = error_body(StatusCode::NOT_FOUND, msg, None);
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::{body::to_bytes, http::StatusCode};
    use validator::Validate;

    #[tokio::test]
    async fn service_error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ServiceError::NotFound("missing".into()).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
        assert!(payload.details.is_none());
    }

    #[tokio::test]
    async fn field_errors_are_rendered_as_details() {
        let response = ServiceError::field("reciving_weight_kg", "must be greater than 0")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            payload["details"]["fields"][0]["field"],
            "reciving_weight_kg"
        );
        assert_eq!(payload["error"], "Bad Request");
    }

    #[tokio::test]
    async fn bulk_rejection_lists_every_index() {
        let err = ServiceError::BulkRejected {
            total: 3,
            entries: vec![
                EntryError {
                    index: 0,
                    fields: vec![FieldError::new("qty", "must be positive")],
                },
                EntryError {
                    index: 2,
                    fields: vec![FieldError::new("qty", "must be positive")],
                },
            ],
        };
        assert_eq!(err.to_string(), "Bulk request rejected: 2 of 3 entries invalid");

        let response = err.into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let indices: Vec<u64> = payload["details"]["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["index"].as_u64().unwrap())
            .collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn service_error_status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::field("x", "y").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::db_error("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        assert_eq!(
            ServiceError::db_error("relation does not exist").response_message(),
            "Database error"
        );
        assert_eq!(
            ServiceError::InternalError("stack".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::NotFound("Lot abc".into()).response_message(),
            "Not found: Lot abc"
        );
    }

    #[test]
    fn json_data_errors_name_the_field() {
        let prefix = "Failed to deserialize the JSON body into the target type: ";
        assert_eq!(
            json_data_field_error(&format!(
                "{}missing field `material` at line 1 column 2",
                prefix
            )),
            FieldError::new("material", REQUIRED)
        );
        assert_eq!(
            json_data_field_error(&format!(
                "{}[1]: missing field `batch_id` at line 1 column 40",
                prefix
            )),
            FieldError::new("[1].batch_id", REQUIRED)
        );
        assert_eq!(
            json_data_field_error(&format!(
                "{}qty: invalid type: string \"x\", expected i32 at line 1 column 9",
                prefix
            )),
            FieldError::new("qty", "invalid type: string \"x\", expected i32")
        );
        assert_eq!(
            json_data_field_error(&format!(
                "{}invalid type: sequence, expected struct at line 1 column 0",
                prefix
            ))
            .field,
            "non_field_errors"
        );
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "must not be blank"))]
        supplier: String,
        #[validate(range(min = 1))]
        pieces: i32,
    }

    #[test]
    fn validator_errors_flatten_into_fields() {
        let err: ServiceError = Sample {
            supplier: String::new(),
            pieces: 0,
        }
        .validate()
        .unwrap_err()
        .into();

        assert_matches!(err, ServiceError::InvalidFields(ref fields) if fields.len() == 2);
        let fields = err.field_errors().unwrap();
        assert_eq!(fields[0], FieldError::new("pieces", "range"));
        assert_eq!(fields[1], FieldError::new("supplier", "must not be blank"));
    }
}
