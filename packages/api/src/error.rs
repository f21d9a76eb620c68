use axum::{
    Json,
    extract::multipart::MultipartError,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportPolicy {
    Ignore,
    Report,
}

/// Attached to the response of every reported error so the error-id can be
/// correlated with the server logs.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub id: String,
    pub status_code: u16,
    pub public_code: String,
    pub summary: String,
    pub details: Option<String>,
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
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

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    public_code: String,
    public_message: Option<String>,
    details: Vec<FieldError>,
    report_policy: ReportPolicy,
    report_summary: Option<String>,
    report_details: Option<String>,
}

// Associated constants for enum-like usage without parentheses
impl ApiError {
    pub const NOT_FOUND: ApiError = ApiError {
        status: StatusCode::NOT_FOUND,
        public_code: String::new(),
        public_message: None,
        details: Vec::new(),
        report_policy: ReportPolicy::Ignore,
        report_summary: None,
        report_details: None,
    };

    pub const FORBIDDEN: ApiError = ApiError {
        status: StatusCode::FORBIDDEN,
        public_code: String::new(),
        public_message: None,
        details: Vec::new(),
        report_policy: ReportPolicy::Ignore,
        report_summary: None,
        report_details: None,
    };

    pub const UNAUTHORIZED: ApiError = ApiError {
        status: StatusCode::UNAUTHORIZED,
        public_code: String::new(),
        public_message: None,
        details: Vec::new(),
        report_policy: ReportPolicy::Ignore,
        report_summary: None,
        report_details: None,
    };
}

impl ApiError {
    fn new(
        status: StatusCode,
        public_code: impl Into<String>,
        public_message: Option<String>,
        report_policy: ReportPolicy,
    ) -> Self {
        Self {
            status,
            public_code: public_code.into(),
            public_message,
            details: Vec::new(),
            report_policy,
            report_summary: None,
            report_details: None,
        }
    }

    fn with_report(mut self, summary: impl Into<String>, details: Option<String>) -> Self {
        self.report_summary = Some(summary.into());
        self.report_details = details;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn details(&self) -> &[FieldError] {
        &self.details
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Internal error: {}", msg);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            None,
            ReportPolicy::Report,
        )
        .with_report(msg, None)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Not found: {}", msg);
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Bad request: {}", msg);
        Self::new(
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    /// 400 carrying one entry per rejected field.
    pub fn validation(details: Vec<FieldError>) -> Self {
        tracing::warn!(fields = details.len(), "Validation failed");
        let mut err = Self::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            Some("Request validation failed".to_string()),
            ReportPolicy::Ignore,
        );
        err.details = details;
        err
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Unauthorized: {}", msg);
        Self::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Forbidden: {}", msg);
        Self::new(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Conflict: {}", msg);
        Self::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    pub fn gone(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Gone: {}", msg);
        Self::new(StatusCode::GONE, "GONE", Some(msg), ReportPolicy::Ignore)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Service unavailable: {}", msg);
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            Some("Service unavailable".to_string()),
            ReportPolicy::Report,
        )
        .with_report(msg, None)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorEnvelope<'a> {
            error: ErrorBody<'a>,
        }

        #[derive(Serialize)]
        struct ErrorBody<'a> {
            code: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            id: Option<&'a str>,
            message: &'a str,
            #[serde(skip_serializing_if = "no_details")]
            details: &'a [FieldError],
        }

        fn no_details(details: &&[FieldError]) -> bool {
            details.is_empty()
        }

        let code = if self.public_code.is_empty() {
            match self.status {
                StatusCode::NOT_FOUND => "NOT_FOUND",
                StatusCode::FORBIDDEN => "FORBIDDEN",
                StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
                StatusCode::BAD_REQUEST => "BAD_REQUEST",
                _ => "ERROR",
            }
        } else {
            self.public_code.as_str()
        };

        let public_message = self
            .public_message
            .as_deref()
            .unwrap_or_else(|| self.status.canonical_reason().unwrap_or("Error"));

        let mut error_id: Option<String> = None;
        if self.report_policy == ReportPolicy::Report {
            error_id = Some(shutterlink_types::create_id());
        }

        let mut response = (
            self.status,
            Json(ErrorEnvelope {
                error: ErrorBody {
                    code,
                    id: error_id.as_deref(),
                    message: public_message,
                    details: &self.details,
                },
            }),
        )
            .into_response();

        if let Some(id) = error_id.as_deref() {
            if let Ok(v) = HeaderValue::from_str(id) {
                response.headers_mut().insert("x-error-id", v);
            }

            let report = ErrorReport {
                id: id.to_string(),
                status_code: self.status.as_u16(),
                public_code: code.to_string(),
                summary: self
                    .report_summary
                    .clone()
                    .unwrap_or_else(|| public_message.to_string()),
                details: self.report_details.clone(),
            };
            tracing::error!(
                error_id = %report.id,
                status = report.status_code,
                code = %report.public_code,
                details = ?report.details,
                "{}",
                report.summary
            );
            response.extensions_mut().insert(report);
        }

        response
    }
}

impl From<shutterlink_types::Error> for ApiError {
    fn from(err: shutterlink_types::Error) -> Self {
        tracing::error!("Internal error: {:?}", err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            None,
            ReportPolicy::Report,
        )
        .with_report(format!("{:?}", err), Some(err.to_string()))
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        tracing::error!("Database error: {:?}", err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            None,
            ReportPolicy::Report,
        )
        .with_report(format!("{:?}", err), Some(err.to_string()))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        // Parsing errors are typically user-caused. Keep message, do not persist.
        Self::bad_request(format!("JSON error: {}", err))
    }
}

impl From<shutterlink_storage::StorageError> for ApiError {
    fn from(err: shutterlink_storage::StorageError) -> Self {
        tracing::error!("Storage error: {:?}", err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            None,
            ReportPolicy::Report,
        )
        .with_report(format!("{:?}", err), Some(err.to_string()))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::warn!("JWT error: {:?}", err);
        Self::unauthorized(format!("JWT error: {}", err))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::bad_request(format!("Malformed multipart body: {}", err.body_text()))
    }
}

impl From<sea_orm::TransactionError<ApiError>> for ApiError {
    fn from(err: sea_orm::TransactionError<ApiError>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(db_err) => db_err.into(),
            sea_orm::TransactionError::Transaction(api_err) => api_err,
        }
    }
}

impl std::error::Error for ApiError {}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.public_code.as_str())
    }
}

pub type AuthorizationError = ApiError;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, bool, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let has_id = response.headers().contains_key("x-error-id");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, has_id, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_errors_list_fields() {
        let (status, has_id, body) = body_of(ApiError::validation(vec![FieldError::new(
            "clientEmail",
            "must be a valid email address",
        )]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!has_id);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"][0]["field"], "clientEmail");
    }

    #[tokio::test]
    async fn internal_errors_hide_details_and_carry_an_id() {
        let (status, has_id, body) = body_of(ApiError::internal("db exploded")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(has_id);
        assert_eq!(body["error"]["message"], "Internal Server Error");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn anyhow_errors_become_opaque_internal_errors() {
        let err: ApiError = shutterlink_types::anyhow!("card network unreachable").into();
        let (status, has_id, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(has_id);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_ne!(body["error"]["message"], "card network unreachable");
    }

    #[tokio::test]
    async fn constants_fall_back_to_status_codes() {
        let (status, _, body) = body_of(ApiError::FORBIDDEN).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }
}
