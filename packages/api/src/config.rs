use serde::{Deserialize, Serialize};
use shutterlink_storage::imaging::UploadPolicy;

/// Default sweep threshold for orders that never got a payment session.
pub const DEFAULT_STALE_ORDER_SECS: u64 = 15 * 60;
/// Longest sweep threshold accepted, one year.
pub const MAX_STALE_ORDER_SECS: u64 = 365 * 24 * 60 * 60;

/// Settings the HTTP layer needs at request time. The binary fills this from
/// the environment; tests build it directly.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Base URL of the web frontend, used for payment redirects
    pub frontend_url: String,
    /// Base URL stored object keys are published under
    pub public_files_url: String,
    /// ISO 4217 code every order is charged in
    pub currency: String,
    pub upload: UploadPolicy,
    /// Cap on a whole upload request body
    pub max_upload_request_size: usize,
    pub stale_order_after_secs: u64,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    #[serde(skip_serializing, default)]
    pub stripe_webhook_secret: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            public_files_url: "/uploads".to_string(),
            currency: "usd".to_string(),
            upload: UploadPolicy::default(),
            max_upload_request_size: 100 * 1024 * 1024,
            stale_order_after_secs: DEFAULT_STALE_ORDER_SECS,
            jwt_secret: String::new(),
            stripe_webhook_secret: None,
        }
    }
}

impl ApiConfig {
    /// Sweep threshold, capped at [`MAX_STALE_ORDER_SECS`].
    pub fn stale_order_after(&self) -> chrono::Duration {
        let secs = self.stale_order_after_secs.min(MAX_STALE_ORDER_SECS) as i64;
        chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
    }

    pub fn checkout_success_url(&self, access_code: &str) -> String {
        format!(
            "{}/client/{}/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.frontend_url.trim_end_matches('/'),
            access_code
        )
    }

    pub fn checkout_cancel_url(&self, access_code: &str) -> String {
        format!(
            "{}/client/{}",
            self.frontend_url.trim_end_matches('/'),
            access_code
        )
    }
}
