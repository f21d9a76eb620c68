use shutterlink_api::config::{ApiConfig, DEFAULT_STALE_ORDER_SECS, MAX_STALE_ORDER_SECS};
use shutterlink_storage::{S3Config, StorageConfig, StorageProvider};
use std::{env, path::PathBuf, str::FromStr, time::Duration};

const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;
const MAX_RECONCILE_INTERVAL_SECS: u64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub sql_logging: bool,
    pub storage: StorageConfig,
    pub stripe_secret_key: Option<String>,
    pub reconcile_interval: Duration,
    pub api: ApiConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let provider: StorageProvider = optional("STORAGE_PROVIDER")
            .unwrap_or_else(|| "local".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue(format!("STORAGE_PROVIDER: {}", e)))?;
        let storage = storage_from_env(provider)?;

        let mut upload = defaults.upload.clone();
        upload.max_file_size = parsed("MAX_FILE_SIZE", upload.max_file_size)?;
        if let Some(types) = optional("ALLOWED_FILE_TYPES") {
            upload.allowed_types = types
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }

        let api = ApiConfig {
            frontend_url: optional("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            public_files_url: optional("PUBLIC_FILES_URL").unwrap_or(defaults.public_files_url),
            currency: optional("CURRENCY").unwrap_or(defaults.currency),
            upload,
            max_upload_request_size: parsed(
                "MAX_UPLOAD_REQUEST_SIZE",
                defaults.max_upload_request_size,
            )?,
            stale_order_after_secs: seconds(
                "STALE_ORDER_SECS",
                DEFAULT_STALE_ORDER_SECS,
                MAX_STALE_ORDER_SECS,
            )?,
            jwt_secret: required("AUTH_JWT_SECRET")?,
            stripe_webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
        };

        Ok(Config {
            port: parsed("PORT", 8080)?,
            database_url: required("DATABASE_URL")?,
            sql_logging: parsed("SQL_LOGGING", false)?,
            storage,
            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            reconcile_interval: Duration::from_secs(seconds(
                "RECONCILE_INTERVAL_SECS",
                DEFAULT_RECONCILE_INTERVAL_SECS,
                MAX_RECONCILE_INTERVAL_SECS,
            )?),
            api,
        })
    }
}

fn storage_from_env(provider: StorageProvider) -> Result<StorageConfig, ConfigError> {
    Ok(match provider {
        StorageProvider::Local => StorageConfig::Local {
            root: PathBuf::from(optional("STORAGE_ROOT").unwrap_or_else(|| "./uploads".into())),
        },
        StorageProvider::Memory => StorageConfig::Memory,
        StorageProvider::Aws => StorageConfig::Aws(S3Config {
            bucket: required("STORAGE_BUCKET")?,
            endpoint: optional("AWS_ENDPOINT"),
            region: optional("AWS_REGION").unwrap_or_else(|| "us-east-1".into()),
            access_key_id: optional("AWS_ACCESS_KEY_ID"),
            secret_access_key: optional("AWS_SECRET_ACCESS_KEY"),
            use_path_style: parsed("AWS_USE_PATH_STYLE", false)?,
        }),
    })
}

fn optional(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::MissingVar(var))
}

fn parsed<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var.to_string())),
        None => Ok(default),
    }
}

fn seconds(var: &'static str, default: u64, max: u64) -> Result<u64, ConfigError> {
    within_bounds(var, parsed(var, default)?, max)
}

fn within_bounds(var: &'static str, secs: u64, max: u64) -> Result<u64, ConfigError> {
    if secs == 0 || secs > max {
        return Err(ConfigError::InvalidValue(format!(
            "{var}: expected 1..={max} seconds, got {secs}"
        )));
    }
    Ok(secs)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_must_be_positive_and_bounded() {
        assert_eq!(
            within_bounds("RECONCILE_INTERVAL_SECS", 60, MAX_RECONCILE_INTERVAL_SECS).unwrap(),
            60
        );
        assert_eq!(
            within_bounds("STALE_ORDER_SECS", MAX_STALE_ORDER_SECS, MAX_STALE_ORDER_SECS).unwrap(),
            MAX_STALE_ORDER_SECS
        );

        for (var, secs, max) in [
            ("RECONCILE_INTERVAL_SECS", 0, MAX_RECONCILE_INTERVAL_SECS),
            ("RECONCILE_INTERVAL_SECS", MAX_RECONCILE_INTERVAL_SECS + 1, MAX_RECONCILE_INTERVAL_SECS),
            ("STALE_ORDER_SECS", 0, MAX_STALE_ORDER_SECS),
            ("STALE_ORDER_SECS", 100_000_000_000_000, MAX_STALE_ORDER_SECS),
            ("STALE_ORDER_SECS", u64::MAX, MAX_STALE_ORDER_SECS),
        ] {
            let err = within_bounds(var, secs, max).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue(ref msg) if msg.starts_with(var)));
        }
    }
}
