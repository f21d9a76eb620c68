use std::{sync::Arc, time::Duration};

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use shutterlink_storage::{GalleryStore, Path};

use crate::{config::ApiConfig, middleware::jwt::Claims, payment::DynPaymentGateway};

pub type AppState = Arc<State>;

pub struct State {
    pub config: ApiConfig,
    pub db: DatabaseConnection,
    pub store: GalleryStore,
    /// `None` when no payment provider is configured; checkout answers 503
    pub payments: Option<DynPaymentGateway>,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl State {
    pub fn new(
        config: ApiConfig,
        db: DatabaseConnection,
        store: GalleryStore,
        payments: Option<DynPaymentGateway>,
    ) -> Self {
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        Self {
            config,
            db,
            store,
            payments,
            decoding_key,
            validation,
        }
    }

    pub async fn connect(database_url: &str, sql_logging: bool) -> Result<DatabaseConnection, DbErr> {
        let mut opt = ConnectOptions::new(database_url.to_owned());
        opt.max_connections(10)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .sqlx_logging(sql_logging);
        Database::connect(opt).await
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    pub fn public_url(&self, path: &Path) -> String {
        GalleryStore::public_url(&self.config.public_files_url, path)
    }
}
