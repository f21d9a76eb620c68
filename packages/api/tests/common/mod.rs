#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{Duration, NaiveDateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectOptions, Database, EntityTrait,
    QueryFilter, QueryOrder,
};
use serde_json::Value;
use shutterlink::access::generate_access_code;
use shutterlink_api::{
    auth::Claims,
    config::ApiConfig,
    construct_router,
    entity::{
        gallery, image, order, order_item, photographer, sea_orm_active_enums::OrderStatus,
        stripe_event,
    },
    payment::{
        CheckoutSessionRequest, DynPaymentGateway, HostedSession, PaymentGateway,
    },
    schema,
    state::{AppState, State},
};
use shutterlink_storage::GalleryStore;
use shutterlink_types::anyhow;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";
pub const FILES_URL: &str = "https://files.example.com";
pub const WEBHOOK_SECRET: &str = "whsec_test";

/// Records session requests and hands out predictable session ids.
#[derive(Default)]
pub struct FakePayments {
    requests: Mutex<Vec<CheckoutSessionRequest>>,
    created: AtomicUsize,
    fail: AtomicBool,
}

impl FakePayments {
    pub fn failing() -> Self {
        let payments = Self::default();
        payments.fail.store(true, Ordering::SeqCst);
        payments
    }

    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PaymentGateway for FakePayments {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> shutterlink_types::Result<HostedSession> {
        self.requests.lock().unwrap().push(request);
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("card network unreachable"));
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("cs_test_{n}");
        Ok(HostedSession {
            url: format!("https://pay.example.com/{id}"),
            id,
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub payments: Arc<FakePayments>,
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn token(sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        email: Some(format!("{sub}@example.com")),
        name: Some(format!("Photographer {sub}")),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(FakePayments::default(), true).await
    }

    pub async fn with_payments(payments: FakePayments) -> Self {
        Self::build(payments, true).await
    }

    pub async fn without_payments() -> Self {
        Self::build(FakePayments::default(), false).await
    }

    async fn build(payments: FakePayments, enabled: bool) -> Self {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        // one connection so every query sees the same in-memory database
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        schema::sync(&db).await.unwrap();

        let config = ApiConfig {
            frontend_url: "https://photos.example.com".into(),
            public_files_url: FILES_URL.into(),
            jwt_secret: SECRET.into(),
            stripe_webhook_secret: Some(WEBHOOK_SECRET.into()),
            ..ApiConfig::default()
        };

        let payments = Arc::new(payments);
        let gateway: Option<DynPaymentGateway> = if enabled {
            Some(payments.clone() as DynPaymentGateway)
        } else {
            None
        };

        let state = Arc::new(State::new(config, db, GalleryStore::memory(), gateway));
        Self {
            router: construct_router(state.clone()),
            state,
            payments,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call("GET", uri, token, None).await
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn seed_photographer(&self, sub: &str) -> photographer::Model {
        if let Some(existing) = photographer::Entity::find_by_id(sub)
            .one(&self.state.db)
            .await
            .unwrap()
        {
            return existing;
        }
        photographer::ActiveModel {
            id: Set(sub.to_string()),
            email: Set(format!("{sub}@example.com")),
            name: Set(Some(format!("Photographer {sub}"))),
            created_at: Set(now()),
        }
        .insert(&self.state.db)
        .await
        .unwrap()
    }

    /// Active, never-expiring gallery owned by `owner`; `tweak` adjusts it
    /// before insert.
    pub async fn seed_gallery(
        &self,
        owner: &str,
        tweak: impl FnOnce(&mut gallery::ActiveModel),
    ) -> gallery::Model {
        self.seed_photographer(owner).await;
        let mut record = gallery::ActiveModel {
            id: Set(shutterlink_types::create_id()),
            name: Set("Spring Wedding".into()),
            description: Set(Some("Ceremony and reception".into())),
            photographer_id: Set(owner.to_string()),
            client_name: Set("Ana Client".into()),
            client_email: Set("ana@example.com".into()),
            access_code: Set(generate_access_code()),
            is_active: Set(true),
            expires_at: Set(None),
            views: Set(0),
            created_at: Set(now()),
            updated_at: Set(now()),
        };
        tweak(&mut record);
        record.insert(&self.state.db).await.unwrap()
    }

    pub async fn seed_image(
        &self,
        gallery_id: &str,
        price_cents: i64,
        minutes_ago: i64,
    ) -> image::Model {
        let id = shutterlink_types::create_id();
        image::ActiveModel {
            id: Set(id.clone()),
            gallery_id: Set(gallery_id.to_string()),
            filename: Set(format!("IMG_{id}.jpg")),
            original_url: Set(format!("{FILES_URL}/galleries/{gallery_id}/originals/{id}.jpg")),
            thumbnail_url: Set(format!("{FILES_URL}/galleries/{gallery_id}/thumbnails/{id}.jpg")),
            storage_key: Set(format!("galleries/{gallery_id}/originals/{id}.jpg")),
            thumbnail_key: Set(format!("galleries/{gallery_id}/thumbnails/{id}.jpg")),
            size: Set(2048),
            width: Set(1200),
            height: Set(800),
            price: Set(price_cents),
            uploaded_at: Set(now() - Duration::minutes(minutes_ago)),
        }
        .insert(&self.state.db)
        .await
        .unwrap()
    }

    pub async fn gallery(&self, id: &str) -> Option<gallery::Model> {
        gallery::Entity::find_by_id(id)
            .one(&self.state.db)
            .await
            .unwrap()
    }

    pub async fn images(&self, gallery_id: &str) -> Vec<image::Model> {
        image::Entity::find()
            .filter(image::Column::GalleryId.eq(gallery_id))
            .order_by_asc(image::Column::Id)
            .all(&self.state.db)
            .await
            .unwrap()
    }

    /// Order of 10.00 USD created `age` ago.
    pub async fn seed_order(
        &self,
        gallery_id: &str,
        status: OrderStatus,
        session: Option<&str>,
        age: Duration,
    ) -> order::Model {
        order::ActiveModel {
            id: Set(shutterlink_types::create_id()),
            gallery_id: Set(gallery_id.to_string()),
            client_email: Set("ana@example.com".into()),
            client_name: Set("Ana Client".into()),
            total: Set(1000),
            currency: Set("USD".into()),
            status: Set(status),
            stripe_session_id: Set(session.map(str::to_string)),
            failure_reason: Set(None),
            created_at: Set(now() - age),
            updated_at: Set(now() - age),
            paid_at: Set(None),
        }
        .insert(&self.state.db)
        .await
        .unwrap()
    }

    pub async fn order(&self, id: &str) -> order::Model {
        order::Entity::find_by_id(id)
            .one(&self.state.db)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn stripe_events(&self) -> Vec<stripe_event::Model> {
        stripe_event::Entity::find()
            .all(&self.state.db)
            .await
            .unwrap()
    }

    pub async fn orders(&self) -> Vec<order::Model> {
        order::Entity::find()
            .order_by_asc(order::Column::CreatedAt)
            .all(&self.state.db)
            .await
            .unwrap()
    }

    pub async fn order_items(&self, order_id: &str) -> Vec<order_item::Model> {
        order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&self.state.db)
            .await
            .unwrap()
    }

    /// Waits for background work (the view counter) to land.
    pub async fn wait_for_views(&self, gallery_id: &str, expected: i64) -> i64 {
        let mut views = 0;
        for _ in 0..100 {
            views = self.gallery(gallery_id).await.map(|g| g.views).unwrap_or(0);
            if views >= expected {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        views
    }
}
