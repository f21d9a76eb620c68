use std::sync::Arc;

use shutterlink_types::Result;

mod stripe_gateway;

pub use stripe_gateway::StripeGateway;

/// One line on the hosted payment page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionLineItem {
    pub name: String,
    pub description: String,
    /// Cents
    pub unit_amount: i64,
    pub quantity: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    /// Echoed back by the provider so webhooks can find the order
    pub order_id: String,
    pub gallery_id: String,
    pub customer_email: String,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub line_items: Vec<SessionLineItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostedSession {
    pub id: String,
    pub url: String,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: CheckoutSessionRequest)
    -> Result<HostedSession>;
}

pub type DynPaymentGateway = Arc<dyn PaymentGateway>;
