use std::collections::HashMap;

use shutterlink_types::{Result, anyhow, bail};

use super::{CheckoutSessionRequest, HostedSession, PaymentGateway};

/// Hosted checkout through Stripe.
pub struct StripeGateway {
    client: stripe::Client,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: stripe::Client::new(secret_key),
        }
    }
}

fn parse_currency(code: &str) -> Result<stripe::Currency> {
    let currency = match code.to_ascii_lowercase().as_str() {
        "usd" => stripe::Currency::USD,
        "eur" => stripe::Currency::EUR,
        "gbp" => stripe::Currency::GBP,
        "cad" => stripe::Currency::CAD,
        "aud" => stripe::Currency::AUD,
        "chf" => stripe::Currency::CHF,
        "sek" => stripe::Currency::SEK,
        "nok" => stripe::Currency::NOK,
        "dkk" => stripe::Currency::DKK,
        "nzd" => stripe::Currency::NZD,
        other => bail!("Unsupported currency: {}", other),
    };
    Ok(currency)
}

#[async_trait::async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<HostedSession> {
        let currency = parse_currency(&request.currency)?;

        let mut metadata = HashMap::new();
        metadata.insert("order_id".to_string(), request.order_id.clone());
        metadata.insert("gallery_id".to_string(), request.gallery_id.clone());

        let mut params = stripe::CreateCheckoutSession::new();
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.mode = Some(stripe::CheckoutSessionMode::Payment);
        params.customer_email = Some(&request.customer_email);
        // client_reference_id is how the webhook finds the order
        params.client_reference_id = Some(&request.order_id);

        let line_items = request
            .line_items
            .iter()
            .map(|item| stripe::CreateCheckoutSessionLineItems {
                price_data: Some(stripe::CreateCheckoutSessionLineItemsPriceData {
                    currency,
                    product_data: Some(
                        stripe::CreateCheckoutSessionLineItemsPriceDataProductData {
                            name: item.name.clone(),
                            description: Some(item.description.clone()),
                            ..Default::default()
                        },
                    ),
                    unit_amount: Some(item.unit_amount),
                    ..Default::default()
                }),
                quantity: Some(item.quantity),
                ..Default::default()
            })
            .collect();
        params.line_items = Some(line_items);
        params.metadata = Some(metadata);

        let session = stripe::CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| anyhow!("Failed to create checkout session: {}", e))?;

        let url = session
            .url
            .ok_or_else(|| anyhow!("Checkout session {} has no URL", session.id))?;

        tracing::info!(
            order_id = %request.order_id,
            session_id = %session.id,
            "Created checkout session"
        );

        Ok(HostedSession {
            id: session.id.to_string(),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currencies_are_case_insensitive() {
        assert_eq!(parse_currency("USD").unwrap(), stripe::Currency::USD);
        assert_eq!(parse_currency("eur").unwrap(), stripe::Currency::EUR);
        assert!(parse_currency("xyz").is_err());
    }
}
