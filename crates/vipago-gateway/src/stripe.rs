//! Stripe card tokenization.

use async_trait::async_trait;
use serde::Deserialize;
use vipago_core::{
    GatewayAdapter, GatewayError, GatewaySpecificData, NewCardDetails, NewPaymentMethodDetails,
    NonEmptyString,
};

/// Stripe's payment-method creation endpoint.
pub const STRIPE_PAYMENT_METHODS_URL: &str = "https://api.stripe.com/v1/payment_methods";

/// Client identifier Stripe expects from publishable-key card tokenization.
const PAYMENT_USER_AGENT: &str = "stripe.js/d16ff171ee; stripe-js-v3/d16ff171ee; card-element";

#[derive(Debug, Deserialize)]
struct StripePaymentMethod {
    id: NonEmptyString,
}

/// Tokenizes cards by creating a Stripe `PaymentMethod` with a publishable key.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl StripeGateway {
    /// Internal name the server uses for Stripe.
    pub const INTERNAL_NAME: &'static str = "stripe";

    /// Create an adapter using the given HTTP client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: STRIPE_PAYMENT_METHODS_URL.to_string(),
        }
    }

    /// Override the tokenization endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn card_form(card: &NewCardDetails, key: &str) -> Vec<(&'static str, String)> {
        let address = &card.address;
        vec![
            ("type", "card".to_string()),
            ("card[number]", card.card_number.to_string()),
            ("card[cvc]", card.cvc.to_string()),
            ("card[exp_month]", card.expiry_month.to_string()),
            ("card[exp_year]", card.expiry_year.to_string()),
            ("billing_details[name]", card.cardholder_name.to_string()),
            ("billing_details[address][line1]", address.line1.to_string()),
            ("billing_details[address][line2]", address.line2.to_string()),
            ("billing_details[address][city]", address.city.to_string()),
            ("billing_details[address][state]", address.state.to_string()),
            ("billing_details[address][postal_code]", address.postal_code.to_string()),
            ("billing_details[address][country]", address.country.to_string()),
            ("payment_user_agent", PAYMENT_USER_AGENT.to_string()),
            ("key", key.to_string()),
        ]
    }
}

#[async_trait]
impl GatewayAdapter for StripeGateway {
    fn internal_name(&self) -> &str {
        Self::INTERNAL_NAME
    }

    async fn tokenize(
        &self,
        api_key: Option<&str>,
        details: &NewPaymentMethodDetails,
    ) -> Result<GatewaySpecificData, GatewayError> {
        let key = api_key.ok_or_else(|| GatewayError::MissingCredential(Self::INTERNAL_NAME.to_string()))?;
        let NewPaymentMethodDetails::Card(card) = details;

        let response = self
            .client
            .post(&self.endpoint)
            .form(&Self::card_form(card, key))
            .send()
            .await
            .map_err(|e| GatewayError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
            });
        }

        let payment_method: StripePaymentMethod = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        tracing::debug!("Stripe created payment method {}", payment_method.id);

        Ok(GatewaySpecificData::stripe(payment_method.id))
    }
}
