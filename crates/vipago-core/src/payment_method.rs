//! Payment-method models.
//!
//! Field names and `_tag` discriminators match the platform's JSON schema.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{CustomerId, NonEmptyString, PaymentMethodId, WorkspaceId};

/// Gateway-specific reference to a tokenized payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum GatewaySpecificData {
    /// Stripe `PaymentMethod` object.
    #[serde(rename = "stripe")]
    Stripe(StripeCardData),
}

/// Stripe payment-method reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripeCardData {
    pub stripe_payment_method_id: NonEmptyString,
}

impl GatewaySpecificData {
    /// Build a Stripe reference from a Stripe `pm_...` id.
    #[must_use]
    pub const fn stripe(stripe_payment_method_id: NonEmptyString) -> Self {
        Self::Stripe(StripeCardData {
            stripe_payment_method_id,
        })
    }
}

/// A tokenized payment method, safe to store and transmit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum PaymentMethod {
    #[serde(rename = "card")]
    Card(CardPaymentMethod),
}

/// Tokenized card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPaymentMethod {
    pub gateway_specific_data: GatewaySpecificData,
    pub last4_digits: NonEmptyString,
}

impl PaymentMethod {
    /// Build a tokenized card.
    #[must_use]
    pub const fn card(gateway_specific_data: GatewaySpecificData, last4_digits: NonEmptyString) -> Self {
        Self::Card(CardPaymentMethod {
            gateway_specific_data,
            last4_digits,
        })
    }
}

/// Raw details of a payment method about to be created.
///
/// Holds card data in memory only. The `Debug` output is redacted and the
/// value is never logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum NewPaymentMethodDetails {
    #[serde(rename = "card")]
    Card(NewCardDetails),
}

impl NewPaymentMethodDetails {
    /// Name of the payment-method type, as sent in the opening request.
    #[must_use]
    pub fn payment_method_name(&self) -> NonEmptyString {
        match self {
            Self::Card(_) => NonEmptyString::from_static("card"),
        }
    }

    /// Last four digits of the card number, ignoring separators.
    ///
    /// Returns `None` if the card number contains no digits.
    #[must_use]
    pub fn last4_digits(&self) -> Option<NonEmptyString> {
        match self {
            Self::Card(card) => {
                let digits: Vec<char> = card
                    .card_number
                    .chars()
                    .filter(char::is_ascii_digit)
                    .collect();
                let start = digits.len().saturating_sub(4);
                NonEmptyString::new(digits[start..].iter().collect::<String>()).ok()
            }
        }
    }
}

/// Raw card details.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCardDetails {
    pub card_number: NonEmptyString,
    pub expiry_month: u32,
    pub expiry_year: u32,
    pub cvc: NonEmptyString,
    pub cardholder_name: NonEmptyString,
    pub address: BillingAddress,
}

impl fmt::Debug for NewCardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewCardDetails")
            .field("card_number", &"<redacted>")
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cvc", &"<redacted>")
            .field("cardholder_name", &self.cardholder_name)
            .field("address", &self.address)
            .finish()
    }
}

/// Cardholder billing address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
    pub line1: NonEmptyString,
    pub line2: NonEmptyString,
    pub city: NonEmptyString,
    pub state: NonEmptyString,
    pub postal_code: NonEmptyString,
    pub country: NonEmptyString,
}

/// Reference to a related resource: either its id or the expanded object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<I> {
    Id(I),
    Expanded(Map<String, Value>),
}

impl<I: AsRef<str>> Expandable<I> {
    /// Identifier of the referenced resource, whichever form it was sent in.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id.as_ref()),
            Self::Expanded(object) => object.get("id").and_then(Value::as_str),
        }
    }
}

impl AsRef<str> for CustomerId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for WorkspaceId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A stored payment method, as returned by the platform once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodRecord {
    pub id: PaymentMethodId,
    pub customer_id: Expandable<CustomerId>,
    pub workspace_id: Expandable<WorkspaceId>,
    pub data: PaymentMethod,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn test_card() -> NewPaymentMethodDetails {
        serde_json::from_value(json!({
            "_tag": "card",
            "cardNumber": "4242424242424242",
            "expiryMonth": 12,
            "expiryYear": 2030,
            "cvc": "123",
            "cardholderName": "Ada Lovelace",
            "address": {
                "line1": "Rua A, 1",
                "line2": "Apto 2",
                "city": "Sao Paulo",
                "state": "SP",
                "postalCode": "01000-000",
                "country": "BR"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_expiry_must_be_unsigned_integer() {
        for expiry_month in [json!(-1), json!(1.5), json!("12")] {
            let mut details = serde_json::to_value(test_card()).unwrap();
            details["expiryMonth"] = expiry_month;
            assert!(serde_json::from_value::<NewPaymentMethodDetails>(details).is_err());
        }
    }

    #[test]
    fn test_payment_method_wire_format() {
        let pm = PaymentMethod::card(
            GatewaySpecificData::stripe("pm_card_visa".parse().unwrap()),
            "4242".parse().unwrap(),
        );
        assert_eq!(
            serde_json::to_value(&pm).unwrap(),
            json!({
                "_tag": "card",
                "gatewaySpecificData": {
                    "_tag": "stripe",
                    "stripePaymentMethodId": "pm_card_visa"
                },
                "last4Digits": "4242"
            })
        );
    }

    #[test]
    fn test_last4_digits() {
        assert_eq!(test_card().last4_digits().unwrap().as_str(), "4242");

        let NewPaymentMethodDetails::Card(mut card) = test_card();
        card.card_number = "4000 0566 5566 5556".parse().unwrap();
        let details = NewPaymentMethodDetails::Card(card.clone());
        assert_eq!(details.last4_digits().unwrap().as_str(), "5556");

        card.card_number = "----".parse().unwrap();
        assert!(NewPaymentMethodDetails::Card(card).last4_digits().is_none());
    }

    #[test]
    fn test_card_debug_is_redacted() {
        let rendered = format!("{:?}", test_card());
        assert!(!rendered.contains("4242424242424242"));
        assert!(!rendered.contains("\"123\""));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_record_accepts_expanded_references() {
        let record: PaymentMethodRecord = serde_json::from_value(json!({
            "id": "pm_1",
            "customerId": { "id": "cust_123", "name": "Ada" },
            "workspaceId": "wosp_9",
            "data": {
                "_tag": "card",
                "gatewaySpecificData": { "_tag": "stripe", "stripePaymentMethodId": "pm_card_visa" },
                "last4Digits": "4242"
            },
            "deleted": false
        }))
        .unwrap();
        assert_eq!(record.customer_id.id(), Some("cust_123"));
        assert_eq!(record.workspace_id.id(), Some("wosp_9"));
        assert!(matches!(record.customer_id, Expandable::Expanded(_)));
    }

    #[test]
    fn test_record_rejects_bad_customer_reference() {
        let result = serde_json::from_value::<PaymentMethodRecord>(json!({
            "id": "pm_1",
            "customerId": "nope",
            "workspaceId": "wosp_9",
            "data": {
                "_tag": "card",
                "gatewaySpecificData": { "_tag": "stripe", "stripePaymentMethodId": "pm_card_visa" },
                "last4Digits": "4242"
            },
            "deleted": false
        }));
        assert!(result.is_err());
    }
}
