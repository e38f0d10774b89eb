//! Gateway lookup by internal name.

use std::{collections::HashMap, fmt, sync::Arc};

use vipago_core::{
    GatewayAdapter, GatewayCandidate, GatewayError, GatewaySpecificData, NewPaymentMethodDetails,
};

use crate::stripe::StripeGateway;

/// Set of gateway adapters, keyed by the internal name the server offers.
///
/// Supporting a new gateway means registering another adapter; callers that
/// dispatch through the registry do not change.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    adapters: HashMap<String, Arc<dyn GatewayAdapter>>,
}

impl GatewayRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in gateway.
    #[must_use]
    pub fn with_default_gateways(client: reqwest::Client) -> Self {
        Self::new().with_adapter(Arc::new(StripeGateway::new(client)))
    }

    /// Add an adapter, replacing and returning any adapter with the same name.
    pub fn register(&mut self, adapter: Arc<dyn GatewayAdapter>) -> Option<Arc<dyn GatewayAdapter>> {
        self.adapters
            .insert(adapter.internal_name().to_string(), adapter)
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn GatewayAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Look up an adapter.
    #[must_use]
    pub fn get(&self, internal_name: &str) -> Option<&Arc<dyn GatewayAdapter>> {
        self.adapters.get(internal_name)
    }

    /// Registered gateway names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    /// Tokenize with the adapter for `candidate`.
    ///
    /// # Errors
    /// Returns [`GatewayError::UnknownGateway`] if no adapter has the
    /// candidate's name, or the adapter's own error.
    pub async fn tokenize(
        &self,
        candidate: &GatewayCandidate,
        details: &NewPaymentMethodDetails,
    ) -> Result<GatewaySpecificData, GatewayError> {
        let name = candidate.gateway_internal_name.as_str();
        let adapter = self
            .get(name)
            .ok_or_else(|| GatewayError::UnknownGateway(name.to_string()))?;
        adapter
            .tokenize(candidate.api_key.as_deref(), details)
            .await
    }
}

impl fmt::Debug for GatewayRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("GatewayRegistry")
            .field("adapters", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::test_support::test_card;

    struct FixedGateway;

    #[async_trait]
    impl GatewayAdapter for FixedGateway {
        fn internal_name(&self) -> &str {
            "fixed"
        }

        async fn tokenize(
            &self,
            api_key: Option<&str>,
            _details: &NewPaymentMethodDetails,
        ) -> Result<GatewaySpecificData, GatewayError> {
            let key = api_key.ok_or_else(|| GatewayError::MissingCredential("fixed".to_string()))?;
            Ok(GatewaySpecificData::stripe(format!("pm_{key}").parse().unwrap()))
        }
    }

    fn candidate(name: &str, key: Option<&str>) -> GatewayCandidate {
        GatewayCandidate::new(name.parse().unwrap(), key.map(|k| k.parse().unwrap()))
    }

    #[tokio::test]
    async fn test_dispatches_by_name() {
        let registry = GatewayRegistry::new().with_adapter(Arc::new(FixedGateway));
        let data = registry
            .tokenize(&candidate("fixed", Some("abc")), &test_card())
            .await
            .unwrap();
        assert_eq!(data, GatewaySpecificData::stripe("pm_abc".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_unknown_gateway() {
        let registry = GatewayRegistry::with_default_gateways(reqwest::Client::new());
        let result = registry
            .tokenize(&candidate("unknown_gw", None), &test_card())
            .await;
        assert!(matches!(result, Err(GatewayError::UnknownGateway(name)) if name == "unknown_gw"));
    }

    #[test]
    fn test_default_gateways() {
        let registry = GatewayRegistry::with_default_gateways(reqwest::Client::new());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["stripe"]);
        assert!(format!("{registry:?}").contains("stripe"));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = GatewayRegistry::new();
        assert!(registry.register(Arc::new(FixedGateway)).is_none());
        assert!(registry.register(Arc::new(FixedGateway)).is_some());
        assert_eq!(registry.names().count(), 1);
    }
}
