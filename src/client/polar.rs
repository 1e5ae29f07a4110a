//! Unified Polar SDK client

use std::sync::Arc;

use crate::api::benefits::BenefitsApi;
use crate::api::checkout_links::CheckoutLinksApi;
use crate::api::checkouts::CheckoutsApi;
use crate::api::customer_sessions::CustomerSessionsApi;
use crate::api::customers::CustomersApi;
use crate::api::discounts::DiscountsApi;
use crate::api::events::EventsApi;
use crate::api::files::FilesApi;
use crate::api::license_keys::LicenseKeysApi;
use crate::api::meters::MetersApi;
use crate::api::metrics::MetricsApi;
use crate::api::oauth2::OAuth2Api;
use crate::api::orders::OrdersApi;
use crate::api::organizations::OrganizationsApi;
use crate::api::products::ProductsApi;
use crate::api::subscriptions::SubscriptionsApi;
use crate::api::webhooks::WebhooksApi;
use crate::api::PolarContext;

use super::builder::PolarBuilder;
use super::polar_client::PolarClient;

/// Unified Polar client
///
/// This is the main entry point for the SDK. Each accessor returns a
/// lightweight resource client sharing one HTTP pipeline, so clones of
/// `Polar` and of the resource clients share the connection pool and the
/// rate limiter.
///
/// # Example
///
/// ```rust,ignore
/// use polar_sdk::{Polar, types::{AccessToken, Environment}};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let polar = Polar::builder()
///         .access_token(AccessToken::new("polar_oat_...")?)
///         .environment(Environment::Sandbox)
///         .build()?;
///
///     let customer = polar.customers().get("cus_123").await?;
///     println!("{}", customer.email);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Polar {
    context: Arc<PolarContext>,
}

impl Polar {
    pub fn builder() -> PolarBuilder {
        PolarBuilder::default()
    }

    pub fn from_client(client: PolarClient) -> Self {
        Self {
            context: Arc::new(PolarContext::new(Arc::new(client))),
        }
    }

    /// The low-level client, for endpoints without a typed wrapper.
    pub fn client(&self) -> &PolarClient {
        self.context.client()
    }

    pub fn benefits(&self) -> BenefitsApi {
        BenefitsApi::new(self.context.clone())
    }

    pub fn checkout_links(&self) -> CheckoutLinksApi {
        CheckoutLinksApi::new(self.context.clone())
    }

    pub fn checkouts(&self) -> CheckoutsApi {
        CheckoutsApi::new(self.context.clone())
    }

    pub fn customer_sessions(&self) -> CustomerSessionsApi {
        CustomerSessionsApi::new(self.context.clone())
    }

    pub fn customers(&self) -> CustomersApi {
        CustomersApi::new(self.context.clone())
    }

    pub fn discounts(&self) -> DiscountsApi {
        DiscountsApi::new(self.context.clone())
    }

    pub fn events(&self) -> EventsApi {
        EventsApi::new(self.context.clone())
    }

    pub fn files(&self) -> FilesApi {
        FilesApi::new(self.context.clone())
    }

    pub fn license_keys(&self) -> LicenseKeysApi {
        LicenseKeysApi::new(self.context.clone())
    }

    pub fn meters(&self) -> MetersApi {
        MetersApi::new(self.context.clone())
    }

    pub fn metrics(&self) -> MetricsApi {
        MetricsApi::new(self.context.clone())
    }

    pub fn oauth2(&self) -> OAuth2Api {
        OAuth2Api::new(self.context.clone())
    }

    pub fn orders(&self) -> OrdersApi {
        OrdersApi::new(self.context.clone())
    }

    pub fn organizations(&self) -> OrganizationsApi {
        OrganizationsApi::new(self.context.clone())
    }

    pub fn products(&self) -> ProductsApi {
        ProductsApi::new(self.context.clone())
    }

    pub fn subscriptions(&self) -> SubscriptionsApi {
        SubscriptionsApi::new(self.context.clone())
    }

    pub fn webhooks(&self) -> WebhooksApi {
        WebhooksApi::new(self.context.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccessToken;

    fn assert_send_sync<T: Send + Sync + Clone>() {}

    #[test]
    fn test_polar_is_send_sync_clone() {
        assert_send_sync::<Polar>();
        assert_send_sync::<PolarClient>();
    }

    #[test]
    fn test_clones_share_client() {
        let polar = Polar::builder()
            .access_token(AccessToken::new("polar_oat_test").unwrap())
            .build()
            .unwrap();
        let clone = polar.clone();
        assert!(std::ptr::eq(polar.client(), clone.client()));
    }
}
