//! Polar API resource modules
//!
//! One module per resource group of the Polar REST API:
//!
//! - [`common`] - Metadata, addresses, intervals and shared list filters
//! - [`benefits`] - Benefits and their grants
//! - [`checkout_links`] - Reusable checkout links
//! - [`checkouts`] - Checkout sessions
//! - [`customer_sessions`] - Customer portal sessions
//! - [`customers`] - Customers, by Polar ID or external ID, and their state
//! - [`discounts`] - Fixed and percentage discounts
//! - [`events`] - Usage event ingestion and listing
//! - [`files`] - Multipart file uploads
//! - [`license_keys`] - License key management and customer portal validation
//! - [`meters`] - Usage meters and their quantities
//! - [`metrics`] - Revenue and usage time series
//! - [`oauth2`] - OAuth2 clients and tokens
//! - [`orders`] - Orders
//! - [`organizations`] - Organizations
//! - [`products`] - Products and prices
//! - [`subscriptions`] - Subscriptions
//! - [`webhooks`] - Webhook endpoints and deliveries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use polar_sdk::{AccessToken, Polar};
//! use polar_sdk::api::customers::CustomerCreate;
//!
//! let polar = Polar::builder()
//!     .access_token(AccessToken::new("polar_oat_...")?)
//!     .build()?;
//! let customer = polar.customers().create(&CustomerCreate::new("jane@example.com")).await?;
//! ```

pub mod benefits;
pub mod checkout_links;
pub mod checkouts;
pub mod common;
pub mod context;
pub mod customer_sessions;
pub mod customers;
pub mod discounts;
pub mod events;
pub mod files;
pub mod license_keys;
pub mod meters;
pub mod metrics;
pub mod oauth2;
pub mod orders;
pub mod organizations;
pub mod products;
pub mod subscriptions;
pub mod webhooks;

pub use benefits::{Benefit, BenefitCreate, BenefitType, BenefitUpdate, BenefitsApi};
pub use checkout_links::{CheckoutLink, CheckoutLinkCreate, CheckoutLinkUpdate, CheckoutLinksApi};
pub use checkouts::{Checkout, CheckoutCreate, CheckoutStatus, CheckoutUpdate, CheckoutsApi};
pub use common::{Address, Metadata, MetadataValue, TimeInterval};
pub use context::{PolarApi, PolarContext};
pub use customer_sessions::{CustomerSession, CustomerSessionCreate, CustomerSessionsApi};
pub use customers::{Customer, CustomerCreate, CustomerState, CustomerUpdate, CustomersApi};
pub use discounts::{Discount, DiscountCreate, DiscountDuration, DiscountValue, DiscountsApi};
pub use events::{Event, EventCreate, EventsApi};
pub use files::{File, FileCreate, FileUpload, FileUploadCompleted, FilesApi};
pub use license_keys::{
    LicenseKey, LicenseKeyActivate, LicenseKeyDeactivate, LicenseKeyValidate, LicenseKeysApi,
};
pub use meters::{Meter, MeterAggregation, MeterCreate, MeterFilter, MetersApi};
pub use metrics::{MetricsApi, MetricsLimits, MetricsQuery, MetricsResponse};
pub use oauth2::{OAuth2Api, OAuth2Client, TokenRequest, TokenResponse};
pub use orders::{Order, OrdersApi};
pub use organizations::{Organization, OrganizationCreate, OrganizationsApi};
pub use products::{Product, ProductCreate, ProductPrice, ProductUpdate, ProductsApi};
pub use subscriptions::{Subscription, SubscriptionStatus, SubscriptionUpdate, SubscriptionsApi};
pub use webhooks::{WebhookEndpoint, WebhookEndpointCreate, WebhooksApi};
