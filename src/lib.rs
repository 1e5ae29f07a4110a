//! Polar SDK for Rust
//!
//! An async client for the [Polar](https://polar.sh) REST API: checkouts,
//! customers, products, subscriptions, usage events, license keys and the
//! rest of the v1 surface, plus verification of inbound webhooks.
//!
//! ## API Coverage
//!
//! | Resource | Operations |
//! |----------|------------|
//! | Benefits | create, list, get, update, delete, grants |
//! | Checkout links | create, list, get, update, delete |
//! | Checkouts | create, list, get, update, client get |
//! | Customer sessions | create |
//! | Customers | CRUD by ID and external ID, state |
//! | Discounts | create, list, get, update, delete |
//! | Events | list, get, ingest, names |
//! | Files | create, list, complete upload, update, delete |
//! | License keys | list, get, update, activations, validate, activate, deactivate |
//! | Meters | create, list, get, update, quantities |
//! | Metrics | get, limits |
//! | OAuth2 | clients, token, revoke, introspect, userinfo |
//! | Orders | list, get |
//! | Organizations | create, list, get, update |
//! | Products | create, list, get, update, benefits |
//! | Subscriptions | list, get, update, revoke |
//! | Webhooks | endpoints, deliveries, redeliver |
//!
//! Every list operation has a `list_all` variant returning a lazy
//! [`Stream`](futures::Stream) over all pages.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use polar_sdk::{AccessToken, Environment, Polar};
//! use polar_sdk::api::customers::{CustomerCreate, CustomerListQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let polar = Polar::builder()
//!         .access_token(AccessToken::new("polar_oat_...")?)
//!         .environment(Environment::Sandbox)
//!         .build()?;
//!
//!     let customer = polar
//!         .customers()
//!         .create(&CustomerCreate::new("jane@example.com"))
//!         .await?;
//!     println!("Created {}", customer.id);
//!
//!     let all: Vec<_> = polar
//!         .customers()
//!         .list_all(&CustomerListQuery::new())
//!         .try_collect()
//!         .await?;
//!     println!("{} customers", all.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Resource clients and their request/response types
//! - [`client`] - Builder, HTTP client and transport
//! - [`error`] - Error types
//! - [`middleware`] - Tower layers for retry, rate limiting, auth and logging
//! - [`pagination`] - Page parameters and the paginated stream
//! - [`query`] - Query-string building for list filters
//! - [`types`] - Access token, webhook secret and environment
//! - [`webhooks`] - Signature verification of inbound deliveries
//!
//! ## Error Handling
//!
//! Every operation returns [`PolarResult`]. Match on [`PolarError`] variants,
//! or on [`PolarError::kind`] for coarse handling:
//!
//! ```rust,ignore
//! use polar_sdk::{ErrorKind, PolarError};
//!
//! match polar.customers().get("cus_123").await {
//!     Ok(customer) => println!("{}", customer.email),
//!     Err(PolarError::NotFound { .. }) => println!("no such customer"),
//!     Err(e) if e.kind() == ErrorKind::RateLimit => {
//!         eprintln!("throttled, retry after {:?}", e.retry_after());
//!     }
//!     Err(e) => eprintln!("Polar error: {e}"),
//! }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod middleware;
pub mod pagination;
pub mod query;
pub mod types;
pub mod webhooks;
mod utils;

pub use client::{Polar, PolarBuilder, PolarClient};
pub use error::{ErrorKind, PolarError, PolarResult};
pub use pagination::{ListResource, PageParams, Pagination};
pub use types::{AccessToken, Environment, WebhookSecret};
pub use webhooks::{Webhook, WebhookPayload};
