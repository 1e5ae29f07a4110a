//! Polar HTTP client module
//!
//! [`Polar`] is the facade handing out resource clients, [`PolarClient`] the
//! JSON client underneath, and [`PolarBuilder`] configures both.

mod builder;
pub use builder::{PolarBuilder, ENV_ACCESS_TOKEN, ENV_BASE_URL, ENV_ENVIRONMENT};

mod polar;
pub use polar::Polar;

mod polar_client;
pub use polar_client::PolarClient;

mod transport;
pub use transport::HttpTransport;
