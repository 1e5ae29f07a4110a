//! Customer sessions API
//!
//! Creates short-lived tokens that authenticate a customer on the customer
//! portal, e.g. to redirect them there from your own dashboard.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::customers::Customer;
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;

const CUSTOMER_SESSIONS_PATH: &str = "/v1/customer-sessions/";

#[non_exhaustive]
#[derive(Clone, Deserialize, Serialize)]
pub struct CustomerSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub customer_portal_url: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub customer: Option<Customer>,
}

impl fmt::Debug for CustomerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomerSession")
            .field("id", &self.id)
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("customer_id", &self.customer_id)
            .finish_non_exhaustive()
    }
}

/// Identifies the customer either by Polar ID or by your external ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CustomerSessionCreate {
    Customer { customer_id: String },
    External { external_customer_id: String },
}

impl CustomerSessionCreate {
    pub fn customer(id: impl Into<String>) -> Self {
        CustomerSessionCreate::Customer {
            customer_id: id.into(),
        }
    }

    pub fn external(external_id: impl Into<String>) -> Self {
        CustomerSessionCreate::External {
            external_customer_id: external_id.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CustomerSessionsApi {
    context: Arc<PolarContext>,
}

impl CustomerSessionsApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn create(&self, request: &CustomerSessionCreate) -> PolarResult<CustomerSession> {
        self.context
            .client
            .post(CUSTOMER_SESSIONS_PATH, request)
            .await
    }
}

impl PolarApi for CustomerSessionsApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "customer_sessions"
    }
}
