//! Organizations API

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{resource_path, ListFilter};
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};
use crate::query::{ListQuery, QueryParams};

const ORGANIZATIONS_PATH: &str = "/v1/organizations/";

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrganizationSocialLink {
    pub platform: String,
    pub url: String,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Organization {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub socials: Vec<OrganizationSocialLink>,
    #[serde(default)]
    pub feature_settings: Option<Value>,
    #[serde(default)]
    pub subscription_settings: Option<Value>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationCreate {
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub socials: Vec<OrganizationSocialLink>,
}

impl OrganizationCreate {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            avatar_url: None,
            email: None,
            website: None,
            socials: Vec::new(),
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socials: Option<Vec<OrganizationSocialLink>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_settings: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_settings: Option<Value>,
}

impl OrganizationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrganizationListQuery {
    filter: ListFilter,
    slug: Option<String>,
}

impl OrganizationListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn sorting(mut self, key: impl Into<String>) -> Self {
        self.filter.sorting.push(key.into());
        self
    }
}

impl ListQuery for OrganizationListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params.push_opt("slug", self.slug.as_deref());
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct OrganizationsApi {
    context: Arc<PolarContext>,
}

impl OrganizationsApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    pub async fn create(&self, request: &OrganizationCreate) -> PolarResult<Organization> {
        self.context.client.post(ORGANIZATIONS_PATH, request).await
    }

    pub async fn list(
        &self,
        query: &OrganizationListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<Organization>> {
        self.context.list(ORGANIZATIONS_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &OrganizationListQuery,
    ) -> impl Stream<Item = PolarResult<Organization>> + Send + 'static {
        self.context
            .list_all(self.api_name(), ORGANIZATIONS_PATH, query)
    }

    pub async fn get(&self, id: &str) -> PolarResult<Organization> {
        self.context
            .client
            .get(&resource_path(ORGANIZATIONS_PATH, id)?, &[])
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        request: &OrganizationUpdate,
    ) -> PolarResult<Organization> {
        self.context
            .client
            .patch(&resource_path(ORGANIZATIONS_PATH, id)?, request)
            .await
    }
}

impl PolarApi for OrganizationsApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "organizations"
    }
}
