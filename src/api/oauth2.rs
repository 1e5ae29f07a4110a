//! OAuth2 API
//!
//! Client registration (RFC 7591) plus the token, revocation, introspection
//! and userinfo endpoints of Polar's authorization server. Token endpoints
//! take `application/x-www-form-urlencoded` bodies.

use std::fmt;
use std::sync::Arc;

use futures::stream::Stream;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::common::resource_path;
use super::{PolarApi, PolarContext};
use crate::error::PolarResult;
use crate::pagination::{ListResource, PageParams};

const CLIENTS_PATH: &str = "/v1/oauth2/";
const REGISTER_PATH: &str = "/v1/oauth2/register";
const CLIENT_PATH: &str = "/v1/oauth2/register/";
const TOKEN_PATH: &str = "/v1/oauth2/token";
const REVOKE_PATH: &str = "/v1/oauth2/revoke";
const INTROSPECT_PATH: &str = "/v1/oauth2/introspect";
const USERINFO_PATH: &str = "/v1/oauth2/userinfo";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
    ClientSecretBasic,
    #[default]
    ClientSecretPost,
    None,
}

/// Registration metadata of an OAuth2 client.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OAuth2ClientConfiguration {
    pub client_name: String,
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,
    #[serde(default = "default_grant_types")]
    pub grant_types: Vec<String>,
    #[serde(default = "default_response_types")]
    pub response_types: Vec<String>,
    /// Space separated scopes, e.g. `openid email products:read`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tos_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_uri: Option<String>,
}

fn default_grant_types() -> Vec<String> {
    vec!["authorization_code".to_string(), "refresh_token".to_string()]
}

fn default_response_types() -> Vec<String> {
    vec!["code".to_string()]
}

impl OAuth2ClientConfiguration {
    pub fn new<I, S>(client_name: impl Into<String>, redirect_uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client_name: client_name.into(),
            redirect_uris: redirect_uris.into_iter().map(Into::into).collect(),
            token_endpoint_auth_method: TokenEndpointAuthMethod::default(),
            grant_types: default_grant_types(),
            response_types: default_response_types(),
            scope: None,
            client_uri: None,
            logo_uri: None,
            tos_uri: None,
            policy_uri: None,
        }
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn client_uri(mut self, uri: impl Into<String>) -> Self {
        self.client_uri = Some(uri.into());
        self
    }

    pub fn token_endpoint_auth_method(mut self, method: TokenEndpointAuthMethod) -> Self {
        self.token_endpoint_auth_method = method;
        self
    }
}

#[derive(Debug, Serialize)]
struct OAuth2ClientUpdate<'a> {
    client_id: &'a str,
    #[serde(flatten)]
    configuration: &'a OAuth2ClientConfiguration,
}

#[non_exhaustive]
#[derive(Clone, Deserialize, Serialize)]
pub struct OAuth2Client {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub client_id_issued_at: i64,
    #[serde(default)]
    pub client_secret_expires_at: i64,
    #[serde(flatten)]
    pub configuration: OAuth2ClientConfiguration,
}

impl fmt::Debug for OAuth2Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Client")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}

/// Token endpoint request, tagged by `grant_type`.
#[derive(Clone, Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum TokenRequest {
    AuthorizationCode {
        client_id: String,
        client_secret: String,
        code: String,
        redirect_uri: String,
    },
    RefreshToken {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

impl TokenRequest {
    pub fn authorization_code(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        code: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        TokenRequest::AuthorizationCode {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            code: code.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    pub fn refresh_token(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        TokenRequest::RefreshToken {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }

    pub fn grant_type(&self) -> &'static str {
        match self {
            TokenRequest::AuthorizationCode { .. } => "authorization_code",
            TokenRequest::RefreshToken { .. } => "refresh_token",
        }
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type())
            .finish_non_exhaustive()
    }
}

#[non_exhaustive]
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTypeHint {
    AccessToken,
    RefreshToken,
}

/// Form body shared by revocation and introspection.
#[non_exhaustive]
#[derive(Clone, Serialize)]
pub struct TokenCheck {
    pub token: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type_hint: Option<TokenTypeHint>,
}

impl TokenCheck {
    pub fn new(
        token: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_type_hint: None,
        }
    }

    pub fn hint(mut self, hint: TokenTypeHint) -> Self {
        self.token_type_hint = Some(hint);
        self
    }
}

impl fmt::Debug for TokenCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCheck")
            .field("client_id", &self.client_id)
            .field("token_type_hint", &self.token_type_hint)
            .finish_non_exhaustive()
    }
}

/// RFC 7662 introspection result. Only `active` is present for inactive
/// tokens.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenIntrospection {
    pub active: bool,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// `user` or `organization`
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// OpenID Connect userinfo for a user or organization subject.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct OAuth2Api {
    context: Arc<PolarContext>,
}

impl OAuth2Api {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    /// Clients owned by the authenticated user.
    pub async fn list_clients(&self, page: PageParams) -> PolarResult<ListResource<OAuth2Client>> {
        self.context.list(CLIENTS_PATH, &(), page).await
    }

    pub fn list_all_clients(
        &self,
    ) -> impl Stream<Item = PolarResult<OAuth2Client>> + Send + 'static {
        self.context.list_all(self.api_name(), CLIENTS_PATH, &())
    }

    pub async fn create_client(
        &self,
        configuration: &OAuth2ClientConfiguration,
    ) -> PolarResult<OAuth2Client> {
        self.context.client.post(REGISTER_PATH, configuration).await
    }

    pub async fn get_client(&self, client_id: &str) -> PolarResult<OAuth2Client> {
        self.context
            .client
            .get(&resource_path(CLIENT_PATH, client_id)?, &[])
            .await
    }

    /// Replace a client's registration metadata.
    pub async fn update_client(
        &self,
        client_id: &str,
        configuration: &OAuth2ClientConfiguration,
    ) -> PolarResult<OAuth2Client> {
        let body = OAuth2ClientUpdate {
            client_id,
            configuration,
        };
        self.context
            .client
            .put(&resource_path(CLIENT_PATH, client_id)?, &body)
            .await
    }

    pub async fn delete_client(&self, client_id: &str) -> PolarResult<()> {
        self.context
            .client
            .delete_no_content(&resource_path(CLIENT_PATH, client_id)?)
            .await
    }

    pub async fn request_token(&self, request: &TokenRequest) -> PolarResult<TokenResponse> {
        self.context.client.post_form(TOKEN_PATH, request).await
    }

    pub async fn revoke_token(&self, request: &TokenCheck) -> PolarResult<()> {
        self.context
            .client
            .post_form::<IgnoredAny, _>(REVOKE_PATH, request)
            .await?;
        Ok(())
    }

    pub async fn introspect_token(&self, request: &TokenCheck) -> PolarResult<TokenIntrospection> {
        self.context.client.post_form(INTROSPECT_PATH, request).await
    }

    /// Claims of the subject the access token was issued for.
    pub async fn userinfo(&self) -> PolarResult<UserInfo> {
        self.context.client.get(USERINFO_PATH, &[]).await
    }
}

impl PolarApi for OAuth2Api {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "oauth2"
    }
}
