use std::fmt;

/// Polar access token (organization access token, personal access token
/// or OAuth2 access token). Sent as `Authorization: Bearer <token>`.
///
/// The `Debug` output never contains the token itself. Deliberately not
/// `Serialize`/`Deserialize`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Result<Self, String> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err("AccessToken must not be empty".to_string());
        }
        if token.chars().any(char::is_whitespace) {
            return Err("AccessToken must not contain whitespace".to_string());
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "AccessToken({prefix}..)")
    }
}

/// Secret shared with a webhook endpoint, used to verify deliveries.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct WebhookSecret(String);

impl WebhookSecret {
    pub fn new(secret: impl Into<String>) -> Result<Self, String> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err("WebhookSecret must not be empty".to_string());
        }
        Ok(Self(secret))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret([REDACTED])")
    }
}
