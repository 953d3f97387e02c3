//! Configuration types for push-gateway.

use secrecy::SecretString;

/// Default base URL of the FCM HTTP v1 API.
pub const DEFAULT_FCM_BASE_URL: &str = "https://fcm.googleapis.com";

/// Configuration for connecting to the push provider.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the provider (e.g., "https://fcm.googleapis.com").
    pub base_url: String,
    /// Project the messages are sent on behalf of.
    pub project_id: String,
    /// OAuth access token sent as a bearer credential.
    pub access_token: SecretString,
}

impl GatewayConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            access_token: SecretString::from(access_token.into()),
        }
    }

    /// Create configuration against the public FCM endpoint.
    pub fn fcm(project_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::new(DEFAULT_FCM_BASE_URL, project_id, access_token)
    }

    /// Get the message send endpoint URL.
    pub fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.base_url, self.project_id
        )
    }
}
