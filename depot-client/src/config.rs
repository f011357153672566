//! Client configuration

use serde::{Deserialize, Serialize};

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("depot-client/", env!("CARGO_PKG_VERSION"));

/// What the host platform's transport can do.
///
/// Resolved once by the embedding application and checked once at
/// coordinator construction; transfer code never sniffs the platform
/// per-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Whether binary responses can be streamed with progress reporting
    /// and aborted mid-flight. Platforms that cannot (historically iOS
    /// web views) get the form-encoded download path, which has neither.
    #[serde(default = "default_true")]
    pub streaming_downloads: bool,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self {
            streaming_downloads: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Connection settings for one Depot server
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the server, e.g. `http://localhost:5000`
    pub base_url: String,

    /// CSRF token for mutating requests. Sent as the `X-CSRFToken` header
    /// on programmatic calls and as a `csrf_token` field on the form path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,

    /// Seconds to wait when opening a connection
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User agent override
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport capabilities of the host platform
    #[serde(default)]
    pub platform: PlatformCapabilities,
}

impl ClientConfig {
    /// Config for a server with default timeouts and full capabilities
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            csrf_token: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            platform: PlatformCapabilities::default(),
        }
    }
}

impl Default for ClientConfig {
    /// Points at the server's development address
    fn default() -> Self {
        Self::new("http://localhost:5000")
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "[REDACTED]"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("platform", &self.platform)
            .finish()
    }
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
