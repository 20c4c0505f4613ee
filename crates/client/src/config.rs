//! Connection configuration for the aggregation server.

/// Production API endpoint.
const DEFAULT_API_BASE: &str = "https://paissadb.zhu.codes";

/// Production WebSocket push endpoint.
const DEFAULT_WS_URL: &str = "wss://paissadb.zhu.codes/ws";

/// Endpoints and credentials for one server session.
///
/// `ws_secret` is only needed for the legacy authenticated WebSocket
/// route; the HTTP path uses server-issued session tokens instead.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base HTTP URL, e.g. `https://paissadb.zhu.codes`.
    pub api_base: String,
    /// WebSocket push URL, e.g. `wss://paissadb.zhu.codes/ws`.
    pub ws_url: String,
    /// Shared secret for signing the WebSocket `jwt` query parameter.
    pub ws_secret: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            ws_secret: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to
    /// the production endpoints.
    ///
    /// | Env Var            | Default                         |
    /// |--------------------|---------------------------------|
    /// | `PAISSA_API_BASE`  | `https://paissadb.zhu.codes`    |
    /// | `PAISSA_WS_URL`    | `wss://paissadb.zhu.codes/ws`   |
    /// | `PAISSA_WS_SECRET` | unset                           |
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("PAISSA_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            ws_url: std::env::var("PAISSA_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string()),
            ws_secret: std::env::var("PAISSA_WS_SECRET").ok(),
        }
    }
}
