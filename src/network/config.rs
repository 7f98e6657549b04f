use std::cell::RefCell;

use crate::constants::DEFAULT_SANDBOX_STATUS_ENDPOINT;

/// API route configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    // When empty, REST calls are same-origin ("/api/...") and the WebSocket
    // base is derived from `window.location`.
    base_url: String,
    sandbox_status_endpoint: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            sandbox_status_endpoint: DEFAULT_SANDBOX_STATUS_ENDPOINT.to_string(),
        }
    }
}

impl ApiConfig {
    /// Build from the `API_BASE_URL` / `SANDBOX_STATUS_ENDPOINT` variables
    /// baked in at compile time. Both are optional.
    pub fn from_env() -> Self {
        Self::from_parts(
            option_env!("API_BASE_URL").unwrap_or(""),
            option_env!("SANDBOX_STATUS_ENDPOINT").unwrap_or(DEFAULT_SANDBOX_STATUS_ENDPOINT),
        )
    }

    pub fn from_parts(base_url: &str, sandbox_status_endpoint: &str) -> Self {
        let endpoint = sandbox_status_endpoint.trim_matches('/');
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            sandbox_status_endpoint: if endpoint.is_empty() {
                DEFAULT_SANDBOX_STATUS_ENDPOINT.to_string()
            } else {
                endpoint.to_string()
            },
        }
    }

    /// Get the base URL for all API calls
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get a full API URL for a given path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Base for WebSocket URLs: the configured base with its scheme swapped,
    /// or the current page's host when no base is configured.
    pub fn ws_base(&self) -> String {
        if self.base_url.is_empty() {
            return page_ws_base();
        }
        if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        }
    }

    /// Full URL of the per-row sandbox status channel.
    pub fn sandbox_status_url(&self) -> String {
        format!("{}/{}", self.ws_base(), self.sandbox_status_endpoint)
    }
}

#[cfg(target_arch = "wasm32")]
fn page_ws_base() -> String {
    if let Some(win) = web_sys::window() {
        let loc = win.location();
        let host = loc.host().unwrap_or_else(|_| "localhost".into());
        let proto = loc.protocol().unwrap_or_else(|_| "http:".into());
        let ws_scheme = if proto == "https:" { "wss" } else { "ws" };
        return format!("{}://{}", ws_scheme, host);
    }
    "ws://localhost".to_string()
}

#[cfg(not(target_arch = "wasm32"))]
fn page_ws_base() -> String {
    "ws://localhost".to_string()
}

thread_local! {
    static API_CONFIG: RefCell<ApiConfig> = RefCell::new(ApiConfig::from_env());
}

/// Replace the active configuration (runtime override from the host page).
pub fn set_api_config(config: ApiConfig) {
    API_CONFIG.with(|cell| *cell.borrow_mut() = config);
}

pub fn current_api_config() -> ApiConfig {
    API_CONFIG.with(|cell| cell.borrow().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_from_configured_base() {
        let cfg = ApiConfig::from_parts("https://studio.example.com/", "/studio-ws/sandbox/");
        assert_eq!(cfg.base_url(), "https://studio.example.com");
        assert_eq!(
            cfg.sandbox_status_url(),
            "wss://studio.example.com/studio-ws/sandbox"
        );
        assert_eq!(
            cfg.url("/api/v1/chatflows"),
            "https://studio.example.com/api/v1/chatflows"
        );

        let plain = ApiConfig::from_parts("http://localhost:3000", "");
        assert_eq!(
            plain.sandbox_status_url(),
            format!("ws://localhost:3000/{}", DEFAULT_SANDBOX_STATUS_ENDPOINT)
        );
    }

    #[test]
    fn test_runtime_override() {
        set_api_config(ApiConfig::from_parts("http://other:1234", "ws"));
        assert_eq!(current_api_config().url("/x"), "http://other:1234/x");
        set_api_config(ApiConfig::default());
        assert_eq!(current_api_config().url("/x"), "/x");
    }
}
