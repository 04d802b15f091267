pub const DEFAULT_SOCKET_URL: &str = "ws://127.0.0.1:10138/myo/";
pub const DEFAULT_API_VERSION: u32 = 3;
pub const DEFAULT_APP_ID: &str = "com.myojs.default";

/// Where and as whom to connect to Myo Connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Base URL; the API version and app id are appended.
    pub socket_url: String,
    pub api_version: u32,
    pub app_id: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            api_version: DEFAULT_API_VERSION,
            app_id: DEFAULT_APP_ID.to_string(),
        }
    }
}

impl ConnectOptions {
    /// Defaults overridden by `MYO_SOCKET_URL`, `MYO_API_VERSION` and `MYO_APP_ID`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            socket_url: read_env_string("MYO_SOCKET_URL", &defaults.socket_url),
            api_version: read_env_u32("MYO_API_VERSION", defaults.api_version),
            app_id: read_env_string("MYO_APP_ID", &defaults.app_id),
        }
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    pub fn with_socket_url(mut self, socket_url: impl Into<String>) -> Self {
        self.socket_url = socket_url.into();
        self
    }

    /// Full handshake URL, e.g. `ws://127.0.0.1:10138/myo/3?appid=com.myojs.default`.
    pub fn url(&self) -> String {
        format!("{}{}?appid={}", self.socket_url, self.api_version, self.app_id)
    }
}

fn read_env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn read_env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url() {
        assert_eq!(
            ConnectOptions::default().url(),
            "ws://127.0.0.1:10138/myo/3?appid=com.myojs.default"
        );
    }

    #[test]
    fn test_overrides() {
        let options = ConnectOptions::default()
            .with_app_id("com.example.slides")
            .with_socket_url("ws://10.0.0.2:10138/myo/");
        assert_eq!(options.url(), "ws://10.0.0.2:10138/myo/3?appid=com.example.slides");
    }

    #[test]
    fn test_read_env_fallbacks() {
        assert_eq!(read_env_u32("MYOLINK_TEST_UNSET_VERSION", 7), 7);
        assert_eq!(read_env_string("MYOLINK_TEST_UNSET_URL", "ws://x/"), "ws://x/");
    }
}
