use crate::connection::ReconnectPolicy;
use std::env;
use std::time::Duration;

/// Sub-protocol the Krad server expects on its control socket.
pub const KRAD_PROTOCOL: &str = "krad-ipc";

pub struct AppConfig {
    pub krad_host: String,
    pub krad_port: u16,
    pub http_bind: String,
    pub reconnect_attempts: u32,
    pub reconnect_base_ms: u64,
    pub reconnect_max_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            krad_host: env_var("KRAD_HOST", "127.0.0.1"),
            krad_port: env_var("KRAD_PORT", "13000").parse().unwrap_or(13000),
            http_bind: env_var("HTTP_BIND", "0.0.0.0:8080"),
            reconnect_attempts: env_var("RECONNECT_ATTEMPTS", "0").parse().unwrap_or(0),
            reconnect_base_ms: env_var("RECONNECT_BASE_MS", "500").parse().unwrap_or(500),
            reconnect_max_ms: env_var("RECONNECT_MAX_MS", "30000")
                .parse()
                .unwrap_or(30000),
        }
    }

    pub fn krad_uri(&self) -> String {
        format!("ws://{}:{}/", self.krad_host, self.krad_port)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.reconnect_attempts,
            base_delay: Duration::from_millis(self.reconnect_base_ms),
            max_delay: Duration::from_millis(self.reconnect_max_ms),
        }
    }
}

fn env_var(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_uses_host_and_port() {
        let config = AppConfig {
            krad_host: "mixer.local".into(),
            krad_port: 4040,
            http_bind: "127.0.0.1:0".into(),
            reconnect_attempts: 0,
            reconnect_base_ms: 10,
            reconnect_max_ms: 20,
        };
        assert_eq!(config.krad_uri(), "ws://mixer.local:4040/");
        let policy = config.reconnect_policy();
        assert_eq!(policy.max_delay, Duration::from_millis(20));
        assert_eq!(policy.delay(0), None);
    }
}
