use std::time::Duration;

pub(crate) const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub(crate) const DEFAULT_PORT: u16 = 3030;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const API_BASE_URL_VAR: &str = "DEVCONSOLE_API_BASE_URL";
// Name used by the browser front-end's build, honoured so both halves can share one .env
const FRONTEND_API_BASE_URL_VAR: &str = "VITE_API_BASE_URL";
const PORT_VAR: &str = "DEVCONSOLE_PORT";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    pub(crate) api_base_url: String,
    pub(crate) port: u16,
    pub(crate) request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Read the configuration from the environment. A port given on the
    /// command line wins over the environment.
    pub(crate) fn from_env(port_flag: Option<u16>) -> Config {
        Config::resolve(
            port_flag,
            std::env::var(API_BASE_URL_VAR).ok(),
            std::env::var(FRONTEND_API_BASE_URL_VAR).ok(),
            std::env::var(PORT_VAR).ok(),
        )
    }

    fn resolve(
        port_flag: Option<u16>,
        api_base_url: Option<String>,
        frontend_api_base_url: Option<String>,
        port_var: Option<String>,
    ) -> Config {
        let api_base_url = api_base_url
            .or(frontend_api_base_url)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let port = port_flag.unwrap_or_else(|| match port_var {
            None => DEFAULT_PORT,
            Some(value) => value.trim().parse::<u16>().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid {} value `{}`", PORT_VAR, value);
                DEFAULT_PORT
            }),
        });

        Config {
            api_base_url,
            port,
            ..Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::resolve(None, None, None, None);
        assert_eq!(config, Config::default());
        assert_eq!(config.api_base_url, "http://localhost:8000");
    }

    #[test]
    fn test_base_url_precedence() {
        let config = Config::resolve(
            None,
            Some("http://api.internal:9000/".to_string()),
            Some("http://ignored".to_string()),
            None,
        );
        assert_eq!(config.api_base_url, "http://api.internal:9000");

        let config = Config::resolve(None, None, Some("http://frontend:8080".to_string()), None);
        assert_eq!(config.api_base_url, "http://frontend:8080");

        let config = Config::resolve(None, Some("  ".to_string()), None, None);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_port_precedence() {
        assert_eq!(Config::resolve(Some(4000), None, None, Some("5000".into())).port, 4000);
        assert_eq!(Config::resolve(None, None, None, Some("5000".into())).port, 5000);
        assert_eq!(Config::resolve(None, None, None, Some("http".into())).port, DEFAULT_PORT);
    }
}
