//! Settings: parse/write `userdeck.conf`.
//!
//! The file uses the same `key = value` layout as `keybinds.conf`. Unknown
//! keys and unparsable values are skipped and the default is kept. Command
//! line flags are applied on top by [`crate::cli::Cli::apply_to`].

use std::time::Duration;

use crate::api::http::DEFAULT_BASE_URL;
use crate::controller::ControllerOptions;

use super::ThemeName;

/// Runtime settings for the dashboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the remote user service, without trailing slash.
    pub base_url: String,
    /// Optional `x-api-key` header value.
    pub api_key: Option<String>,
    /// Bearer token for update/delete.
    pub token: Option<String>,
    pub theme: ThemeName,
    pub search_debounce_ms: u64,
    pub fetch_concurrency: usize,
    pub request_timeout_secs: u64,
    /// How long a notification stays on screen.
    pub notification_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            token: None,
            theme: ThemeName::Dark,
            search_debounce_ms: 300,
            fetch_concurrency: 4,
            request_timeout_secs: 15,
            notification_secs: 4,
        }
    }
}

impl Settings {
    /// Load settings from `path`, writing a default file when it is missing.
    pub fn load_or_init(path: &str) -> Self {
        let p = std::path::Path::new(path);
        if p.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let settings = Self::default();
        if let Err(e) = settings.write_file(path) {
            tracing::warn!(path, error = %e, "could not write default settings");
        }
        settings
    }

    /// `None` when the file cannot be read.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut cfg = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                continue;
            };
            let (key, val) = (lhs.trim(), rhs.trim());
            if key.is_empty() {
                continue;
            }
            match key {
                "base_url" if !val.is_empty() => cfg.base_url = val.trim_end_matches('/').to_string(),
                "api_key" => cfg.api_key = non_empty(val),
                "token" => cfg.token = non_empty(val),
                "theme" => {
                    if let Some(t) = ThemeName::parse(val) {
                        cfg.theme = t;
                    }
                }
                "search_debounce_ms" => parse_into(val, &mut cfg.search_debounce_ms),
                "fetch_concurrency" => {
                    parse_into(val, &mut cfg.fetch_concurrency);
                    cfg.fetch_concurrency = cfg.fetch_concurrency.max(1);
                }
                "request_timeout_secs" => parse_into(val, &mut cfg.request_timeout_secs),
                "notification_secs" => parse_into(val, &mut cfg.notification_secs),
                _ => {}
            }
        }
        cfg
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# userdeck settings\n");
        buf.push_str("# Command line flags and USERDECK_* environment variables override these values.\n\n");

        let mut kv = |k: &str, v: &str| {
            let _ = writeln!(&mut buf, "{k} = {v}");
        };
        kv("base_url", &self.base_url);
        kv("api_key", self.api_key.as_deref().unwrap_or(""));
        kv("token", self.token.as_deref().unwrap_or(""));
        kv("theme", self.theme.as_str());
        kv("search_debounce_ms", &self.search_debounce_ms.to_string());
        kv("fetch_concurrency", &self.fetch_concurrency.to_string());
        kv("request_timeout_secs", &self.request_timeout_secs.to_string());
        kv("notification_secs", &self.notification_secs.to_string());

        std::fs::write(path, buf)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            debounce: Duration::from_millis(self.search_debounce_ms),
            fetch_concurrency: self.fetch_concurrency.max(1),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn parse_into<T: std::str::FromStr>(s: &str, slot: &mut T) {
    if let Ok(v) = s.parse() {
        *slot = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys_and_ignores_noise() {
        let cfg = Settings::parse(
            "# comment\n\
             base_url = http://localhost:8080/api/\n\
             token = abc\n\
             api_key =\n\
             theme = light\n\
             fetch_concurrency = 0\n\
             search_debounce_ms = nope\n\
             unknown = 1\n\
             garbage line\n",
        );
        assert_eq!(cfg.base_url, "http://localhost:8080/api");
        assert_eq!(cfg.token.as_deref(), Some("abc"));
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.theme, ThemeName::Light);
        assert_eq!(cfg.fetch_concurrency, 1);
        assert_eq!(cfg.search_debounce_ms, 300);
    }

    #[test]
    fn written_file_parses_back() {
        let mut path = std::env::temp_dir();
        path.push(format!("userdeck_settings_{}.conf", std::process::id()));
        let path = path.to_string_lossy().to_string();

        let cfg = Settings {
            api_key: Some("reqres-free-v1".into()),
            theme: ThemeName::Light,
            fetch_concurrency: 2,
            ..Settings::default()
        };
        cfg.write_file(&path).unwrap();
        let back = Settings::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, cfg);
    }
}
