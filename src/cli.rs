//! Command line arguments. Every flag also reads a `USERDECK_*` variable and
//! overrides the matching key from `userdeck.conf`.

use std::path::PathBuf;

use clap::Parser;

use crate::app::ThemeName;
use crate::app::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "userdeck", version, about = "Browse, search, edit and delete users of a remote REST service")]
pub struct Cli {
    /// Settings file (created with defaults when missing)
    #[arg(long, env = "USERDECK_CONFIG", default_value = "userdeck.conf")]
    pub config: String,

    /// Key bindings file (created with defaults when missing)
    #[arg(long, env = "USERDECK_KEYBINDS", default_value = "keybinds.conf")]
    pub keybinds: String,

    /// Base URL of the user service, e.g. https://reqres.in/api
    #[arg(long, env = "USERDECK_BASE_URL")]
    pub base_url: Option<String>,

    /// Value sent in the `x-api-key` header
    #[arg(long, env = "USERDECK_API_KEY")]
    pub api_key: Option<String>,

    /// Bearer token for update/delete requests
    #[arg(long, env = "USERDECK_TOKEN")]
    pub token: Option<String>,

    /// Sign in with this email when no token is configured
    #[arg(long, env = "USERDECK_EMAIL", requires = "password")]
    pub email: Option<String>,

    #[arg(long, env = "USERDECK_PASSWORD", requires = "email", hide_env_values = true)]
    pub password: Option<String>,

    /// Initial color theme
    #[arg(long, env = "USERDECK_THEME", value_parser = parse_theme)]
    pub theme: Option<ThemeName>,

    /// Log file; the terminal is owned by the UI
    #[arg(long, env = "USERDECK_LOG_FILE", default_value = "userdeck.log")]
    pub log_file: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "USERDECK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

fn parse_theme(s: &str) -> Result<ThemeName, String> {
    ThemeName::parse(s).ok_or_else(|| format!("unknown theme '{s}' (expected dark or light)"))
}

impl Cli {
    /// Overlay flags on top of file settings.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(url) = &self.base_url {
            settings.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = &self.api_key {
            settings.api_key = Some(key.clone());
        }
        if let Some(token) = &self.token {
            settings.token = Some(token.clone());
        }
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
    }

    /// Email/password pair when both were given.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.email, &self.password) {
            (Some(e), Some(p)) => Some((e.as_str(), p.as_str())),
            _ => None,
        }
    }
}
