//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 6969;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

/// Top-level Rusty Canvas configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas: Option<CanvasConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Single allowed CORS origin. Absent or `"*"` allows any origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_origin: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Limits and font sources for the drawing surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_max_dimension")]
    pub max_width: u32,

    #[serde(default = "default_max_dimension")]
    pub max_height: u32,

    /// Load the fonts installed on the host for text elements.
    #[serde(default = "default_true")]
    pub system_fonts: bool,

    /// Extra directories to load fonts from.
    #[serde(default)]
    pub font_dirs: Vec<String>,

    /// Family used when a requested font is not installed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_font_family: Option<String>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_DIMENSION,
            max_height: DEFAULT_MAX_DIMENSION,
            system_fonts: true,
            font_dirs: Vec::new(),
            default_font_family: None,
        }
    }
}

fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "rusty_canvas_gateway=debug").
    #[serde(default)]
    pub filters: Vec<String>,

    /// Output target: "stderr" (default) or "stdout".
    #[serde(default = "default_log_output")]
    pub output: String,
}

fn default_log_format() -> String {
    "plain".into()
}

fn default_log_output() -> String {
    "stderr".into()
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> String {
    static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        regex::Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex")
    });
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .into_owned()
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;

        // Substitute ${ENV_VAR} references before parsing
        let substituted = substitute_env_vars(&raw);

        let config: Config = json5::from_str(&substituted)
            .map_err(|e| crate::error::RustyCanvasError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    /// Port from the config file, or the default.
    pub fn gateway_port(&self) -> u16 {
        self.gateway
            .as_ref()
            .map(|g| g.port)
            .unwrap_or(DEFAULT_PORT)
    }

    /// Port to listen on: the explicit override, then `PORT`, then the config.
    pub fn listen_port(&self, cli_port: Option<u16>) -> u16 {
        self.resolve_port(cli_port, std::env::var("PORT").ok().as_deref())
    }

    fn resolve_port(&self, cli_port: Option<u16>, env_port: Option<&str>) -> u16 {
        if let Some(port) = cli_port {
            return port;
        }
        match env_port.map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    tracing::warn!(value = %raw, "Ignoring invalid PORT");
                    self.gateway_port()
                }
            },
            None => self.gateway_port(),
        }
    }

    pub fn bind_addr(&self) -> String {
        self.gateway
            .as_ref()
            .and_then(|g| g.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    /// The single allowed CORS origin; `None` means any origin.
    pub fn cors_origin(&self) -> Option<&str> {
        self.gateway
            .as_ref()
            .and_then(|g| g.cors_origin.as_deref())
            .filter(|origin| !origin.is_empty() && *origin != "*")
    }

    pub fn canvas(&self) -> CanvasConfig {
        self.canvas.clone().unwrap_or_default()
    }

    /// Maximum `(width, height)` a canvas may be created with.
    pub fn max_dimensions(&self) -> (u32, u32) {
        let canvas = self.canvas();
        (canvas.max_width, canvas.max_height)
    }

    /// Extra font directories with `~` expanded.
    pub fn font_dirs(&self) -> Vec<PathBuf> {
        self.canvas
            .as_ref()
            .map(|c| {
                c.font_dirs
                    .iter()
                    .map(|dir| PathBuf::from(shellexpand::tilde(dir).as_ref()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Preferred fallback font family, if configured.
    pub fn default_font_family(&self) -> Option<String> {
        self.canvas
            .as_ref()
            .and_then(|c| c.default_font_family.clone())
            .filter(|family| !family.trim().is_empty())
    }

    /// Get a config value by dotted path (e.g. "gateway.port").
    pub fn get_path(&self, path: &str) -> Option<serde_json::Value> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if let Some(gw) = &self.gateway {
            if gw.port == 0 {
                errors.push("Gateway port cannot be 0".to_string());
            }
            if let Some(origin) = &gw.cors_origin {
                if origin.chars().any(|c| c.is_control()) {
                    errors.push(format!("CORS origin is not a valid header value: {origin:?}"));
                }
            }
        }

        let (max_width, max_height) = self.max_dimensions();
        if max_width == 0 || max_height == 0 {
            errors.push("Canvas max_width and max_height must be greater than 0".to_string());
        }

        for dir in self.font_dirs() {
            if !dir.is_dir() {
                warnings.push(format!("Font directory not found: {}", dir.display()));
            }
        }

        (warnings, errors)
    }
}

/// Base directory for Rusty Canvas data: `~/.rusty_canvas/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rusty_canvas")
}
