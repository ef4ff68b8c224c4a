//! Configuration module - environment, CLI overrides and defaults
//!
//! Configuration is built once at startup and passed explicitly into every
//! operation. Nothing here is global.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use anyhow::{anyhow, Result};

/// Environment variable holding the upstream credential
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

/// Environment variable for a custom upstream base URL
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";

/// Environment variable for the model name
pub const ENV_MODEL: &str = "PROMPT_ENHANCER_MODEL";

/// Environment variable for the max output tokens
pub const ENV_MAX_TOKENS: &str = "PROMPT_ENHANCER_MAX_TOKENS";

/// Environment variable for the upstream timeout
pub const ENV_TIMEOUT_SECS: &str = "PROMPT_ENHANCER_TIMEOUT_SECS";

/// Environment variable for the proxy service endpoint
pub const ENV_SERVICE_URL: &str = "PROMPT_ENHANCER_SERVICE_URL";

/// Environment variables for the service listener
pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "HOST";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:3000";

/// Which backend performs the enhancement for the interactive front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Call the completion API directly
    #[default]
    Direct,
    /// Proxy through a running enhancement service
    Service,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "direct" | "openai" => Ok(Self::Direct),
            "service" | "proxy" => Ok(Self::Service),
            other => Err(anyhow!("Unknown backend '{}', expected direct or service", other)),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Service => write!(f, "service"),
        }
    }
}

/// CLI override configuration; `None` keeps the environment/default value
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub service_url: Option<String>,
    pub backend: Option<Backend>,
}

/// Settings for one enhancement call
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancerConfig {
    /// Upstream credential; `None` means not configured
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
    /// Enhancement service endpoint used by [`Backend::Service`]
    pub service_url: String,
    pub backend: Backend,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            service_url: DEFAULT_SERVICE_URL.to_string(),
            backend: Backend::Direct,
        }
    }
}

impl EnhancerConfig {
    /// Build from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(lookup(key));
        let defaults = Self::default();

        Ok(Self {
            api_key: get(ENV_API_KEY),
            base_url: get(ENV_BASE_URL)
                .map(|u| normalize_url(&u))
                .unwrap_or(defaults.base_url),
            model: get(ENV_MODEL).unwrap_or(defaults.model),
            max_tokens: parse_var::<u32>(ENV_MAX_TOKENS, get(ENV_MAX_TOKENS))?
                .map(|v| require_positive(ENV_MAX_TOKENS, v))
                .transpose()?
                .unwrap_or(defaults.max_tokens),
            temperature: defaults.temperature,
            timeout_secs: parse_var::<u64>(ENV_TIMEOUT_SECS, get(ENV_TIMEOUT_SECS))?
                .map(|v| require_positive(ENV_TIMEOUT_SECS, v))
                .transpose()?
                .unwrap_or(defaults.timeout_secs),
            service_url: get(ENV_SERVICE_URL)
                .map(|u| normalize_url(&u))
                .unwrap_or(defaults.service_url),
            backend: defaults.backend,
        })
    }

    /// Apply CLI overrides on top of this configuration
    pub fn with_overrides(mut self, overrides: CliOverrides) -> Result<Self> {
        if let Some(key) = non_blank(overrides.api_key) {
            self.api_key = Some(key);
        }
        if let Some(url) = non_blank(overrides.base_url) {
            self.base_url = normalize_url(&url);
        }
        if let Some(model) = non_blank(overrides.model) {
            self.model = model;
        }
        if let Some(max_tokens) = overrides.max_tokens {
            self.max_tokens = require_positive("--max-tokens", max_tokens)?;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs = require_positive("--timeout", timeout)?;
        }
        if let Some(url) = non_blank(overrides.service_url) {
            self.service_url = normalize_url(&url);
        }
        if let Some(backend) = overrides.backend {
            self.backend = backend;
        }
        Ok(self)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Listener settings for the enhancement service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            host: parse_var(ENV_HOST, non_blank(lookup(ENV_HOST)))?.unwrap_or(defaults.host),
            port: parse_var(ENV_PORT, non_blank(lookup(ENV_PORT)))?.unwrap_or(defaults.port),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str, value: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| anyhow!("Invalid value '{}' for {}: {}", v, name, e))
        })
        .transpose()
}

/// Token budgets and timeouts of zero would make every call fail upstream
fn require_positive<T>(name: &str, value: T) -> Result<T>
where
    T: PartialEq + Default + std::fmt::Display,
{
    if value == T::default() {
        return Err(anyhow!("{} must be a positive integer, got {}", name, value));
    }
    Ok(value)
}

/// Remove trailing slashes
fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
