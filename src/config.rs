// Client configuration: where the four backend services live and how long we wait for them

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_QUOTE_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_LANGUAGE_TTL_SECS: u64 = 300;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL for {name}: {value}")]
    InvalidUrl { name: String, value: String },

    #[error("Invalid number for {name}: {value}")]
    InvalidNumber { name: String, value: String },
}

// The four REST services the site talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Tours,
    Bookings,
    Messaging,
    Media,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Tours => "tours",
            Service::Bookings => "bookings",
            Service::Messaging => "messaging",
            Service::Media => "media",
        }
    }
}

// Base URL per service, fixed per deployment
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceEndpoints {
    pub tours: String,
    pub bookings: String,
    pub messaging: String,
    pub media: String,
}

impl ServiceEndpoints {
    // Behind the reverse proxy every service is mounted under /api/<name>
    pub fn behind_proxy(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            tours: format!("{}/api/tours", base),
            bookings: format!("{}/api/bookings", base),
            messaging: format!("{}/api/messaging", base),
            media: format!("{}/api/media", base),
        }
    }

    pub fn url_for(&self, service: Service) -> &str {
        match service {
            Service::Tours => &self.tours,
            Service::Bookings => &self.bookings,
            Service::Messaging => &self.messaging,
            Service::Media => &self.media,
        }
    }
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self::behind_proxy(DEFAULT_API_BASE_URL)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoints: ServiceEndpoints,
    pub timeout_ms: u64,
    pub quote_debounce_ms: u64,
    pub language_cache_ttl_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: ServiceEndpoints::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            quote_debounce_ms: DEFAULT_QUOTE_DEBOUNCE_MS,
            language_cache_ttl_secs: DEFAULT_LANGUAGE_TTL_SECS,
        }
    }
}

impl ClientConfig {
    /// Build a configuration from the process environment, after loading a `.env` file if
    /// one is present.
    ///
    /// `API_BASE_URL` sets the proxy root for all four services; `TOURS_API_URL`,
    /// `BOOKINGS_API_URL`, `MESSAGING_API_URL` and `MEDIA_API_URL` override a single
    /// service. `API_TIMEOUT_MS`, `QUOTE_DEBOUNCE_MS` and `LANGUAGE_CACHE_TTL_SECS` tune
    /// the timings.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match lookup("API_BASE_URL") {
            Some(value) => check_url("API_BASE_URL", value)?,
            None => DEFAULT_API_BASE_URL.to_string(),
        };
        let mut endpoints = ServiceEndpoints::behind_proxy(&base);

        for (name, slot) in [
            ("TOURS_API_URL", &mut endpoints.tours),
            ("BOOKINGS_API_URL", &mut endpoints.bookings),
            ("MESSAGING_API_URL", &mut endpoints.messaging),
            ("MEDIA_API_URL", &mut endpoints.media),
        ] {
            if let Some(value) = lookup(name) {
                *slot = check_url(name, value)?.trim_end_matches('/').to_string();
            }
        }

        Ok(Self {
            endpoints,
            timeout_ms: read_number(&lookup, "API_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            quote_debounce_ms: read_number(
                &lookup,
                "QUOTE_DEBOUNCE_MS",
                DEFAULT_QUOTE_DEBOUNCE_MS,
            )?,
            language_cache_ttl_secs: read_number(
                &lookup,
                "LANGUAGE_CACHE_TTL_SECS",
                DEFAULT_LANGUAGE_TTL_SECS,
            )?,
        })
    }

    pub fn with_endpoints(mut self, endpoints: ServiceEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_quote_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.quote_debounce_ms = debounce_ms;
        self
    }

    pub fn with_language_cache_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.language_cache_ttl_secs = ttl_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn quote_debounce(&self) -> Duration {
        Duration::from_millis(self.quote_debounce_ms)
    }

    pub fn language_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.language_cache_ttl_secs)
    }
}

fn check_url(name: &str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidUrl {
            name: name.to_string(),
            value,
        })
    }
}

fn read_number<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber {
                name: name.to_string(),
                value,
            }),
        None => Ok(default),
    }
}
