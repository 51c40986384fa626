use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

pub const DEFAULT_API_URL: &str = "https://api.mixpanel.com";

/// IP value that tells Mixpanel not to record an address for the call.
pub const NO_IP: &str = "0";

/// Custom properties attached to an event or profile update.
pub type Properties = Map<String, Value>;

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_url: String,
}

impl Config {
    pub fn new(token: &str, api_key: &str, api_secret: &str, api_url: &str) -> Self {
        Self {
            token: token.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            api_url: api_url.to_string(),
        }
    }

    /// Base URL without a trailing slash, falling back to [`DEFAULT_API_URL`].
    pub fn base_url(&self) -> &str {
        let url = self.api_url.trim_end_matches('/');
        if url.is_empty() {
            DEFAULT_API_URL
        } else {
            url
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// A tracked event.
///
/// `ip` left unset (or empty) lets Mixpanel geolocate the request itself;
/// use [`NO_IP`] to record no address at all. A `timestamp` of `None` means
/// "now". At least one custom property is expected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    pub ip: Option<String>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub properties: Properties,
}

impl Event {
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            ..Default::default()
        }
    }

    pub fn with_ip(mut self, ip: &str) -> Self {
        self.ip = Some(ip.to_string());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub(crate) fn explicit_ip(&self) -> Option<&str> {
        explicit_ip(&self.ip)
    }
}

/// How a profile update sets its time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateTime {
    /// Mixpanel stamps the update with the current time.
    #[default]
    Unspecified,
    Explicit(DateTime<FixedOffset>),
    /// Sends `$ignore_time`, leaving the profile's "last seen" untouched.
    Ignore,
}

/// A profile update such as `$set` or `$add`.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub ip: Option<String>,
    pub time: UpdateTime,
    pub operation: String,
    pub properties: Properties,
}

impl Update {
    pub fn new(operation: &str, properties: Properties) -> Self {
        Self {
            ip: None,
            time: UpdateTime::Unspecified,
            operation: operation.to_string(),
            properties,
        }
    }

    pub fn set(properties: Properties) -> Self {
        Self::new("$set", properties)
    }

    pub fn set_once(properties: Properties) -> Self {
        Self::new("$set_once", properties)
    }

    /// Numeric increments.
    pub fn add(properties: Properties) -> Self {
        Self::new("$add", properties)
    }

    pub fn append(properties: Properties) -> Self {
        Self::new("$append", properties)
    }

    pub fn union(properties: Properties) -> Self {
        Self::new("$union", properties)
    }

    pub fn remove(properties: Properties) -> Self {
        Self::new("$remove", properties)
    }

    pub fn with_ip(mut self, ip: &str) -> Self {
        self.ip = Some(ip.to_string());
        self
    }

    pub fn with_time(mut self, time: DateTime<FixedOffset>) -> Self {
        self.time = UpdateTime::Explicit(time);
        self
    }

    pub fn ignore_time(mut self) -> Self {
        self.time = UpdateTime::Ignore;
        self
    }

    pub(crate) fn explicit_ip(&self) -> Option<&str> {
        explicit_ip(&self.ip)
    }
}

fn explicit_ip(ip: &Option<String>) -> Option<&str> {
    ip.as_deref().filter(|ip| !ip.is_empty())
}
