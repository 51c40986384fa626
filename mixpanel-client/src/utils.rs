use crate::errors::MixpanelError;
use crate::types::Config;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

#[cfg(feature = "tracing")]
use tracing::{debug, error, info, instrument};

/// Status Mixpanel reports for an accepted request.
const STATUS_OK: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Track,
    /// Backfill path for events older than the `track` recency window.
    Import,
    Engage,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Track => "track",
            Endpoint::Import => "import",
            Endpoint::Engage => "engage",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully shaped call, ready to be rendered into a request URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub endpoint: Endpoint,
    pub params: Value,
    pub auto_geolocate: bool,
}

impl Request {
    /// `<base>/<endpoint>?data=<base64 json>[&ip=1]&verbose=1`
    pub fn url(&self, base_url: &str) -> Result<String, MixpanelError> {
        let data = serde_json::to_vec(&self.params)?;
        let mut url = format!("{}/{}?data={}", base_url, self.endpoint, base64::encode(data));
        if self.auto_geolocate {
            url.push_str("&ip=1");
        }
        url.push_str("&verbose=1");
        Ok(url)
    }
}

/// Body returned when `verbose=1` is requested.
#[derive(Debug, Default, Deserialize)]
struct Reply {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status: Option<i64>,
}

#[cfg_attr(feature = "tracing", instrument(skip(http, config, request), fields(endpoint = %request.endpoint)))]
pub async fn send_request(
    http: &Client,
    config: &Config,
    request: &Request,
) -> Result<(), MixpanelError> {
    let url = request.url(config.base_url())?;
    #[cfg(feature = "tracing")]
    debug!(%url, params = %request.params, "Sending request to Mixpanel");

    let res = http
        .post(&url)
        .basic_auth(&config.api_key, Some(&config.api_secret))
        .send()
        .await
        .map_err(|e| MixpanelError::transport(&url, e.to_string()))?;

    let http_status = res.status().as_u16();
    let body = res
        .bytes()
        .await
        .map_err(|e| MixpanelError::transport(&url, e.to_string()))?;

    let (message, code) = decode_reply(&body);
    if code == STATUS_OK {
        #[cfg(feature = "tracing")]
        info!(http_status, "Mixpanel request successful");
        return Ok(());
    }

    #[cfg(feature = "tracing")]
    error!(http_status, code, %message, "Mixpanel API returned error");
    Err(MixpanelError::Api {
        url,
        message,
        http_status,
        code,
    })
}

/// Returns `(message, status)`. An empty body yields zero values; an
/// undecodable one yields the decoder's message and status 0.
fn decode_reply(body: &[u8]) -> (String, i64) {
    if body.is_empty() {
        return (String::new(), 0);
    }
    match serde_json::from_slice::<Reply>(body) {
        Ok(reply) => (
            reply.error.unwrap_or_default(),
            reply.status.unwrap_or_default(),
        ),
        Err(e) => (e.to_string(), 0),
    }
}
