use crate::errors::MixpanelError;
use crate::types::{Config, Event, Update, UpdateTime};
use crate::utils::{send_request, Endpoint, Request};
use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Events older than this must go through the import endpoint.
const TRACK_WINDOW_DAYS: i64 = 5;

/// Operations shared by [`Mixpanel`] and [`crate::mock::MockMixpanel`].
pub trait MixpanelApi: Send + Sync {
    /// Records `event_name` for `distinct_id`.
    fn track(
        &self,
        distinct_id: &str,
        event_name: &str,
        event: &Event,
    ) -> impl Future<Output = Result<(), MixpanelError>> + Send;

    /// Applies a profile update to `distinct_id`.
    fn update(
        &self,
        distinct_id: &str,
        update: &Update,
    ) -> impl Future<Output = Result<(), MixpanelError>> + Send;

    /// Links `new_id` to the existing `distinct_id`.
    fn alias(
        &self,
        distinct_id: &str,
        new_id: &str,
    ) -> impl Future<Output = Result<(), MixpanelError>> + Send;
}

#[derive(Clone)]
pub struct Mixpanel {
    pub config: Arc<Config>,
    http: Client,
}

impl Mixpanel {
    /// An empty `api_url` selects the default endpoint.
    pub fn new(token: &str, api_key: &str, api_secret: &str, api_url: &str) -> Self {
        Self::init(Config::new(token, api_key, api_secret, api_url))
    }

    pub fn init(config: Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Uses a caller-built HTTP client, e.g. one configured with a proxy
    /// or timeouts.
    pub fn with_client(http: Client, config: Config) -> Self {
        Self {
            config: Arc::new(config),
            http,
        }
    }

    pub fn track_request(&self, distinct_id: &str, event_name: &str, event: &Event) -> Request {
        let mut endpoint = Endpoint::Track;
        let mut props = json!({
            "token": self.config.token,
            "distinct_id": distinct_id,
        });

        if let Some(ip) = event.explicit_ip() {
            props["ip"] = json!(ip);
        }
        if let Some(timestamp) = event.timestamp {
            props["time"] = json!(timestamp.timestamp());
            if timestamp < Utc::now() - Duration::days(TRACK_WINDOW_DAYS) {
                #[cfg(feature = "tracing")]
                debug!(event_name, "timestamp is older than 5 days, using import endpoint");
                endpoint = Endpoint::Import;
            }
        }

        for (key, value) in &event.properties {
            props[key.as_str()] = value.clone();
        }

        Request {
            endpoint,
            params: json!({
                "event": event_name,
                "properties": props,
            }),
            auto_geolocate: event.explicit_ip().is_none(),
        }
    }

    pub fn update_request(&self, distinct_id: &str, update: &Update) -> Request {
        let mut params = json!({
            "$token": self.config.token,
            "$distinct_id": distinct_id,
        });

        if let Some(ip) = update.explicit_ip() {
            params["$ip"] = json!(ip);
        }
        match update.time {
            UpdateTime::Ignore => params["$ignore_time"] = json!(true),
            UpdateTime::Explicit(time) => params["$time"] = json!(time.timestamp()),
            UpdateTime::Unspecified => {}
        }

        params[update.operation.as_str()] = Value::Object(update.properties.clone());

        Request {
            endpoint: Endpoint::Engage,
            params,
            auto_geolocate: update.explicit_ip().is_none(),
        }
    }

    pub fn alias_request(&self, distinct_id: &str, new_id: &str) -> Request {
        Request {
            endpoint: Endpoint::Track,
            params: json!({
                "event": "$create_alias",
                "properties": {
                    "token": self.config.token,
                    "distinct_id": distinct_id,
                    "alias": new_id,
                },
            }),
            auto_geolocate: false,
        }
    }

    async fn send(&self, request: Request) -> Result<(), MixpanelError> {
        send_request(&self.http, &self.config, &request).await
    }
}

impl MixpanelApi for Mixpanel {
    async fn track(
        &self,
        distinct_id: &str,
        event_name: &str,
        event: &Event,
    ) -> Result<(), MixpanelError> {
        self.send(self.track_request(distinct_id, event_name, event))
            .await
    }

    async fn update(&self, distinct_id: &str, update: &Update) -> Result<(), MixpanelError> {
        self.send(self.update_request(distinct_id, update)).await
    }

    async fn alias(&self, distinct_id: &str, new_id: &str) -> Result<(), MixpanelError> {
        self.send(self.alias_request(distinct_id, new_id)).await
    }
}
