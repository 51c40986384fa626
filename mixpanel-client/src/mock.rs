//! In-memory stand-in for [`Mixpanel`](crate::Mixpanel).
//!
//! Records what each call would have sent, keyed by distinct id, so tests
//! can assert on call sites without network access. The `Display` output
//! is sorted by distinct id, event name and property name.

use crate::client::MixpanelApi;
use crate::errors::MixpanelError;
use crate::types::{Event, Properties, Update, UpdateTime};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockEvent {
    pub ip: Option<String>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub properties: Properties,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockPerson {
    pub ip: Option<String>,
    pub time: Option<DateTime<FixedOffset>>,
    pub properties: Properties,
    /// Last event recorded under each name.
    pub events: BTreeMap<String, MockEvent>,
    pub aliases: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct MockMixpanel {
    people: Mutex<BTreeMap<String, MockPerson>>,
}

impl MockMixpanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn person(&self, distinct_id: &str) -> Option<MockPerson> {
        self.people.lock().get(distinct_id).cloned()
    }

    pub fn distinct_ids(&self) -> Vec<String> {
        self.people.lock().keys().cloned().collect()
    }

    pub fn clear(&self) {
        self.people.lock().clear();
    }

    fn with_person(&self, distinct_id: &str, f: impl FnOnce(&mut MockPerson)) {
        let mut people = self.people.lock();
        f(people.entry(distinct_id.to_string()).or_default());
    }
}

impl MixpanelApi for MockMixpanel {
    async fn track(
        &self,
        distinct_id: &str,
        event_name: &str,
        event: &Event,
    ) -> Result<(), MixpanelError> {
        self.with_person(distinct_id, |person| {
            person.events.insert(
                event_name.to_string(),
                MockEvent {
                    ip: event.explicit_ip().map(str::to_string),
                    timestamp: event.timestamp,
                    properties: event.properties.clone(),
                },
            );
        });
        Ok(())
    }

    async fn update(&self, distinct_id: &str, update: &Update) -> Result<(), MixpanelError> {
        self.with_person(distinct_id, |person| {
            if let Some(ip) = update.explicit_ip() {
                person.ip = Some(ip.to_string());
            }
            if let UpdateTime::Explicit(time) = update.time {
                person.time = Some(time);
            }
            for (key, value) in &update.properties {
                person.properties.insert(key.clone(), value.clone());
            }
        });
        Ok(())
    }

    async fn alias(&self, distinct_id: &str, new_id: &str) -> Result<(), MixpanelError> {
        self.with_person(distinct_id, |person| {
            person.aliases.insert(new_id.to_string());
        });
        Ok(())
    }
}

impl fmt::Display for MockMixpanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (distinct_id, person) in self.people.lock().iter() {
            line(f, 0, &format!("{distinct_id}:"))?;
            line(f, 2, &format!("ip: {}", person.ip.as_deref().unwrap_or_default()))?;
            line(f, 2, &format!("time: {}", render_time(person.time)))?;
            line(f, 2, "properties:")?;
            write_properties(f, 4, &person.properties)?;
            line(f, 2, "events:")?;
            for (name, event) in &person.events {
                line(f, 4, &format!("{name}:"))?;
                line(f, 6, &format!("IP: {}", event.ip.as_deref().unwrap_or_default()))?;
                line(f, 6, &format!("Timestamp: {}", render_time(event.timestamp)))?;
                write_properties(f, 6, &event.properties)?;
            }
            if !person.aliases.is_empty() {
                line(f, 2, "aliases:")?;
                for alias in &person.aliases {
                    line(f, 4, alias)?;
                }
            }
        }
        Ok(())
    }
}

// Empty fields render without trailing whitespace.
fn line(f: &mut fmt::Formatter<'_>, indent: usize, text: &str) -> fmt::Result {
    writeln!(f, "{:indent$}{}", "", text.trim_end(), indent = indent)
}

fn write_properties(f: &mut fmt::Formatter<'_>, indent: usize, properties: &Properties) -> fmt::Result {
    for (key, value) in properties {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        line(f, indent, &format!("{key}: {value}"))?;
    }
    Ok(())
}

fn render_time(time: Option<DateTime<FixedOffset>>) -> String {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_default()
}
