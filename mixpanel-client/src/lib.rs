//! Thin client for the Mixpanel ingestion API.
//!
//! Each call shapes one request, base64-encodes its JSON parameters into the
//! query string and issues a single POST. [`MockMixpanel`] implements the same
//! [`MixpanelApi`] trait and records calls in memory instead.

pub mod client;
pub mod errors;
pub mod mock;
pub mod types;
pub mod utils;

pub use client::{Mixpanel, MixpanelApi};
pub use errors::MixpanelError;
pub use mock::MockMixpanel;
pub use types::{Config, Event, Properties, Update, UpdateTime, DEFAULT_API_URL, NO_IP};
