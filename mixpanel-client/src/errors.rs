use thiserror::Error;

#[derive(Debug, Error)]
pub enum MixpanelError {
    #[error("Failed to encode request parameters: {0}")]
    Encode(#[from] serde_json::Error),

    /// Transport, body-read, decode and service-rejected failures.
    /// `http_status` is 0 when no response was received.
    #[error("Mixpanel request failed (status={http_status} code={code}): {message}")]
    Api {
        url: String,
        message: String,
        http_status: u16,
        code: i64,
    },
}

impl MixpanelError {
    pub(crate) fn transport(url: &str, message: String) -> Self {
        MixpanelError::Api {
            url: url.to_string(),
            message,
            http_status: 0,
            code: 0,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            MixpanelError::Api { url, .. } => Some(url),
            MixpanelError::Encode(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            MixpanelError::Api { message, .. } => Some(message),
            MixpanelError::Encode(_) => None,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            MixpanelError::Api { http_status, .. } => Some(*http_status),
            MixpanelError::Encode(_) => None,
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            MixpanelError::Api { code, .. } => Some(*code),
            MixpanelError::Encode(_) => None,
        }
    }
}
