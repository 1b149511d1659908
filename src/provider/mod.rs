//! Transactional email provider contract.

/// EmailJS REST client.
pub mod emailjs;
/// Scripted provider used by tests.
#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use std::{collections::BTreeMap, time::Duration};
use thiserror::Error;

/// Template variables sent with a message, keyed by template variable name.
pub type TemplateParams = BTreeMap<String, String>;

/// Successful acceptance by the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderResponse {
    /// HTTP status code returned by the provider.
    pub status: u16,
    /// Response body text (EmailJS answers `OK`).
    pub text: String,
}

/// Errors raised by a send call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// `init` never received a usable public key.
    #[error("email provider is not initialized (missing public key)")]
    NotInitialized,
    /// The provider answered with a non-success status.
    #[error("provider rejected the message ({status}): {text}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Body text returned by the provider.
        text: String,
    },
    /// The request never produced a response.
    #[error("transport error: {message}")]
    Transport {
        /// Underlying client error.
        message: String,
    },
    /// No answer within the configured timeout.
    #[error("timed out after {elapsed:?} waiting for the provider")]
    Timeout {
        /// Configured timeout.
        elapsed: Duration,
    },
}

impl ProviderError {
    /// Provider-supplied body text, when there is any.
    pub fn text(&self) -> Option<&str> {
        match self {
            ProviderError::Rejected { text, .. } if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }

    /// HTTP status code, when the provider answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable detail: provider text first, otherwise the error message.
    pub fn detail(&self) -> String {
        self.text()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ProviderError::Rejected {
                status: status.as_u16(),
                text: err.to_string(),
            }
        } else {
            ProviderError::Transport {
                message: err.to_string(),
            }
        }
    }
}

/// The narrow send contract the form depends on.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver one templated message.
    async fn send(
        &self,
        service_id: &str,
        template_id: &str,
        params: &TemplateParams,
    ) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_prefers_provider_text() {
        let err = ProviderError::Rejected {
            status: 400,
            text: "The template ID is invalid".into(),
        };
        assert_eq!(err.detail(), "The template ID is invalid");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_detail_falls_back_to_message() {
        let err = ProviderError::Rejected {
            status: 500,
            text: "  ".into(),
        };
        assert_eq!(err.text(), None);
        assert!(err.detail().contains("500"));
        assert_eq!(ProviderError::NotInitialized.status(), None);
        let timeout = ProviderError::Timeout {
            elapsed: Duration::from_secs(3),
        };
        assert!(timeout.detail().contains("3s"));
    }
}
