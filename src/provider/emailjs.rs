//! EmailJS REST API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{EmailProvider, ProviderError, ProviderResponse, TemplateParams};
use crate::config::ProviderCfg;

/// Send endpoint path under the API base URL.
const SEND_PATH: &str = "/api/v1.0/email/send";

/// Provider handle created once at startup and shared with the worker.
#[derive(Clone, Debug)]
pub struct EmailJsClient {
    /// Shared HTTP client for all sends.
    http: Client,
    /// API base URL (overridable for tests).
    api_url: String,
    /// Public key; `None` when init did not get a usable key.
    public_key: Option<String>,
    /// Optional private key for strict-mode accounts.
    access_token: Option<String>,
}

/// Request body for `POST /api/v1.0/email/send`.
#[derive(Debug, Serialize)]
struct SendReq<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a TemplateParams,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
}

impl EmailJsClient {
    /// One-time setup. A missing key is logged, not fatal; sends will fail later.
    pub fn init(cfg: &ProviderCfg) -> Self {
        let public_key = if cfg.is_configured() {
            tracing::info!("email provider initialized (service {})", cfg.service_id);
            Some(cfg.public_key.trim().to_string())
        } else {
            tracing::warn!("email provider init skipped: public key or service id missing");
            None
        };
        let access_token = Some(cfg.private_key.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        Self {
            http: Client::new(),
            api_url: cfg.api_url.trim_end_matches('/').to_string(),
            public_key,
            access_token,
        }
    }

    /// Whether init produced a usable key.
    pub fn is_ready(&self) -> bool {
        self.public_key.is_some()
    }
}

#[async_trait]
impl EmailProvider for EmailJsClient {
    async fn send(
        &self,
        service_id: &str,
        template_id: &str,
        params: &TemplateParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let Some(user_id) = self.public_key.as_deref() else {
            return Err(ProviderError::NotInitialized);
        };
        let body = SendReq {
            service_id,
            template_id,
            user_id,
            template_params: params,
            access_token: self.access_token.as_deref(),
        };
        let url = format!("{}{}", self.api_url, SEND_PATH);
        tracing::debug!("POST {url} template={template_id}");

        let resp = self.http.post(url).json(&body).send().await?;
        ensure_success(resp).await
    }
}

/// Convert non-2xx responses into a structured error.
async fn ensure_success(resp: reqwest::Response) -> Result<ProviderResponse, ProviderError> {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_else(|_| "".into());
    if status.is_success() {
        return Ok(ProviderResponse {
            status: status.as_u16(),
            text,
        });
    }
    Err(ProviderError::Rejected {
        status: status.as_u16(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use mockito::Matcher;

    fn cfg_for(url: &str, public_key: &str) -> ProviderCfg {
        let mut cfg = Config::default().provider;
        cfg.api_url = url.to_string();
        cfg.public_key = public_key.to_string();
        cfg
    }

    fn params() -> TemplateParams {
        TemplateParams::from([("from_name".to_string(), "Jane Doe".to_string())])
    }

    #[tokio::test]
    async fn test_send_posts_template_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1.0/email/send")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "service_id": "service_wanderways",
                "template_id": "template_refund_request",
                "user_id": "pk_test",
                "template_params": { "from_name": "Jane Doe" }
            })))
            .with_status(200)
            .with_body("OK")
            .create_async()
            .await;

        let client = EmailJsClient::init(&cfg_for(&server.url(), "pk_test"));
        assert!(client.is_ready());
        let resp = client
            .send("service_wanderways", "template_refund_request", &params())
            .await
            .expect("send should succeed");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.text, "OK");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejection_carries_provider_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1.0/email/send")
            .with_status(400)
            .with_body("The template ID is invalid")
            .create_async()
            .await;

        let client = EmailJsClient::init(&cfg_for(&server.url(), "pk_test"));
        let err = client
            .send("service_wanderways", "nope", &params())
            .await
            .expect_err("send should fail");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.text(), Some("The template ID is invalid"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_uninitialized_client_never_calls_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1.0/email/send")
            .expect(0)
            .create_async()
            .await;

        let client = EmailJsClient::init(&cfg_for(&server.url(), "YOUR_PUBLIC_KEY"));
        assert!(!client.is_ready());
        let err = client
            .send("service_wanderways", "template_refund_request", &params())
            .await
            .expect_err("send should fail");
        assert!(matches!(err, ProviderError::NotInitialized));
        mock.assert_async().await;
    }
}
