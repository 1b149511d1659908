//! Builds template params for each message type and drives the provider.

use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

use crate::{
    config::Config,
    provider::{EmailProvider, ProviderError, ProviderResponse, TemplateParams},
    refund::{RefundMethod, RefundRequest},
    submission::Submission,
};

/// Provider ids and addresses needed to send the three message types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailerCfg {
    pub service_id: String,
    pub request_template_id: String,
    pub confirmation_template_id: String,
    pub test_template_id: String,
    /// Business inbox.
    pub to_email: String,
    /// Bound on each primary send.
    pub timeout: Duration,
}

impl From<&Config> for MailerCfg {
    fn from(cfg: &Config) -> Self {
        Self {
            service_id: cfg.provider.service_id.clone(),
            request_template_id: cfg.provider.request_template_id.clone(),
            confirmation_template_id: cfg.provider.confirmation_template_id.clone(),
            test_template_id: cfg.provider.test_template_id.clone(),
            to_email: cfg.business.to_email.clone(),
            timeout: Duration::from_secs(cfg.provider.timeout_secs.max(1)),
        }
    }
}

/// Result of a refund delivery: the primary outcome plus the detached confirmation.
#[derive(Debug)]
pub struct Delivery {
    /// Refund request sent to the business inbox.
    pub primary: Result<ProviderResponse, ProviderError>,
    /// Confirmation task, present only after primary success.
    pub confirmation: Option<JoinHandle<Result<ProviderResponse, ProviderError>>>,
}

/// Sends refund mail through an injected provider.
#[derive(Clone)]
pub struct Mailer {
    provider: Arc<dyn EmailProvider>,
    cfg: MailerCfg,
}

impl Mailer {
    pub fn new(provider: Arc<dyn EmailProvider>, cfg: MailerCfg) -> Self {
        Self { provider, cfg }
    }

    /// Send one message, bounded by the configured timeout.
    async fn send_bounded(
        &self,
        template_id: &str,
        params: &TemplateParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let fut = self.provider.send(&self.cfg.service_id, template_id, params);
        match tokio::time::timeout(self.cfg.timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(ProviderError::Timeout {
                elapsed: self.cfg.timeout,
            }),
        }
    }

    /// Primary send: refund request to the business inbox.
    pub async fn send_refund_request(
        &self,
        sub: &Submission,
    ) -> Result<ProviderResponse, ProviderError> {
        let params = refund_request_params(sub, &self.cfg.to_email);
        self.send_bounded(&self.cfg.request_template_id, &params).await
    }

    /// Confirmation to the customer.
    pub async fn send_confirmation(
        &self,
        sub: &Submission,
    ) -> Result<ProviderResponse, ProviderError> {
        let params = confirmation_params(sub);
        self.send_bounded(&self.cfg.confirmation_template_id, &params).await
    }

    /// Admin diagnostic send with fixed params.
    pub async fn send_test(&self) -> Result<ProviderResponse, ProviderError> {
        let params = test_params(&self.cfg.to_email);
        self.send_bounded(&self.cfg.test_template_id, &params).await
    }

    /// Primary send, then a fire-and-forget confirmation on success.
    ///
    /// The confirmation runs as a detached task; its failure is logged there and
    /// never folded into `primary`.
    pub async fn deliver(&self, sub: Submission) -> Delivery {
        let primary = self.send_refund_request(&sub).await;
        let confirmation = match &primary {
            Ok(resp) => {
                tracing::info!("refund request {} accepted ({})", sub.reference, resp.status);
                let mailer = self.clone();
                Some(tokio::spawn(async move {
                    let res = mailer.send_confirmation(&sub).await;
                    match &res {
                        Ok(_) => tracing::info!("confirmation for {} sent", sub.reference),
                        Err(e) => {
                            tracing::warn!("confirmation for {} failed: {e}", sub.reference)
                        }
                    }
                    res
                }))
            }
            Err(e) => {
                tracing::error!("refund request {} failed: {e}", sub.reference);
                None
            }
        };
        Delivery {
            primary,
            confirmation,
        }
    }
}

fn flag(on: bool) -> String {
    let v = if on { "true" } else { "false" };
    v.to_string()
}

/// One-line summary of where the refund should go.
pub fn payment_summary(request: &RefundRequest) -> String {
    match request.refund_method {
        Some(RefundMethod::PayPal) => format!(
            "PayPal: {} ({})",
            request.paypal_name.trim(),
            request.paypal_email.trim()
        ),
        Some(RefundMethod::Venmo) => {
            let handle = request.venmo_handle.trim();
            let handle = if handle.starts_with('@') {
                handle.to_string()
            } else {
                format!("@{handle}")
            };
            format!("Venmo: {} ({})", request.venmo_name.trim(), handle)
        }
        Some(RefundMethod::Check) => format!(
            "Company Check mailed to {}, {}, {}, {} {}",
            request.full_name.trim(),
            request.mailing_address.trim(),
            request.city.trim(),
            request.state.trim(),
            request.zip_code.trim()
        ),
        None => String::new(),
    }
}

/// Params shared by the business notification and the customer confirmation.
fn common_params(sub: &Submission) -> TemplateParams {
    let r = &sub.request;
    let method = r.refund_method;
    // Payload fields of non-selected methods go out empty, never omitted.
    let pick = |m: RefundMethod, v: &str| {
        if method == Some(m) {
            v.trim().to_string()
        } else {
            String::new()
        }
    };
    let pairs = [
        ("from_name", r.full_name.trim().to_string()),
        ("from_email", r.email.trim().to_string()),
        ("booking_number", r.booking_number.trim().to_string()),
        ("phone_number", r.phone.trim().to_string()),
        (
            "refund_method",
            method.map(|m| m.label().to_string()).unwrap_or_default(),
        ),
        (
            "signature_status",
            if r.has_signature() { "Provided" } else { "Not provided" }.to_string(),
        ),
        ("paypal_name", pick(RefundMethod::PayPal, &r.paypal_name)),
        ("paypal_email", pick(RefundMethod::PayPal, &r.paypal_email)),
        ("venmo_name", pick(RefundMethod::Venmo, &r.venmo_name)),
        ("venmo_handle", pick(RefundMethod::Venmo, &r.venmo_handle)),
        ("mailing_address", pick(RefundMethod::Check, &r.mailing_address)),
        ("city", pick(RefundMethod::Check, &r.city)),
        ("state", pick(RefundMethod::Check, &r.state)),
        ("zip_code", pick(RefundMethod::Check, &r.zip_code)),
        ("is_paypal", flag(method == Some(RefundMethod::PayPal))),
        ("is_venmo", flag(method == Some(RefundMethod::Venmo))),
        ("is_check", flag(method == Some(RefundMethod::Check))),
        ("payment_details", payment_summary(r)),
        ("reference_id", sub.reference.to_string()),
        (
            "submitted_at",
            sub.submitted_at.format("%Y-%m-%d %H:%M %Z").to_string(),
        ),
    ];
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Refund request notification addressed to the business inbox.
pub fn refund_request_params(sub: &Submission, to_email: &str) -> TemplateParams {
    let mut params = common_params(sub);
    params.insert("to_email".into(), to_email.to_string());
    params.insert("refund_reason".into(), sub.request.reason.trim().to_string());
    params
}

/// Customer confirmation: same shape without the reason, addressed to the customer.
pub fn confirmation_params(sub: &Submission) -> TemplateParams {
    let mut params = common_params(sub);
    params.insert("to_name".into(), sub.request.full_name.trim().to_string());
    params.insert("to_email".into(), sub.request.email.trim().to_string());
    params
}

/// Fixed params for the admin diagnostic send.
pub fn test_params(to_email: &str) -> TemplateParams {
    [
        ("to_email", to_email),
        ("from_name", "Test User"),
        ("from_email", "test@example.com"),
        ("booking_number", "TEST-123"),
        ("phone_number", "555-0000"),
        ("refund_reason", "Email configuration test"),
        ("refund_method", "PayPal"),
        ("signature_status", "Not provided"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn empty_submission() -> Submission {
    Submission {
        reference: uuid::Uuid::nil(),
        submitted_at: chrono::Local::now(),
        request: RefundRequest::default(),
    }
}

/// Variables the refund request template can reference (shown in the admin guide).
pub fn request_template_variables() -> Vec<String> {
    refund_request_params(&empty_submission(), "").into_keys().collect()
}

/// Variables available to the confirmation template.
pub fn confirmation_template_variables() -> Vec<String> {
    confirmation_params(&empty_submission()).into_keys().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fake::{FakeProvider, Outcome};

    fn cfg() -> MailerCfg {
        MailerCfg::from(&Config::default())
    }

    fn submission(method: RefundMethod) -> Submission {
        Submission {
            reference: uuid::Uuid::new_v4(),
            submitted_at: chrono::Local::now(),
            request: RefundRequest {
                full_name: "Jane Doe".into(),
                booking_number: "SG-100".into(),
                email: "jane@x.com".into(),
                phone: "555-0100".into(),
                reason: "Trip cancelled".into(),
                refund_method: Some(method),
                paypal_name: "Jane Doe".into(),
                paypal_email: "jane@paypal.com".into(),
                venmo_name: "Jane D".into(),
                venmo_handle: "janed".into(),
                mailing_address: "1 Main St".into(),
                city: "Austin".into(),
                state: "TX".into(),
                zip_code: "78701".into(),
                signature: "data:image/x-portable-bitmap;base64,AAAA".into(),
                agree_to_terms: true,
            },
        }
    }

    #[test]
    fn test_paypal_request_params() {
        let params = refund_request_params(&submission(RefundMethod::PayPal), "ops@example.com");
        assert_eq!(params["is_paypal"], "true");
        assert_eq!(params["is_venmo"], "false");
        assert_eq!(params["is_check"], "false");
        assert_eq!(params["paypal_email"], "jane@paypal.com");
        assert_eq!(params["mailing_address"], "");
        assert_eq!(params["venmo_handle"], "");
        assert_eq!(params["refund_method"], "PayPal");
        assert_eq!(params["signature_status"], "Provided");
        assert_eq!(params["to_email"], "ops@example.com");
        assert_eq!(params["refund_reason"], "Trip cancelled");
        assert_eq!(params["payment_details"], "PayPal: Jane Doe (jane@paypal.com)");
        // Raw signature image never leaves the form.
        assert!(params.values().all(|v| !v.starts_with("data:")));
    }

    #[test]
    fn test_check_params_use_label_and_address() {
        let params = refund_request_params(&submission(RefundMethod::Check), "ops@example.com");
        assert_eq!(params["refund_method"], "Company Check");
        assert_eq!(params["zip_code"], "78701");
        assert_eq!(params["paypal_email"], "");
        assert_eq!(
            params["payment_details"],
            "Company Check mailed to Jane Doe, 1 Main St, Austin, TX 78701"
        );
    }

    #[test]
    fn test_venmo_summary_adds_at_sign() {
        let sub = submission(RefundMethod::Venmo);
        assert_eq!(payment_summary(&sub.request), "Venmo: Jane D (@janed)");
    }

    #[test]
    fn test_confirmation_omits_reason() {
        let sub = submission(RefundMethod::Venmo);
        let params = confirmation_params(&sub);
        assert!(!params.contains_key("refund_reason"));
        assert_eq!(params["to_email"], "jane@x.com");
        assert_eq!(params["to_name"], "Jane Doe");
        assert_eq!(params["venmo_handle"], "janed");
        // Same shape as the business notification apart from the reason and to_name.
        let mut request_keys: Vec<_> = refund_request_params(&sub, "x").into_keys().collect();
        request_keys.retain(|k| k != "refund_reason");
        let mut confirm_keys: Vec<_> = params.into_keys().collect();
        confirm_keys.retain(|k| k != "to_name");
        assert_eq!(request_keys, confirm_keys);
    }

    #[tokio::test]
    async fn test_deliver_sends_primary_then_confirmation() {
        let fake = FakeProvider::new();
        let mailer = Mailer::new(Arc::new(fake.clone()), cfg());
        let delivery = mailer.deliver(submission(RefundMethod::PayPal)).await;
        assert!(delivery.primary.is_ok());
        let confirmation = delivery.confirmation.expect("confirmation spawned");
        assert!(confirmation.await.expect("join").is_ok());

        let sent = fake.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].template_id, "template_refund_request");
        assert_eq!(sent[0].service_id, "service_wanderways");
        assert_eq!(sent[1].template_id, "template_customer_confirmation");
        assert_eq!(sent[1].params["to_email"], "jane@x.com");
    }

    #[tokio::test]
    async fn test_confirmation_failure_does_not_touch_primary() {
        let fake =
            FakeProvider::with_script([Outcome::Accept, Outcome::Reject(500, "down".into())]);
        let mailer = Mailer::new(Arc::new(fake.clone()), cfg());
        let delivery = mailer.deliver(submission(RefundMethod::PayPal)).await;
        assert!(delivery.primary.is_ok());
        let confirmation = delivery.confirmation.expect("confirmation spawned");
        assert!(confirmation.await.expect("join").is_err());
    }

    #[tokio::test]
    async fn test_primary_failure_skips_confirmation() {
        let fake = FakeProvider::with_script([Outcome::Reject(400, "bad template".into())]);
        let mailer = Mailer::new(Arc::new(fake.clone()), cfg());
        let delivery = mailer.deliver(submission(RefundMethod::Check)).await;
        let err = delivery.primary.expect_err("primary fails");
        assert_eq!(err.text(), Some("bad template"));
        assert!(delivery.confirmation.is_none());
        assert_eq!(fake.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_hung_provider_times_out() {
        let fake = FakeProvider::with_script([Outcome::Hang(Duration::from_secs(30))]);
        let mut cfg = cfg();
        cfg.timeout = Duration::from_millis(50);
        let mailer = Mailer::new(Arc::new(fake), cfg);
        let err = mailer
            .send_refund_request(&submission(RefundMethod::PayPal))
            .await
            .expect_err("should time out");
        assert!(matches!(err, ProviderError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_send_test_uses_test_template() {
        let fake = FakeProvider::new();
        let mailer = Mailer::new(Arc::new(fake.clone()), cfg());
        mailer.send_test().await.expect("test send");
        let sent = fake.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].params["booking_number"], "TEST-123");
        assert_eq!(sent[0].params["to_email"], "support@wanderways.com");
    }

    #[test]
    fn test_template_variable_lists() {
        let vars = request_template_variables();
        assert!(vars.contains(&"refund_reason".to_string()));
        assert!(vars.contains(&"is_check".to_string()));
        assert!(!confirmation_template_variables().contains(&"refund_reason".to_string()));
    }
}
