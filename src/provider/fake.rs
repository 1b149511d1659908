//! In-memory provider that records sends and replays scripted outcomes.

use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use super::{EmailProvider, ProviderError, ProviderResponse, TemplateParams};

/// One recorded call.
#[derive(Clone, Debug)]
pub struct SentMessage {
    pub service_id: String,
    pub template_id: String,
    pub params: TemplateParams,
}

/// Scripted outcome for the next call.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// Accept with `200 OK`.
    Accept,
    /// Reject with the given status and body.
    Reject(u16, String),
    /// Sleep before accepting (used to trip timeouts).
    Hang(Duration),
}

/// Fake provider; unscripted calls are accepted.
#[derive(Clone, Debug, Default)]
pub struct FakeProvider {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    script: Arc<Mutex<VecDeque<Outcome>>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes in call order.
    pub fn with_script(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        let fake = Self::default();
        fake.script.lock().expect("script lock").extend(outcomes);
        fake
    }

    /// Snapshot of everything sent so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().expect("sent lock").clone()
    }
}

#[async_trait]
impl EmailProvider for FakeProvider {
    async fn send(
        &self,
        service_id: &str,
        template_id: &str,
        params: &TemplateParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.sent.lock().expect("sent lock").push(SentMessage {
            service_id: service_id.to_string(),
            template_id: template_id.to_string(),
            params: params.clone(),
        });
        let next = self.script.lock().expect("script lock").pop_front();
        match next.unwrap_or(Outcome::Accept) {
            Outcome::Accept => Ok(ProviderResponse {
                status: 200,
                text: "OK".into(),
            }),
            Outcome::Reject(status, text) => Err(ProviderError::Rejected { status, text }),
            Outcome::Hang(d) => {
                tokio::time::sleep(d).await;
                Ok(ProviderResponse {
                    status: 200,
                    text: "OK".into(),
                })
            }
        }
    }
}
