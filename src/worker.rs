//! Background worker that owns the mailer and performs provider calls.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::{
    config::Config,
    mailer::{Mailer, MailerCfg},
    provider::emailjs::EmailJsClient,
    submission::{Submission, failure_message},
};

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Deliver a validated refund request.
    Submit(Submission),
    /// Admin diagnostic send.
    SendTest,
    /// Re-initialize the provider from updated settings.
    ApplySettings(Config),
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    /// Primary send finished; `Err` carries the user-facing message.
    SubmitFinished(Result<(), String>),
    /// Diagnostic send finished; `Err` carries the provider detail.
    TestFinished(Result<String, String>),
    /// Informational log message.
    Log(String),
}

/// Build a mailer backed by a freshly initialized EmailJS client.
pub fn emailjs_mailer(cfg: &Config) -> Mailer {
    let client = EmailJsClient::init(&cfg.provider);
    Mailer::new(Arc::new(client), MailerCfg::from(cfg))
}

/// Main worker loop: handle commands sequentially.
pub async fn run(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    mut mailer: Mailer,
) {
    tracing::info!("worker started");

    // Process commands one at a time so a form never has two primary sends in flight.
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WorkerCmd::ApplySettings(cfg) => {
                tracing::info!("settings updated, re-initializing provider");
                let client = EmailJsClient::init(&cfg.provider);
                let line = if client.is_ready() {
                    "settings updated, provider ready"
                } else {
                    "settings updated, provider not configured"
                };
                mailer = Mailer::new(Arc::new(client), MailerCfg::from(&cfg));
                let _ = tx.send(WorkerEvent::Log(line.into())).await;
            }

            WorkerCmd::Submit(sub) => {
                let reference = sub.reference;
                tracing::info!("submit start: {reference}");
                let delivery = mailer.deliver(sub).await;

                let outcome = delivery
                    .primary
                    .map(|_| ())
                    .map_err(|e| failure_message(Some(&e.detail())));
                let ok = outcome.is_ok();
                let _ = tx.send(WorkerEvent::SubmitFinished(outcome)).await;
                if ok {
                    let _ = tx
                        .send(WorkerEvent::Log(format!("request {reference} sent")))
                        .await;
                }

                // Watch the confirmation without holding up the next command.
                if let Some(handle) = delivery.confirmation {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let line = match handle.await {
                            Ok(Ok(_)) => format!("confirmation for {reference} sent"),
                            Ok(Err(e)) => format!("confirmation for {reference} failed: {e}"),
                            Err(e) => format!("confirmation task for {reference} aborted: {e}"),
                        };
                        let _ = tx.send(WorkerEvent::Log(line)).await;
                    });
                }
            }

            WorkerCmd::SendTest => {
                tracing::info!("diagnostic send start");
                let res = mailer.send_test().await;
                let ev = match res {
                    Ok(resp) => {
                        tracing::info!("diagnostic send ok ({})", resp.status);
                        WorkerEvent::TestFinished(Ok(format!("{} {}", resp.status, resp.text)))
                    }
                    Err(e) => {
                        match e.status() {
                            Some(status) => {
                                tracing::error!("diagnostic send failed ({status}): {e}")
                            }
                            None => tracing::error!("diagnostic send failed: {e}"),
                        }
                        WorkerEvent::TestFinished(Err(e.detail()))
                    }
                };
                let _ = tx.send(ev).await;
            }
        }
    }
    tracing::info!("worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        provider::fake::{FakeProvider, Outcome},
        refund::{FieldKey, RefundMethod},
        submission::{FormSession, SubmissionState},
    };
    use std::time::Duration;

    fn spawn_worker(fake: &FakeProvider) -> (mpsc::Sender<WorkerCmd>, mpsc::Receiver<WorkerEvent>) {
        spawn_worker_with(fake, MailerCfg::from(&Config::default()))
    }

    fn spawn_worker_with(
        fake: &FakeProvider,
        cfg: MailerCfg,
    ) -> (mpsc::Sender<WorkerCmd>, mpsc::Receiver<WorkerEvent>) {
        let (tx_cmd, rx_cmd) = mpsc::channel(8);
        let (tx_ev, rx_ev) = mpsc::channel(32);
        let mailer = Mailer::new(Arc::new(fake.clone()), cfg);
        tokio::spawn(run(rx_cmd, tx_ev, mailer));
        (tx_cmd, rx_ev)
    }

    /// Wait for the next submit result, skipping log lines.
    async fn next_submit(rx: &mut mpsc::Receiver<WorkerEvent>) -> Result<(), String> {
        loop {
            match rx.recv().await.expect("worker alive") {
                WorkerEvent::SubmitFinished(r) => return r,
                _ => continue,
            }
        }
    }

    fn jane_session() -> FormSession {
        let mut s = FormSession::new();
        s.set_text(FieldKey::FullName, "Jane Doe".into());
        s.set_text(FieldKey::BookingNumber, "SG-100".into());
        s.set_text(FieldKey::Email, "jane@x.com".into());
        s.set_text(FieldKey::Phone, "555-0100".into());
        s.set_text(FieldKey::Reason, "Trip cancelled".into());
        s.select_method(RefundMethod::PayPal);
        s.set_text(FieldKey::PaypalName, "Jane Doe".into());
        s.set_text(FieldKey::PaypalEmail, "jane@paypal.com".into());
        s.set_signature("data:image/x-portable-bitmap;base64,AAAA".into());
        s.set_agree(true);
        s
    }

    #[tokio::test]
    async fn test_valid_submission_round_trip() {
        let fake = FakeProvider::new();
        let (tx, mut rx) = spawn_worker(&fake);
        let mut session = jane_session();

        let sub = session.begin_submit().expect("valid");
        assert_eq!(session.state(), &SubmissionState::Submitting);
        tx.send(WorkerCmd::Submit(sub)).await.expect("send");
        session.finish_submit(next_submit(&mut rx).await);
        assert_eq!(session.state(), &SubmissionState::Succeeded);

        let primary = &fake.sent()[0];
        assert_eq!(primary.params["is_paypal"], "true");
        assert_eq!(primary.params["is_venmo"], "false");
        assert_eq!(primary.params["is_check"], "false");
        assert_eq!(primary.params["paypal_email"], "jane@paypal.com");
        assert_eq!(primary.params["mailing_address"], "");

        assert!(session.dismiss_result());
        assert_eq!(session.state(), &SubmissionState::Idle);
        assert!(session.request().full_name.is_empty());
    }

    #[tokio::test]
    async fn test_rejection_becomes_failed_state() {
        let fake = FakeProvider::with_script([Outcome::Reject(412, "Template not found".into())]);
        let (tx, mut rx) = spawn_worker(&fake);
        let mut session = jane_session();

        let sub = session.begin_submit().expect("valid");
        tx.send(WorkerCmd::Submit(sub)).await.expect("send");
        session.finish_submit(next_submit(&mut rx).await);

        let msg = session.state().error_message().expect("message");
        assert!(msg.contains("Template not found"));
        // Only the primary was attempted.
        assert_eq!(fake.sent().len(), 1);

        session.set_text(FieldKey::Reason, "Flight cancelled".into());
        assert_eq!(session.state().error_message(), None);
        assert_eq!(session.request().email, "jane@x.com");
    }

    #[tokio::test]
    async fn test_hung_provider_ends_in_failed_state() {
        let fake = FakeProvider::with_script([Outcome::Hang(Duration::from_secs(5))]);
        let mut cfg = MailerCfg::from(&Config::default());
        cfg.timeout = Duration::from_millis(20);
        let (tx, mut rx) = spawn_worker_with(&fake, cfg);
        let mut session = jane_session();

        let sub = session.begin_submit().expect("valid");
        tx.send(WorkerCmd::Submit(sub)).await.expect("send");
        let outcome = next_submit(&mut rx).await;
        assert!(outcome.is_err());
        session.finish_submit(outcome);

        let msg = session.state().error_message().expect("message");
        assert!(msg.starts_with("There was a problem submitting your request."));
        assert!(msg.contains("timed out"), "{msg}");
        // No confirmation after a failed primary.
        assert_eq!(fake.sent().len(), 1);
        assert_eq!(session.request().full_name, "Jane Doe");
    }

    #[tokio::test]
    async fn test_confirmation_failure_still_succeeds() {
        let fake =
            FakeProvider::with_script([Outcome::Accept, Outcome::Reject(500, "down".into())]);
        let (tx, mut rx) = spawn_worker(&fake);
        let mut session = jane_session();

        let sub = session.begin_submit().expect("valid");
        tx.send(WorkerCmd::Submit(sub)).await.expect("send");
        session.finish_submit(next_submit(&mut rx).await);
        assert_eq!(session.state(), &SubmissionState::Succeeded);

        // The failure only shows up as a log line.
        let mut saw_failure_log = false;
        while let Some(ev) = rx.recv().await {
            if let WorkerEvent::Log(line) = ev
                && line.contains("confirmation")
            {
                saw_failure_log = line.contains("failed");
                break;
            }
        }
        assert!(saw_failure_log);
        assert_eq!(session.state(), &SubmissionState::Succeeded);
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_provider() {
        let fake = FakeProvider::new();
        let (_tx, _rx) = spawn_worker(&fake);
        let mut session = FormSession::new();
        assert!(session.begin_submit().is_none());
        assert!(fake.sent().is_empty());
    }

    #[tokio::test]
    async fn test_diagnostic_send_reports_detail() {
        let fake =
            FakeProvider::with_script([Outcome::Reject(400, "The Public Key is invalid".into())]);
        let (tx, mut rx) = spawn_worker(&fake);
        tx.send(WorkerCmd::SendTest).await.expect("send");
        match rx.recv().await.expect("event") {
            WorkerEvent::TestFinished(Err(detail)) => {
                assert_eq!(detail, "The Public Key is invalid")
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
