//! 送信状態機械とフォームセッション。

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::refund::{
    FieldKey, RefundMethod, RefundRequest, ValidationErrors, methods::is_method_field, validate,
};
use crate::signature;

/// 送信失敗時の定型文（前半）。
const FAILURE_HEAD: &str = "There was a problem submitting your request.";
/// 送信失敗時の定型文（後半）。
const FAILURE_TAIL: &str = "Please try again or contact support directly.";

/// 送信の進行状態。
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum SubmissionState {
    /// 入力中（初期状態）。
    #[default]
    Idle,
    /// 送信中。送信トリガーは無効。
    Submitting,
    /// 主送信が成功した。
    Succeeded,
    /// 主送信が失敗した。メッセージは編集で消える。
    Failed { message: Option<String> },
}

/// 状態遷移を引き起こす出来事。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitEvent {
    /// 送信が要求された（検証結果付き）。
    Submit { valid: bool },
    /// 主送信が成功した。
    PrimarySucceeded,
    /// 主送信が失敗した。
    PrimaryFailed(String),
    /// いずれかの項目が編集された。
    FieldEdited,
    /// 結果モーダルが閉じられた。
    ModalDismissed,
}

impl SubmissionState {
    /// 明示的な遷移関数。想定外の組み合わせでは状態を変えない。
    pub fn on(&self, event: &SubmitEvent) -> SubmissionState {
        use SubmissionState::*;
        match (self, event) {
            (Idle | Failed { .. }, SubmitEvent::Submit { valid: true }) => Submitting,
            (Submitting, SubmitEvent::PrimarySucceeded) => Succeeded,
            (Submitting, SubmitEvent::PrimaryFailed(msg)) => Failed {
                message: Some(msg.clone()),
            },
            (Failed { .. }, SubmitEvent::FieldEdited) => Failed { message: None },
            (Succeeded, SubmitEvent::ModalDismissed) => Idle,
            (state, _) => state.clone(),
        }
    }

    /// 送信トリガーを受け付けるか。
    pub fn can_submit(&self) -> bool {
        matches!(self, SubmissionState::Idle | SubmissionState::Failed { .. })
    }

    /// 表示中のエラーメッセージ。
    pub fn error_message(&self) -> Option<&str> {
        match self {
            SubmissionState::Failed { message } => message.as_deref(),
            _ => None,
        }
    }

    /// ステータスバー用の短いラベル。
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionState::Idle | SubmissionState::Failed { message: None } => "Ready",
            SubmissionState::Submitting => "Processing...",
            SubmissionState::Succeeded => "Submitted",
            SubmissionState::Failed { message: Some(_) } => "Send failed",
        }
    }
}

/// 送信1回分のスナップショット。Workerへ渡す。
#[derive(Clone, Debug)]
pub struct Submission {
    /// 受付番号。
    pub reference: Uuid,
    /// 受付日時。
    pub submitted_at: DateTime<Local>,
    /// 送信時点の入力値。
    pub request: RefundRequest,
}

/// 成功時に結果モーダルへ渡す情報。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub reference: Uuid,
    pub submitted_at: String,
    pub customer_email: String,
    pub method: Option<RefundMethod>,
    pub signature_fingerprint: String,
}

/// 主送信の失敗理由から利用者向けメッセージを組み立てる。
pub fn failure_message(detail: Option<&str>) -> String {
    match detail.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => format!("{FAILURE_HEAD} ({d}) {FAILURE_TAIL}"),
        None => format!("{FAILURE_HEAD} {FAILURE_TAIL}"),
    }
}

/// 1画面ぶんのフォーム状態（入力値・検証結果・送信状態）。
#[derive(Clone, Debug, Default)]
pub struct FormSession {
    request: RefundRequest,
    errors: ValidationErrors,
    state: SubmissionState,
    /// 送信中・成功後のスナップショット。
    in_flight: Option<Submission>,
}

impl FormSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) -> &RefundRequest {
        &self.request
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// 項目のエラーメッセージ。
    pub fn error_for(&self, key: FieldKey) -> Option<&str> {
        self.errors.get(&key).map(String::as_str)
    }

    /// 編集共通処理：項目エラーと送信エラー表示を消す。
    fn edited(&mut self, key: FieldKey) {
        self.errors.remove(&key);
        self.transition(SubmitEvent::FieldEdited);
    }

    fn transition(&mut self, event: SubmitEvent) {
        let next = self.state.on(&event);
        if next != self.state {
            tracing::debug!("submission state {:?} -> {:?} on {:?}", self.state, next, event);
        }
        self.state = next;
    }

    /// テキスト項目を更新する。
    pub fn set_text(&mut self, key: FieldKey, value: String) {
        if self.request.set_text(key, value) {
            self.edited(key);
        }
    }

    /// 受け取り方法を選ぶ。以前の方法の入力値は残すが、そのエラーは消す。
    pub fn select_method(&mut self, method: RefundMethod) {
        self.request.refund_method = Some(method);
        self.errors.retain(|k, _| !is_method_field(*k));
        self.edited(FieldKey::RefundMethod);
    }

    /// 署名パッドからの報告値を反映する。
    pub fn set_signature(&mut self, data_uri: String) {
        self.request.signature = data_uri;
        self.edited(FieldKey::Signature);
    }

    /// 規約同意を切り替える。
    pub fn set_agree(&mut self, agree: bool) {
        self.request.agree_to_terms = agree;
        self.edited(FieldKey::AgreeToTerms);
    }

    /// 送信を開始する。検証を通ればスナップショットを返しSubmittingへ。
    ///
    /// 送信中の再要求は何もしない。検証エラー時は状態を変えずNoneを返す。
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if !self.state.can_submit() {
            tracing::debug!("submit ignored in state {:?}", self.state);
            return None;
        }
        // 毎回ゼロから検証し直す。
        self.errors = validate(&self.request);
        let valid = self.errors.is_empty();
        self.transition(SubmitEvent::Submit { valid });
        if !valid {
            tracing::info!("submit blocked by {} validation errors", self.errors.len());
            return None;
        }
        let submission = Submission {
            reference: Uuid::new_v4(),
            submitted_at: Local::now(),
            request: self.request.clone(),
        };
        tracing::info!(
            "submission {} started (method {})",
            submission.reference,
            submission.request.refund_method.map_or("none", RefundMethod::token)
        );
        self.in_flight = Some(submission.clone());
        Some(submission)
    }

    /// 主送信の結果を反映する。Errは利用者向けメッセージ。
    pub fn finish_submit(&mut self, outcome: Result<(), String>) {
        if self.state != SubmissionState::Submitting {
            tracing::warn!("submit result ignored in state {:?}", self.state);
            return;
        }
        match outcome {
            Ok(()) => self.transition(SubmitEvent::PrimarySucceeded),
            Err(message) => {
                self.in_flight = None;
                self.transition(SubmitEvent::PrimaryFailed(message));
            }
        }
    }

    /// 成功時の控え情報。
    pub fn receipt(&self) -> Option<Receipt> {
        if self.state != SubmissionState::Succeeded {
            return None;
        }
        let sub = self.in_flight.as_ref()?;
        Some(Receipt {
            reference: sub.reference,
            submitted_at: sub.submitted_at.format("%Y-%m-%d %H:%M").to_string(),
            customer_email: sub.request.email.clone(),
            method: sub.request.refund_method,
            signature_fingerprint: signature::fingerprint(&sub.request.signature),
        })
    }

    /// 結果モーダルを閉じる。成功後ならフォームを空に戻す。
    pub fn dismiss_result(&mut self) -> bool {
        if self.state != SubmissionState::Succeeded {
            return false;
        }
        self.transition(SubmitEvent::ModalDismissed);
        self.request = RefundRequest::default();
        self.errors.clear();
        self.in_flight = None;
        true
    }
}
