//! 管理画面：設定ガイド、設定編集バッファ、テスト送信パネル。

use anyhow::Result;

use crate::{
    config::{Config, PUBLIC_KEY_PLACEHOLDER},
    mailer::{confirmation_template_variables, request_template_variables},
};

/// EmailJSダッシュボードのURL。
pub const DASHBOARD_URL: &str = "https://dashboard.emailjs.com/admin";

/// テスト失敗時に示すよくある原因。
pub const COMMON_ISSUES: [&str; 5] = [
    "Invalid Service ID or Template ID",
    "Template variables don't match",
    "EmailJS service is not active",
    "Public key is incorrect",
    "Email service provider authentication failed",
];

/// テスト送信パネルの状態。
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum TestPanel {
    #[default]
    Idle,
    /// 送信中（ボタン無効）。
    Testing,
    /// 成功（プロバイダ応答付き）。
    Passed(String),
    /// 失敗（プロバイダの詳細付き）。
    Failed { error: String },
}

impl TestPanel {
    /// パネルに表示する行。
    pub fn lines(&self) -> Vec<String> {
        match self {
            TestPanel::Idle => vec!["Use this panel to test your EmailJS configuration.".into()],
            TestPanel::Testing => vec!["Testing...".into()],
            TestPanel::Passed(resp) => vec![
                "Test Successful!".into(),
                "EmailJS is configured correctly and can send emails.".into(),
                format!("Provider answered: {resp}"),
            ],
            TestPanel::Failed { error } => {
                let error = if error.trim().is_empty() {
                    "Unknown error"
                } else {
                    error.as_str()
                };
                let mut lines = vec![
                    "Test Failed".to_string(),
                    format!("Error: {error}"),
                    String::new(),
                    "Common issues:".to_string(),
                ];
                lines.extend(COMMON_ISSUES.iter().map(|s| format!("  • {s}")));
                lines
            }
        }
    }
}

/// 管理画面で編集できる設定項目。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsField {
    PublicKey,
    PrivateKey,
    ServiceId,
    RequestTemplate,
    ConfirmationTemplate,
    TestTemplate,
    BusinessEmail,
}

impl SettingsField {
    /// 表示順。
    pub const ALL: [SettingsField; 7] = [
        SettingsField::PublicKey,
        SettingsField::PrivateKey,
        SettingsField::ServiceId,
        SettingsField::RequestTemplate,
        SettingsField::ConfirmationTemplate,
        SettingsField::TestTemplate,
        SettingsField::BusinessEmail,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::PublicKey => "Public key",
            SettingsField::PrivateKey => "Private key",
            SettingsField::ServiceId => "Service ID",
            SettingsField::RequestTemplate => "Request template ID",
            SettingsField::ConfirmationTemplate => "Confirmation template ID",
            SettingsField::TestTemplate => "Test template ID",
            SettingsField::BusinessEmail => "Business inbox",
        }
    }

    /// 秘密値は画面上で伏せる。
    pub fn is_secret(self) -> bool {
        self == SettingsField::PrivateKey
    }
}

/// 設定編集用のバッファ。保存するまでConfigへは反映しない。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsDraft {
    pub public_key: String,
    pub private_key: String,
    pub service_id: String,
    pub request_template_id: String,
    pub confirmation_template_id: String,
    pub test_template_id: String,
    pub to_email: String,
}

impl SettingsDraft {
    /// 現在の設定値からバッファを作る。
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            public_key: cfg.provider.public_key.clone(),
            private_key: cfg.provider.private_key.clone(),
            service_id: cfg.provider.service_id.clone(),
            request_template_id: cfg.provider.request_template_id.clone(),
            confirmation_template_id: cfg.provider.confirmation_template_id.clone(),
            test_template_id: cfg.provider.test_template_id.clone(),
            to_email: cfg.business.to_email.clone(),
        }
    }

    pub fn get(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::PublicKey => &self.public_key,
            SettingsField::PrivateKey => &self.private_key,
            SettingsField::ServiceId => &self.service_id,
            SettingsField::RequestTemplate => &self.request_template_id,
            SettingsField::ConfirmationTemplate => &self.confirmation_template_id,
            SettingsField::TestTemplate => &self.test_template_id,
            SettingsField::BusinessEmail => &self.to_email,
        }
    }

    /// 前後の空白は落として保持する。
    pub fn set(&mut self, field: SettingsField, value: String) {
        let value = value.trim().to_string();
        let slot = match field {
            SettingsField::PublicKey => &mut self.public_key,
            SettingsField::PrivateKey => &mut self.private_key,
            SettingsField::ServiceId => &mut self.service_id,
            SettingsField::RequestTemplate => &mut self.request_template_id,
            SettingsField::ConfirmationTemplate => &mut self.confirmation_template_id,
            SettingsField::TestTemplate => &mut self.test_template_id,
            SettingsField::BusinessEmail => &mut self.to_email,
        };
        *slot = value;
    }

    /// バッファの内容をConfigへ書き戻す。
    pub fn apply(&self, cfg: &mut Config) {
        cfg.provider.public_key = self.public_key.clone();
        cfg.provider.private_key = self.private_key.clone();
        cfg.provider.service_id = self.service_id.clone();
        cfg.provider.request_template_id = self.request_template_id.clone();
        cfg.provider.confirmation_template_id = self.confirmation_template_id.clone();
        cfg.provider.test_template_id = self.test_template_id.clone();
        cfg.business.to_email = self.to_email.clone();
    }

    /// 表示用の値（秘密値は末尾4文字以外を伏せる）。
    pub fn display(&self, field: SettingsField) -> String {
        let v = self.get(field);
        if v.is_empty() {
            return "(not set)".into();
        }
        if field.is_secret() {
            let n = v.chars().count();
            let tail: String = v.chars().skip(n.saturating_sub(4)).collect();
            return format!("{}{}", "*".repeat(n.saturating_sub(4)), tail);
        }
        v.to_string()
    }
}

/// 管理画面の状態。
#[derive(Clone, Debug)]
pub struct AdminState {
    /// 編集バッファ。
    pub draft: SettingsDraft,
    /// 選択中の設定項目。
    pub selected: usize,
    /// テスト送信パネル。
    pub test: TestPanel,
}

impl AdminState {
    pub fn new(cfg: &Config) -> Self {
        Self {
            draft: SettingsDraft::from_config(cfg),
            selected: 0,
            test: TestPanel::default(),
        }
    }

    pub fn selected_field(&self) -> SettingsField {
        SettingsField::ALL[self.selected % SettingsField::ALL.len()]
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % SettingsField::ALL.len();
    }

    pub fn select_prev(&mut self) {
        let n = SettingsField::ALL.len();
        self.selected = (self.selected + n - 1) % n;
    }

    /// 編集を破棄して設定値から読み直す。
    pub fn reload(&mut self, cfg: &Config) {
        self.draft = SettingsDraft::from_config(cfg);
    }

    /// テスト開始。送信中なら何もせずfalse。
    pub fn begin_test(&mut self) -> bool {
        if self.test == TestPanel::Testing {
            return false;
        }
        self.test = TestPanel::Testing;
        true
    }

    /// テスト結果を反映する。
    pub fn finish_test(&mut self, res: Result<String, String>) {
        self.test = match res {
            Ok(resp) => TestPanel::Passed(resp),
            Err(error) => TestPanel::Failed { error },
        };
    }
}

/// 現在の設定から設定ガイドを組み立てる。
pub fn config_guide(cfg: &Config) -> Vec<String> {
    let p = &cfg.provider;
    let key_state = if p.is_configured() {
        "configured"
    } else if p.public_key.trim() == PUBLIC_KEY_PLACEHOLDER {
        "still the placeholder"
    } else {
        "missing"
    };
    let mut lines = vec![
        "EmailJS Configuration Guide".to_string(),
        String::new(),
        "1. Create an EmailJS account at https://www.emailjs.com".to_string(),
        format!(
            "2. Add an email service (Gmail, Outlook, ...) with ID `{}`",
            p.service_id
        ),
        format!(
            "3. Create the refund request template `{}` using:",
            p.request_template_id
        ),
    ];
    lines.push(format!("     {}", request_template_variables().join(", ")));
    lines.push(format!(
        "   and the customer confirmation template `{}` using:",
        p.confirmation_template_id
    ));
    lines.push(format!("     {}", confirmation_template_variables().join(", ")));
    lines.push(format!(
        "4. Put your public key into config.toml [provider] (currently {key_state})"
    ));
    lines.push(String::new());
    lines.push(format!("Requests are delivered to {}.", cfg.business.to_email));
    lines.push(
        "After setup, run the test send below, then submit a test refund request and check both inboxes."
            .to_string(),
    );
    lines
}

/// 既定のブラウザでダッシュボードを開く。
pub fn open_dashboard() -> Result<()> {
    tracing::info!("opening {DASHBOARD_URL}");
    webbrowser::open(DASHBOARD_URL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guide_reflects_live_config() {
        let mut cfg = Config::default();
        cfg.provider.service_id = "service_custom".into();
        let guide = config_guide(&cfg);
        assert!(guide.iter().any(|l| l.contains("service_custom")));
        assert!(guide.iter().any(|l| l.contains("placeholder")));
        assert!(guide.iter().any(|l| l.contains("refund_reason")));

        cfg.provider.public_key = "pk_live".into();
        assert!(config_guide(&cfg).iter().any(|l| l.contains("(currently configured)")));
    }

    #[test]
    fn test_draft_apply_round_trip() {
        let mut cfg = Config::default();
        let mut admin = AdminState::new(&cfg);
        admin.draft.set(SettingsField::PublicKey, "  pk_123 ".into());
        admin.draft.set(SettingsField::BusinessEmail, "ops@example.com".into());
        admin.draft.apply(&mut cfg);
        assert_eq!(cfg.provider.public_key, "pk_123");
        assert_eq!(cfg.business.to_email, "ops@example.com");

        admin.draft.set(SettingsField::ServiceId, "other".into());
        admin.reload(&cfg);
        assert_eq!(admin.draft.service_id, cfg.provider.service_id);
    }

    #[test]
    fn test_secret_is_masked() {
        let mut draft = SettingsDraft::from_config(&Config::default());
        draft.set(SettingsField::PrivateKey, "secret1234".into());
        assert_eq!(draft.display(SettingsField::PrivateKey), "******1234");
        draft.set(SettingsField::PrivateKey, String::new());
        assert_eq!(draft.display(SettingsField::PrivateKey), "(not set)");
    }

    #[test]
    fn test_panel_flow() {
        let mut admin = AdminState::new(&Config::default());
        assert!(admin.begin_test());
        assert!(!admin.begin_test());
        admin.finish_test(Err("The Public Key is invalid".into()));
        let lines = admin.test.lines();
        assert_eq!(lines[0], "Test Failed");
        assert!(lines.iter().any(|l| l.contains("Public key is incorrect")));
        assert!(admin.begin_test());
        admin.finish_test(Ok("200 OK".into()));
        assert!(matches!(admin.test, TestPanel::Passed(_)));
    }

    #[test]
    fn test_selection_wraps() {
        let mut admin = AdminState::new(&Config::default());
        admin.select_prev();
        assert_eq!(admin.selected_field(), SettingsField::BusinessEmail);
        admin.select_next();
        assert_eq!(admin.selected_field(), SettingsField::PublicKey);
    }
}
