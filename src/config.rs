//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Placeholder shipped in the default config; treated as "not configured".
pub const PUBLIC_KEY_PLACEHOLDER: &str = "YOUR_PUBLIC_KEY";

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Email provider account and template identifiers.
    pub provider: ProviderCfg,
    /// Business inbox that receives refund requests.
    pub business: BusinessCfg,
    /// Copy and contact details shown in the header/footer.
    pub branding: BrandingCfg,
    /// Signature pad geometry.
    #[serde(default)]
    pub signature: SignatureCfg,
}

/// EmailJS account settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCfg {
    /// Public key passed as `user_id`.
    pub public_key: String,
    /// Optional private key sent as `accessToken` (strict mode accounts).
    #[serde(default)]
    pub private_key: String,
    /// Email service id.
    pub service_id: String,
    /// Template for the refund request sent to the business inbox.
    pub request_template_id: String,
    /// Template for the customer confirmation.
    pub confirmation_template_id: String,
    /// Template used by the admin test send.
    pub test_template_id: String,
    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Upper bound for the primary send.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Receiving side of refund requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessCfg {
    /// Inbox address placed in `to_email`.
    pub to_email: String,
}

/// Branding for the single presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandingCfg {
    /// Company name in the header.
    pub company_name: String,
    /// Header tagline.
    pub tagline: String,
    /// Support phone shown in the header.
    pub support_phone: String,
    /// Support email shown in the header.
    pub support_email: String,
    /// Form title.
    pub form_title: String,
    /// Form subtitle.
    pub form_subtitle: String,
}

/// Signature surface width in logical units (height is fixed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureCfg {
    pub width: u16,
}

fn default_api_url() -> String {
    "https://api.emailjs.com".into()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SignatureCfg {
    fn default() -> Self {
        Self { width: 600 }
    }
}

impl ProviderCfg {
    /// True when a real public key and service id are present.
    pub fn is_configured(&self) -> bool {
        let key = self.public_key.trim();
        !key.is_empty() && key != PUBLIC_KEY_PLACEHOLDER && !self.service_id.trim().is_empty()
    }
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }
}

impl Default for Config {
    /// Defaults match the template names described in the admin guide.
    fn default() -> Self {
        Self {
            provider: ProviderCfg {
                public_key: PUBLIC_KEY_PLACEHOLDER.into(),
                private_key: "".into(),
                service_id: "service_wanderways".into(),
                request_template_id: "template_refund_request".into(),
                confirmation_template_id: "template_customer_confirmation".into(),
                test_template_id: "template_refund_request".into(),
                api_url: default_api_url(),
                timeout_secs: default_timeout_secs(),
            },
            business: BusinessCfg {
                to_email: "support@wanderways.com".into(),
            },
            branding: BrandingCfg {
                company_name: "WanderWays Travel".into(),
                tagline: "Your Journey, Our Priority".into(),
                support_phone: "1-800-WANDER-1".into(),
                support_email: "support@wanderways.com".into(),
                form_title: "Refund Request".into(),
                form_subtitle:
                    "We're here to help process your refund request quickly and efficiently".into(),
            },
            signature: SignatureCfg::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_configured() {
        assert!(!Config::default().provider.is_configured());
    }

    #[test]
    fn test_toml_round_trip_and_defaults() {
        // Optional keys fall back to their defaults when omitted.
        let mut cfg = Config::default();
        cfg.provider.public_key = "pk_live".into();
        let s = toml::to_string_pretty(&cfg).expect("serialize");
        let back: Config = toml::from_str(&s).expect("parse");
        assert_eq!(back, cfg);
        assert!(back.provider.is_configured());

        let trimmed = s
            .lines()
            .filter(|l| !l.starts_with("api_url") && !l.starts_with("timeout_secs"))
            .collect::<Vec<_>>()
            .join("\n");
        let back: Config = toml::from_str(&trimmed).expect("parse trimmed");
        assert_eq!(back.provider.api_url, "https://api.emailjs.com");
        assert_eq!(back.provider.timeout_secs, 30);
    }

    #[test]
    fn test_load_or_default_writes_file() {
        let path =
            std::env::temp_dir().join(format!("refund_tui_cfg_{}.toml", uuid::Uuid::new_v4()));
        let cfg = Config::load_or_default(&path).expect("load");
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
        let again = Config::load_or_default(&path).expect("reload");
        assert_eq!(again, cfg);
        let _ = fs::remove_file(&path);
    }
}
