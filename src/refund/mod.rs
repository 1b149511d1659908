//! 返金申請フォームの値オブジェクトとフィールド定義。

pub mod methods;
pub mod validate;

use std::fmt;

pub use methods::{FieldDef, InputKind, method_fields};
pub use validate::{ValidationErrors, validate};

/// 返金の受け取り方法。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefundMethod {
    /// PayPal送金。
    PayPal,
    /// Venmo送金。
    Venmo,
    /// 小切手の郵送。
    Check,
}

impl RefundMethod {
    /// 選択肢として並べる順序。
    pub const ALL: [RefundMethod; 3] = [
        RefundMethod::PayPal,
        RefundMethod::Venmo,
        RefundMethod::Check,
    ];

    /// 内部トークン（`paypal` など）。ログに使う。
    pub fn token(self) -> &'static str {
        match self {
            RefundMethod::PayPal => "paypal",
            RefundMethod::Venmo => "venmo",
            RefundMethod::Check => "check",
        }
    }

    /// 人が読むためのラベル。メール本文にはこちらを使う。
    pub fn label(self) -> &'static str {
        match self {
            RefundMethod::PayPal => "PayPal",
            RefundMethod::Venmo => "Venmo",
            RefundMethod::Check => "Company Check",
        }
    }

    /// 処理期間の目安。
    pub fn description(self) -> &'static str {
        match self {
            RefundMethod::PayPal => "Fastest processing time (3-5 business days)",
            RefundMethod::Venmo => "Quick transfer (3-7 business days)",
            RefundMethod::Check => "Traditional method (10-15 business days)",
        }
    }

    /// 選択肢を循環させる（未選択なら先頭）。
    pub fn cycle(current: Option<Self>, forward: bool) -> Self {
        let len = Self::ALL.len();
        let Some(cur) = current else {
            return if forward { Self::ALL[0] } else { Self::ALL[len - 1] };
        };
        let idx = Self::ALL.iter().position(|m| *m == cur).unwrap_or(0);
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        Self::ALL[next]
    }
}

impl fmt::Display for RefundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// フォーム上のフィールド識別子。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    FullName,
    BookingNumber,
    Email,
    Phone,
    Reason,
    RefundMethod,
    PaypalName,
    PaypalEmail,
    VenmoName,
    VenmoHandle,
    MailingAddress,
    City,
    State,
    ZipCode,
    Signature,
    AgreeToTerms,
}

impl FieldKey {
    /// 本人情報の4項目（表示順）。
    pub const IDENTITY: [FieldKey; 4] = [
        FieldKey::FullName,
        FieldKey::BookingNumber,
        FieldKey::Email,
        FieldKey::Phone,
    ];

    /// エラーマップなどで使うフィールド名。
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::FullName => "fullName",
            FieldKey::BookingNumber => "bookingNumber",
            FieldKey::Email => "email",
            FieldKey::Phone => "phone",
            FieldKey::Reason => "reason",
            FieldKey::RefundMethod => "refundMethod",
            FieldKey::PaypalName => "paypalName",
            FieldKey::PaypalEmail => "paypalEmail",
            FieldKey::VenmoName => "venmoName",
            FieldKey::VenmoHandle => "venmoHandle",
            FieldKey::MailingAddress => "mailingAddress",
            FieldKey::City => "city",
            FieldKey::State => "state",
            FieldKey::ZipCode => "zipCode",
            FieldKey::Signature => "signature",
            FieldKey::AgreeToTerms => "agreeToTerms",
        }
    }

    /// 画面表示用のラベル。
    pub fn label(self) -> &'static str {
        match self {
            FieldKey::FullName => "Full Name",
            FieldKey::BookingNumber => "Booking Number",
            FieldKey::Email => "Email Address",
            FieldKey::Phone => "Phone Number",
            FieldKey::Reason => "Reason for Refund Request",
            FieldKey::RefundMethod => "Preferred Refund Method",
            FieldKey::Signature => "Digital Signature",
            FieldKey::AgreeToTerms => "Terms and Conditions",
            // 支払い方法ごとの項目はフィールドモデル側のラベルを使う。
            other => methods::find_def(other).map(|d| d.label).unwrap_or(other.as_str()),
        }
    }

    /// 入力欄のプレースホルダ。
    pub fn placeholder(self) -> &'static str {
        match self {
            FieldKey::FullName => "Enter your full name",
            FieldKey::BookingNumber => "e.g., SG-123456789",
            FieldKey::Email => "your.email@example.com",
            FieldKey::Phone => "(555) 123-4567",
            FieldKey::Reason => "Please explain the reason for your refund request in detail...",
            other => methods::find_def(other).map(|d| d.placeholder).unwrap_or(""),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 返金申請フォームの入力値。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefundRequest {
    /// 氏名。
    pub full_name: String,
    /// 予約番号。
    pub booking_number: String,
    /// 連絡先メールアドレス。
    pub email: String,
    /// 電話番号。
    pub phone: String,
    /// 返金理由。
    pub reason: String,
    /// 受け取り方法（未選択はNone）。
    pub refund_method: Option<RefundMethod>,
    /// PayPalアカウント名義。
    pub paypal_name: String,
    /// PayPal登録メールアドレス。
    pub paypal_email: String,
    /// Venmoアカウント名義。
    pub venmo_name: String,
    /// Venmoユーザー名。
    pub venmo_handle: String,
    /// 小切手の送付先住所。
    pub mailing_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    /// 署名画像（data URI）。未署名は空文字。
    pub signature: String,
    /// 規約への同意。
    pub agree_to_terms: bool,
}

impl RefundRequest {
    /// テキスト項目の現在値を返す（テキスト以外はNone）。
    pub fn text(&self, key: FieldKey) -> Option<&str> {
        let v = match key {
            FieldKey::FullName => &self.full_name,
            FieldKey::BookingNumber => &self.booking_number,
            FieldKey::Email => &self.email,
            FieldKey::Phone => &self.phone,
            FieldKey::Reason => &self.reason,
            FieldKey::PaypalName => &self.paypal_name,
            FieldKey::PaypalEmail => &self.paypal_email,
            FieldKey::VenmoName => &self.venmo_name,
            FieldKey::VenmoHandle => &self.venmo_handle,
            FieldKey::MailingAddress => &self.mailing_address,
            FieldKey::City => &self.city,
            FieldKey::State => &self.state,
            FieldKey::ZipCode => &self.zip_code,
            FieldKey::RefundMethod | FieldKey::Signature | FieldKey::AgreeToTerms => return None,
        };
        Some(v.as_str())
    }

    /// テキスト項目を書き換える。テキスト以外のキーならfalse。
    pub fn set_text(&mut self, key: FieldKey, value: String) -> bool {
        let slot = match key {
            FieldKey::FullName => &mut self.full_name,
            FieldKey::BookingNumber => &mut self.booking_number,
            FieldKey::Email => &mut self.email,
            FieldKey::Phone => &mut self.phone,
            FieldKey::Reason => &mut self.reason,
            FieldKey::PaypalName => &mut self.paypal_name,
            FieldKey::PaypalEmail => &mut self.paypal_email,
            FieldKey::VenmoName => &mut self.venmo_name,
            FieldKey::VenmoHandle => &mut self.venmo_handle,
            FieldKey::MailingAddress => &mut self.mailing_address,
            FieldKey::City => &mut self.city,
            FieldKey::State => &mut self.state,
            FieldKey::ZipCode => &mut self.zip_code,
            FieldKey::RefundMethod | FieldKey::Signature | FieldKey::AgreeToTerms => return false,
        };
        *slot = value;
        true
    }

    /// 署名が入っているか。
    pub fn has_signature(&self) -> bool {
        !self.signature.is_empty()
    }
}
