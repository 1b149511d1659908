//! 返金申請の入力チェック（純粋関数）。

use regex::Regex;
use std::{collections::BTreeMap, sync::LazyLock};

use super::{FieldKey, InputKind, RefundRequest, method_fields};

/// `<非空白>+@<非空白>+.<非空白>+` 形式のメールアドレス。
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

/// フィールド名 → エラーメッセージの対応表。空なら入力は妥当。
pub type ValidationErrors = BTreeMap<FieldKey, String>;

/// メールアドレスの書式を判定する。
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// 1回の検証パス。全項目を毎回調べ、違反ごとに独立したエントリを作る。
pub fn validate(request: &RefundRequest) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    // 本人情報と理由をチェックする。
    require(&mut errors, FieldKey::FullName, &request.full_name, "Full name is required");
    require(
        &mut errors,
        FieldKey::BookingNumber,
        &request.booking_number,
        "Booking number is required",
    );
    if is_blank(&request.email) {
        errors.insert(FieldKey::Email, "Email is required".into());
    } else if !is_valid_email(&request.email) {
        errors.insert(FieldKey::Email, "Please enter a valid email address".into());
    }
    require(&mut errors, FieldKey::Phone, &request.phone, "Phone number is required");
    require(
        &mut errors,
        FieldKey::Reason,
        &request.reason,
        "Please provide a reason for the refund",
    );

    // 受け取り方法。未選択なら方法別のチェックは行わない。
    if request.refund_method.is_none() {
        errors.insert(FieldKey::RefundMethod, "Please select a refund method".into());
    }
    for def in method_fields(request.refund_method) {
        let value = request.text(def.key).unwrap_or_default();
        if is_blank(value) {
            errors.insert(def.key, required_message(def.key).into());
        } else if def.kind == InputKind::Email && !is_valid_email(value) {
            errors.insert(def.key, "Please enter a valid PayPal email address".into());
        }
    }

    if request.signature.is_empty() {
        errors.insert(FieldKey::Signature, "Digital signature is required".into());
    }
    if !request.agree_to_terms {
        errors.insert(
            FieldKey::AgreeToTerms,
            "You must agree to the terms and conditions".into(),
        );
    }

    errors
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require(errors: &mut ValidationErrors, key: FieldKey, value: &str, message: &str) {
    if is_blank(value) {
        errors.insert(key, message.into());
    }
}

/// 方法別項目の未入力メッセージ。
fn required_message(key: FieldKey) -> &'static str {
    match key {
        FieldKey::PaypalName => "PayPal account name is required",
        FieldKey::PaypalEmail => "PayPal email is required",
        FieldKey::VenmoName => "Venmo account name is required",
        FieldKey::VenmoHandle => "Venmo username is required",
        FieldKey::MailingAddress => "Mailing address is required",
        FieldKey::City => "City is required",
        FieldKey::State => "State is required",
        FieldKey::ZipCode => "ZIP code is required",
        _ => "This field is required",
    }
}
