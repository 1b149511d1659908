//! 受け取り方法ごとの追加入力項目の定義。

use super::{FieldKey, RefundMethod};

/// 入力欄の種類。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// 通常のテキスト。
    Text,
    /// メールアドレス（書式チェックあり）。
    Email,
}

/// 追加入力項目1件分の定義。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub key: FieldKey,
    pub label: &'static str,
    pub kind: InputKind,
    pub placeholder: &'static str,
}

const PAYPAL_FIELDS: [FieldDef; 2] = [
    FieldDef {
        key: FieldKey::PaypalName,
        label: "PayPal Account Name",
        kind: InputKind::Text,
        placeholder: "Name on your PayPal account",
    },
    FieldDef {
        key: FieldKey::PaypalEmail,
        label: "PayPal Email",
        kind: InputKind::Email,
        placeholder: "paypal.email@example.com",
    },
];

const VENMO_FIELDS: [FieldDef; 2] = [
    FieldDef {
        key: FieldKey::VenmoName,
        label: "Venmo Account Name",
        kind: InputKind::Text,
        placeholder: "Name on your Venmo account",
    },
    FieldDef {
        key: FieldKey::VenmoHandle,
        label: "Venmo Username",
        kind: InputKind::Text,
        placeholder: "@username",
    },
];

const CHECK_FIELDS: [FieldDef; 4] = [
    FieldDef {
        key: FieldKey::MailingAddress,
        label: "Mailing Address",
        kind: InputKind::Text,
        placeholder: "Street address",
    },
    FieldDef {
        key: FieldKey::City,
        label: "City",
        kind: InputKind::Text,
        placeholder: "City",
    },
    FieldDef {
        key: FieldKey::State,
        label: "State",
        kind: InputKind::Text,
        placeholder: "State",
    },
    FieldDef {
        key: FieldKey::ZipCode,
        label: "ZIP Code",
        kind: InputKind::Text,
        placeholder: "12345",
    },
];

/// 選択中の受け取り方法で追加表示・必須になる項目を順序付きで返す。
pub fn method_fields(method: Option<RefundMethod>) -> &'static [FieldDef] {
    match method {
        Some(RefundMethod::PayPal) => &PAYPAL_FIELDS,
        Some(RefundMethod::Venmo) => &VENMO_FIELDS,
        Some(RefundMethod::Check) => &CHECK_FIELDS,
        None => &[],
    }
}

/// 受け取り方法に属する項目の定義を探す。
pub fn find_def(key: FieldKey) -> Option<&'static FieldDef> {
    RefundMethod::ALL
        .into_iter()
        .flat_map(|m| method_fields(Some(m)).iter())
        .find(|d| d.key == key)
}

/// 受け取り方法に属する項目かどうか。
pub fn is_method_field(key: FieldKey) -> bool {
    find_def(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_method_has_no_fields() {
        assert!(method_fields(None).is_empty());
    }

    #[test]
    fn test_method_field_groups_are_disjoint() {
        // 各方法の項目が他の方法と重複しないことを確認する。
        for a in RefundMethod::ALL {
            for b in RefundMethod::ALL {
                if a == b {
                    continue;
                }
                for def in method_fields(Some(a)) {
                    assert!(!method_fields(Some(b)).iter().any(|d| d.key == def.key));
                }
            }
        }
    }

    #[test]
    fn test_check_fields_in_display_order() {
        let keys: Vec<FieldKey> = method_fields(Some(RefundMethod::Check))
            .iter()
            .map(|d| d.key)
            .collect();
        assert_eq!(
            keys,
            vec![
                FieldKey::MailingAddress,
                FieldKey::City,
                FieldKey::State,
                FieldKey::ZipCode
            ]
        );
    }

    #[test]
    fn test_identity_fields_are_not_method_fields() {
        for key in FieldKey::IDENTITY {
            assert!(!is_method_field(key));
        }
        assert!(is_method_field(FieldKey::VenmoHandle));
    }
}
