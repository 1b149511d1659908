//! 画面遷移用のUI状態と画面種別。

use crate::refund::{FieldKey, RefundMethod, method_fields};

/// TUIで現在表示中の画面。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// 返金申請フォーム。
    Form,
    /// 管理画面（設定ガイド・テスト送信）。
    Admin,
}

/// フォーム上でフォーカスできる項目。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormItem {
    /// 自由入力のテキスト項目。
    Text(FieldKey),
    /// 受け取り方法の選択。
    Method,
    /// 署名パッド。
    Signature,
    /// 規約同意のチェックボックス。
    Agree,
    /// 送信ボタン。
    Submit,
}

impl FormItem {
    /// 対応するフィールド（送信ボタンはNone）。
    pub fn field(self) -> Option<FieldKey> {
        match self {
            FormItem::Text(key) => Some(key),
            FormItem::Method => Some(FieldKey::RefundMethod),
            FormItem::Signature => Some(FieldKey::Signature),
            FormItem::Agree => Some(FieldKey::AgreeToTerms),
            FormItem::Submit => None,
        }
    }
}

/// 選択中の受け取り方法に応じたフォーカス順。
pub fn form_items(method: Option<RefundMethod>) -> Vec<FormItem> {
    let mut items: Vec<FormItem> = FieldKey::IDENTITY
        .iter()
        .map(|k| FormItem::Text(*k))
        .collect();
    items.push(FormItem::Text(FieldKey::Reason));
    items.push(FormItem::Method);
    items.extend(method_fields(method).iter().map(|d| FormItem::Text(d.key)));
    items.extend([FormItem::Signature, FormItem::Agree, FormItem::Submit]);
    items
}

/// 描画側と共有するUI状態。
#[derive(Clone, Debug)]
pub struct UiState {
    /// 現在の画面。
    pub screen: Screen,
    /// フォームのフォーカス位置（form_itemsの添字）。
    pub focus: usize,
    /// 右側パネルに表示するログ。
    pub log: Vec<String>,
    /// 画面下部のステータス文言。
    pub status: String,
    /// エラーメッセージ（強調表示用）。
    pub error: Option<String>,
}

impl UiState {
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            focus: 0,
            log: vec![],
            status: String::new(),
            error: None,
        }
    }
}
