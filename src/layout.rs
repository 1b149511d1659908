//! レイアウト計算のヘルパー関数

use ratatui::{
    prelude::*,
    widgets::{Block, Borders},
};

/// 画面全体の領域（ヘッダー + Body + HELP + STATUS）
pub struct MainLayout {
    /// 社名・連絡先・フォーム見出し
    pub header: Rect,
    /// 画面ごとの本文
    pub body: Rect,
    /// HELPバーの領域
    pub help_bar: Rect,
    /// STATUSバーの領域
    pub status_bar: Rect,
}

/// フォーム画面の本文（入力項目 + 署名パッド + 案内）
pub struct FormLayout {
    /// 入力項目リスト
    pub fields: Rect,
    /// 署名パッドの枠
    pub pad: Rect,
    /// 処理期間の案内とログ
    pub notes: Rect,
}

/// 管理画面の本文（ガイド + 設定 + テスト）
pub struct AdminLayout {
    pub guide: Rect,
    pub settings: Rect,
    pub test_panel: Rect,
}

/// 画面を4つの領域に分割
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // ヘッダー
            Constraint::Min(1),    // Body
            Constraint::Length(3), // HELPバー
            Constraint::Length(3), // STATUSバー
        ])
        .split(area);

    MainLayout {
        header: chunks[0],
        body: chunks[1],
        help_bar: chunks[2],
        status_bar: chunks[3],
    }
}

/// フォーム本文を左右に分割（入力項目 55% + 署名/案内 45%）
pub fn create_form_layout(body: Rect) -> FormLayout {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(60), // 署名パッド
            Constraint::Percentage(40), // 案内
        ])
        .split(cols[1]);

    FormLayout {
        fields: cols[0],
        pad: right[0],
        notes: right[1],
    }
}

/// 管理画面本文を分割（左: ガイド、右: 設定 + テスト）
pub fn create_admin_layout(body: Rect) -> AdminLayout {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(3)])
        .split(cols[1]);

    AdminLayout {
        guide: cols[0],
        settings: right[0],
        test_panel: right[1],
    }
}

/// 署名パッドの枠。描画とマウス座標変換で共有する。
pub fn pad_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title("Digital Signature")
}

/// 端末全体の大きさから署名パッドの描画面（枠の内側）を求める。
pub fn signature_canvas(area: Rect) -> Rect {
    let main = create_main_layout(area);
    let form = create_form_layout(main.body);
    pad_block().inner(form.pad)
}
