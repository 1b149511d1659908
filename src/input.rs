//! TUI内での文字列入力コンポーネント（InputBox）。

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::{admin::SettingsField, refund::FieldKey};

/// InputBox入力状態
#[derive(Clone, Debug)]
pub struct InputBoxState {
    /// プロンプトメッセージ
    pub prompt: String,
    /// 補足（プレースホルダなど）
    pub hint: String,
    /// 現在の入力値
    pub value: String,
    /// カーソル位置（文字単位）
    pub cursor: usize,
    /// 入力完了時のコールバック識別子
    pub callback_id: InputCallbackId,
}

/// 入力完了時のコールバック識別子
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputCallbackId {
    /// フォームのテキスト項目。
    Field(FieldKey),
    /// 管理画面の設定項目。
    Setting(SettingsField),
}

impl InputBoxState {
    /// 現在値を入れ、カーソルを末尾に置いて開く。
    pub fn new(prompt: impl Into<String>, value: &str, callback_id: InputCallbackId) -> Self {
        // 既存値を編集できるよう、カーソルは末尾（文字数）に置く。
        Self {
            prompt: prompt.into(),
            hint: String::new(),
            value: value.to_string(),
            cursor: value.chars().count(),
            callback_id,
        }
    }

    /// 補足行を設定する。
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        // プレースホルダなどを補足行に表示する。
        self.hint = hint.into();
        self
    }

    /// 文字位置をバイト位置へ変換する。
    fn byte_at(&self, char_idx: usize) -> usize {
        // 範囲外（末尾）なら文字列長を返す。
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// 文字を挿入
    pub fn insert_char(&mut self, c: char) {
        // カーソル位置をバイト位置に変換する。
        let at = self.byte_at(self.cursor);
        // 新しい文字を挿入する。
        self.value.insert(at, c);
        // カーソルを進める。
        self.cursor += 1;
    }

    /// Backspace（カーソル前の文字を削除）
    pub fn backspace(&mut self) {
        // カーソルが先頭なら何もしない。
        if self.cursor > 0 {
            // カーソル位置を左へ移動する。
            self.cursor -= 1;
            // 移動先の文字を取り除く。
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    /// Delete（カーソル位置の文字を削除）
    pub fn delete(&mut self) {
        // カーソルが末尾なら何もしない。
        if self.cursor < self.value.chars().count() {
            // カーソル位置の文字を取り除く。
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    /// カーソルを左に移動
    pub fn move_left(&mut self) {
        // 先頭より左には動かさない。
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// カーソルを右に移動
    pub fn move_right(&mut self) {
        // 末尾より右には動かさない。
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    /// カーソルを先頭に移動
    pub fn move_home(&mut self) {
        // 先頭位置を設定する。
        self.cursor = 0;
    }

    /// カーソルを末尾に移動
    pub fn move_end(&mut self) {
        // 末尾位置（文字数）を設定する。
        self.cursor = self.value.chars().count();
    }

    /// 行全体をクリア
    pub fn clear_line(&mut self) {
        // 入力値を空にし、カーソルを先頭へ戻す。
        self.value.clear();
        self.cursor = 0;
    }

    /// 表示幅に収まるよう横スクロールし、カーソル位置に`|`を入れた文字列。
    fn visible_with_cursor(&self, width: usize) -> String {
        // カーソルが右端に収まるよう表示開始位置をずらす。
        let offset = self.cursor.saturating_sub(width.saturating_sub(2));
        // 表示範囲の文字だけを取り出す。
        let chars: Vec<char> = self.value.chars().skip(offset).take(width).collect();
        // 表示範囲内でのカーソル位置を求める。
        let at = (self.cursor - offset).min(chars.len());
        // カーソルの前後に分けて区切り記号を挟む。
        let before: String = chars[..at].iter().collect();
        let after: String = chars[at..].iter().collect();
        format!("{before}|{after}")
    }
}

/// InputBoxをポップアップとして描画
pub fn render_input_box(f: &mut Frame, state: &InputBoxState, help: &str) {
    // 中央に配置されたポップアップ領域を計算する。
    let popup_area = centered_popup(f.area(), 70, 8);

    // 既存の描画を消してポップアップ用の背景にする。
    f.render_widget(Clear, popup_area);

    // 枠と背景色を描画する。
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Input")
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(block, popup_area);

    // 内側をプロンプト・入力・補足・ヘルプの行に分ける。
    let inner_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // プロンプト
            Constraint::Length(1), // 入力フィールド
            Constraint::Length(1), // 補足
            Constraint::Length(1), // 空行
            Constraint::Length(1), // ヘルプ
        ])
        .split(popup_area);

    // プロンプトを強調表示する。
    let prompt_widget = Paragraph::new(state.prompt.clone()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(prompt_widget, inner_layout[0]);

    // 入力値をカーソル付きで表示する。
    let visible = state.visible_with_cursor(inner_layout[1].width as usize);
    let input_widget = Paragraph::new(visible).style(Style::default().fg(Color::Green));
    f.render_widget(input_widget, inner_layout[1]);

    // 補足があれば灰色で表示する。
    if !state.hint.is_empty() {
        let hint = Paragraph::new(state.hint.clone()).style(Style::default().fg(Color::Gray));
        f.render_widget(hint, inner_layout[2]);
    }

    // 最下行にキー操作のヘルプを表示する。
    let help = Paragraph::new(help.to_string())
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, inner_layout[4]);
}

/// 中央配置のポップアップ領域を計算
pub fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    // 縦方向の余白を作り、中央行を取り出す。
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    // 横方向も中央に寄せてポップアップ領域を返す。
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(value: &str) -> InputBoxState {
        InputBoxState::new("Name:", value, InputCallbackId::Field(FieldKey::FullName))
    }

    #[test]
    fn test_edit_multibyte() {
        // マルチバイト文字も文字単位で編集できる。
        let mut s = boxed("José");
        assert_eq!(s.cursor, 4);
        s.backspace();
        assert_eq!(s.value, "Jos");
        s.move_home();
        s.insert_char('¡');
        assert_eq!(s.value, "¡Jos");
        s.delete();
        assert_eq!(s.value, "¡os");
        s.move_end();
        s.move_right();
        assert_eq!(s.cursor, 3);
    }

    #[test]
    fn test_visible_window_follows_cursor() {
        let s = boxed("abcdefghij");
        assert_eq!(s.visible_with_cursor(6), "ghij|");
        let mut s = boxed("abc");
        s.move_home();
        assert_eq!(s.visible_with_cursor(10), "|abc");
    }

    #[test]
    fn test_centered_popup_fits_area() {
        let area = Rect::new(0, 0, 100, 40);
        let r = centered_popup(area, 70, 20);
        assert_eq!(r.height, 20);
        assert_eq!(r.y, 10);
        assert!(r.x + r.width <= area.width);
    }
}
