//! ショートカット設定の管理。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// ショートカット設定の全体。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortcuts {
    pub form: FormShortcuts,
    pub admin: AdminShortcuts,
    pub modal: ModalShortcuts,
    pub input_box: InputBoxShortcuts,
}

/// フォーム画面のショートカット。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormShortcuts {
    pub quit: Vec<String>,
    pub admin: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub activate: Vec<String>,
    pub method_next: Vec<String>,
    pub method_prev: Vec<String>,
    pub toggle_agree: Vec<String>,
    pub clear_signature: Vec<String>,
    pub submit: Vec<String>,
}

/// 管理画面のショートカット。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminShortcuts {
    pub back: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub edit: Vec<String>,
    pub save: Vec<String>,
    pub test_send: Vec<String>,
    pub dashboard: Vec<String>,
}

/// 結果モーダルのショートカット。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalShortcuts {
    pub download: Vec<String>,
    pub close: Vec<String>,
}

/// InputBoxのショートカット。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

impl Shortcuts {
    /// TOMLから読み込み、無ければデフォルトを返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let shortcuts: Shortcuts = toml::from_str(&content)?;
            tracing::info!("loaded shortcuts from {}", path.display());
            Ok(shortcuts)
        } else {
            Ok(Self::default())
        }
    }
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            form: FormShortcuts {
                quit: keys(&["q"]),
                admin: keys(&["a"]),
                next: keys(&["Down", "Tab", "j"]),
                prev: keys(&["Up", "Shift+BackTab", "k"]),
                activate: keys(&["Enter", "e"]),
                method_next: keys(&["Right", "l"]),
                method_prev: keys(&["Left", "h"]),
                toggle_agree: keys(&["Space"]),
                clear_signature: keys(&["c"]),
                submit: keys(&["s"]),
            },
            admin: AdminShortcuts {
                back: keys(&["Esc"]),
                next: keys(&["Down", "j"]),
                prev: keys(&["Up", "k"]),
                edit: keys(&["Enter", "e"]),
                save: keys(&["s"]),
                test_send: keys(&["t"]),
                dashboard: keys(&["o"]),
            },
            modal: ModalShortcuts {
                download: keys(&["d"]),
                close: keys(&["Enter", "Esc"]),
            },
            input_box: InputBoxShortcuts {
                confirm: keys(&["Enter"]),
                cancel: keys(&["Esc"]),
                backspace: keys(&["Backspace"]),
                delete: keys(&["Delete"]),
                // 入力中の文字と衝突しないよう矢印キーのみ。
                left: keys(&["Left"]),
                right: keys(&["Right"]),
                home: keys(&["Home"]),
                end: keys(&["End"]),
                clear_line: keys(&["Ctrl+u"]),
            },
        }
    }
}

/// ショートカットキーの配列を表示用文字列に変換する。
pub fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}

/// KeyEventがいずれかのショートカット文字列と一致するか判定する。
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts.iter().any(|s| matches_single_shortcut(key, s))
}

/// KeyEventが単一のショートカット文字列と一致するか判定する。
fn matches_single_shortcut(key: &KeyEvent, shortcut: &str) -> bool {
    // ショートカット文字列を分解する（例: "Ctrl+u", "a", "Enter"）。
    let parts: Vec<&str> = shortcut.split('+').collect();

    let (modifiers_str, key_str) = if parts.len() > 1 {
        (&parts[0..parts.len() - 1], parts[parts.len() - 1])
    } else {
        (&[][..], parts[0])
    };

    let mut expected_modifiers = KeyModifiers::empty();
    for modifier in modifiers_str {
        match *modifier {
            "Ctrl" | "ctrl" => expected_modifiers |= KeyModifiers::CONTROL,
            "Alt" | "alt" => expected_modifiers |= KeyModifiers::ALT,
            "Shift" | "shift" => expected_modifiers |= KeyModifiers::SHIFT,
            _ => return false,
        }
    }

    // 大文字入力はSHIFT付きで届くため、文字キーではSHIFTを比較しない。
    let (actual, expected) = match key.code {
        KeyCode::Char(_) => (
            key.modifiers.difference(KeyModifiers::SHIFT),
            expected_modifiers.difference(KeyModifiers::SHIFT),
        ),
        _ => (key.modifiers, expected_modifiers),
    };
    if actual != expected {
        return false;
    }

    match key_str {
        "Enter" | "enter" => key.code == KeyCode::Enter,
        "Esc" | "esc" => key.code == KeyCode::Esc,
        "Tab" | "tab" => key.code == KeyCode::Tab,
        "BackTab" | "backtab" => key.code == KeyCode::BackTab,
        "Space" | "space" => key.code == KeyCode::Char(' '),
        "Backspace" | "backspace" => key.code == KeyCode::Backspace,
        "Delete" | "delete" => key.code == KeyCode::Delete,
        "Up" | "up" => key.code == KeyCode::Up,
        "Down" | "down" => key.code == KeyCode::Down,
        "Left" | "left" => key.code == KeyCode::Left,
        "Right" | "right" => key.code == KeyCode::Right,
        "Home" | "home" => key.code == KeyCode::Home,
        "End" | "end" => key.code == KeyCode::End,
        // 単一文字は Char として比較する。
        s if s.chars().count() == 1 => s
            .chars()
            .next()
            .is_some_and(|c| key.code == KeyCode::Char(c)),
        _ => false,
    }
}
