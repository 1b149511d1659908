//! TUI描画関連の関数。

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{
    admin::{self, SettingsField, TestPanel},
    config::BrandingCfg,
    events::{FormItem, Screen, form_items},
    input, layout, modal,
    refund::{FieldKey, RefundMethod},
    shortcuts::{Shortcuts, format_keys},
    submission::SubmissionState,
};

use super::App;

/// 処理期間の案内。
const PROCESSING_NOTICE: &str = "Please note that refunds may take up to 30 business days to process. \
Processing times may vary depending on your selected refund method and banking institution.";

/// 規約同意の文言。
const TERMS_TEXT: &str = "I agree to the Terms and Conditions and understand that this refund \
request will be processed according to company policy.";

/// フォーカス行の強調スタイル。
fn focus_style() -> Style {
    Style::default()
        .bg(Color::Rgb(255, 140, 0)) // オレンジ色の背景
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

/// 画面全体のレイアウトを描画する。
pub fn draw(f: &mut Frame, app: &App) {
    let main_layout = layout::create_main_layout(f.area());

    draw_header(f, main_layout.header, &app.cfg.branding);

    match app.ui.screen {
        Screen::Form => draw_form(f, main_layout.body, app),
        Screen::Admin => draw_admin(f, main_layout.body, app),
    }

    let help_bar = Paragraph::new(help_text(app))
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    f.render_widget(build_status_bar(app), main_layout.status_bar);

    // 成功後は結果モーダルを重ねる。
    if app.ui.screen == Screen::Form
        && let Some(receipt) = app.session.receipt()
    {
        let sc = &app.shortcuts.modal;
        let help = format!(
            "{}: download receipt | {}: close",
            format_keys(&sc.download),
            format_keys(&sc.close)
        );
        modal::render_result_modal(f, &receipt, &help);
    }

    if let Some(input_state) = &app.input_box {
        let sc = &app.shortcuts.input_box;
        let help = format!(
            "{}=確定 | {}=キャンセル | {}=クリア",
            format_keys(&sc.confirm),
            format_keys(&sc.cancel),
            format_keys(&sc.clear_line)
        );
        input::render_input_box(f, input_state, &help);
    }
}

/// 社名・キャッチコピー・連絡先・フォーム見出しを描画する。
fn draw_header(f: &mut Frame, area: Rect, branding: &BrandingCfg) {
    let lines = vec![
        Line::from(vec![
            Span::styled(branding.tagline.clone(), Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                "   Tel {}   {}",
                branding.support_phone, branding.support_email
            )),
        ]),
        Line::from(vec![
            Span::styled(
                branding.form_title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" - {}", branding.form_subtitle)),
        ]),
    ];
    let header = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(branding.company_name.clone())
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
    );
    f.render_widget(header, area);
}

/// フォーム画面を描画する。
fn draw_form(f: &mut Frame, area: Rect, app: &App) {
    let form_layout = layout::create_form_layout(area);

    let (lines, focus_line) = build_form_lines(app);
    // フォーカス行が見えるように縦スクロールする。
    let visible = form_layout.fields.height.saturating_sub(2);
    let scroll = (focus_line as u16).saturating_sub(visible.saturating_sub(3));
    let fields = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("REFUND REQUEST"))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(fields, form_layout.fields);

    // 署名パッド。未署名エラーがあれば枠を赤くする。
    let pad_hint = if app.pad.has_content() {
        format!(" {}: clear ", format_keys(&app.shortcuts.form.clear_signature))
    } else {
        " draw with the mouse ".to_string()
    };
    let mut pad_block = layout::pad_block().title_bottom(pad_hint);
    if app.session.error_for(FieldKey::Signature).is_some() {
        pad_block = pad_block.border_style(Style::default().fg(Color::Red));
    } else if app.pad.is_drawing() {
        pad_block = pad_block.border_style(Style::default().fg(Color::Green));
    }
    f.render_widget(pad_block, form_layout.pad);
    f.render_widget(&app.pad, app.pad_area);

    let notes = Paragraph::new(build_notes_text(app))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Important Processing Information"),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(notes, form_layout.notes);
}

/// 入力項目の行を組み立て、フォーカス行の位置も返す。
fn build_form_lines(app: &App) -> (Vec<Line<'static>>, usize) {
    let request = app.session.request();
    let items = form_items(request.refund_method);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut focus_line = 0;

    for (i, item) in items.iter().enumerate() {
        // セクション見出し。
        let section = match item {
            FormItem::Text(k) if *k == FieldKey::FullName => Some("Personal Information"),
            FormItem::Method => Some("Refund Details"),
            FormItem::Signature => Some("Digital Signature"),
            _ => None,
        };
        if let Some(title) = section {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            lines.push(Line::styled(
                title,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ));
        }

        let focused = i == app.ui.focus;
        if focused {
            focus_line = lines.len();
        }
        let marker = if focused { "▶ " } else { "  " };
        let label_style = if focused { focus_style() } else { Style::default() };

        match item {
            FormItem::Text(key) => {
                let value = request.text(*key).unwrap_or_default();
                let value_span = if value.is_empty() {
                    Span::styled(
                        key.placeholder().to_string(),
                        Style::default().fg(Color::DarkGray),
                    )
                } else {
                    Span::raw(value.to_string())
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{marker}{} *", key.label()), label_style),
                    Span::raw(" "),
                    value_span,
                ]));
            }
            FormItem::Method => {
                let mut spans = vec![
                    Span::styled(format!("{marker}Preferred Refund Method *"), label_style),
                    Span::raw(" "),
                ];
                for m in RefundMethod::ALL {
                    let selected = request.refund_method == Some(m);
                    let mark = if selected { "(•)" } else { "( )" };
                    let style = if selected {
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    spans.push(Span::styled(format!("{mark} {}  ", m.label()), style));
                }
                lines.push(Line::from(spans));
                if let Some(m) = request.refund_method {
                    lines.push(Line::styled(
                        format!("    {}", m.description()),
                        Style::default().fg(Color::Gray),
                    ));
                }
            }
            FormItem::Signature => {
                let state = if request.has_signature() {
                    Span::styled("signed", Style::default().fg(Color::Green))
                } else {
                    Span::styled(
                        "not signed (draw in the pad)",
                        Style::default().fg(Color::DarkGray),
                    )
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{marker}Signature *"), label_style),
                    Span::raw(" "),
                    state,
                ]));
            }
            FormItem::Agree => {
                let mark = if request.agree_to_terms { "[x]" } else { "[ ]" };
                lines.push(Line::from(vec![
                    Span::styled(format!("{marker}{mark}"), label_style),
                    Span::raw(format!(" {TERMS_TEXT}")),
                ]));
            }
            FormItem::Submit => {
                lines.push(Line::default());
                let (text, style) = if *app.session.state() == SubmissionState::Submitting {
                    ("[ Processing... ]", Style::default().fg(Color::DarkGray))
                } else {
                    (
                        "[ Submit Refund Request ]",
                        Style::default()
                            .fg(Color::Blue)
                            .add_modifier(Modifier::BOLD),
                    )
                };
                let style = if focused { focus_style() } else { style };
                if focused {
                    focus_line = lines.len();
                }
                lines.push(Line::styled(format!("{marker}{text}"), style));
            }
        }

        // 項目直下にエラーを出す。
        if let Some(field) = item.field()
            && let Some(err) = app.session.error_for(field)
        {
            lines.push(Line::styled(
                format!("    ! {err}"),
                Style::default().fg(Color::Red),
            ));
        }
    }

    // 送信失敗メッセージ。
    if let Some(msg) = app.session.state().error_message() {
        lines.push(Line::default());
        lines.push(Line::styled(
            msg.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    (lines, focus_line)
}

/// 案内パネルの本文（処理期間の案内 + ログ）。
fn build_notes_text(app: &App) -> String {
    let recent: Vec<String> = app.ui.log.iter().rev().take(5).rev().cloned().collect();
    if recent.is_empty() {
        PROCESSING_NOTICE.to_string()
    } else {
        format!("{PROCESSING_NOTICE}\n\nLog:\n{}", recent.join("\n"))
    }
}

/// 管理画面を描画する。
fn draw_admin(f: &mut Frame, area: Rect, app: &App) {
    let admin_layout = layout::create_admin_layout(area);

    let guide = Paragraph::new(admin::config_guide(&app.cfg).join("\n"))
        .block(Block::default().borders(Borders::ALL).title("EMAIL CONFIGURATION"))
        .wrap(Wrap { trim: false });
    f.render_widget(guide, admin_layout.guide);

    let settings: Vec<Line> = SettingsField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let focused = i == app.admin.selected;
            let marker = if focused { "▶ " } else { "  " };
            let style = if focused { focus_style() } else { Style::default() };
            Line::from(vec![
                Span::styled(format!("{marker}{}:", field.label()), style),
                Span::raw(format!(" {}", app.admin.draft.display(*field))),
            ])
        })
        .collect();
    let settings = Paragraph::new(settings)
        .block(Block::default().borders(Borders::ALL).title("SETTINGS"));
    f.render_widget(settings, admin_layout.settings);

    let color = match app.admin.test {
        TestPanel::Passed(_) => Color::Green,
        TestPanel::Failed { .. } => Color::Red,
        _ => Color::Reset,
    };
    let panel = Paragraph::new(app.admin.test.lines().join("\n"))
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title("EMAIL DEBUG"))
        .wrap(Wrap { trim: false });
    f.render_widget(panel, admin_layout.test_panel);
}

/// ステータスバーを構築する。
fn build_status_bar(app: &App) -> Paragraph<'static> {
    let mut status_bar = Paragraph::new(status_text(app))
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .wrap(Wrap { trim: true });

    // エラー時・送信失敗メッセージ表示中は赤色で強調表示する。
    if status_is_alert(app) {
        status_bar = status_bar.style(Style::default().fg(Color::Red));
    }

    status_bar
}

/// ステータスバーの文字列（画面名・送信状態・プロバイダ状態・直近の通知）。
fn status_text(app: &App) -> String {
    let screen_name = match app.ui.screen {
        Screen::Form => "Form",
        Screen::Admin => "Admin",
    };
    let state = app.session.state().label();
    let provider = if app.cfg.provider.is_configured() {
        "provider ok"
    } else {
        "provider not configured"
    };

    if let Some(err) = &app.ui.error {
        format!("[{screen_name}] {state} | {provider} | ERROR: {err}")
    } else if app.ui.status.is_empty() {
        format!("[{screen_name}] {state} | {provider}")
    } else {
        format!("[{screen_name}] {state} | {provider} | {}", app.ui.status)
    }
}

/// 赤で強調すべき状態か。編集で失敗メッセージが消えたら通常表示に戻る。
fn status_is_alert(app: &App) -> bool {
    app.ui.error.is_some() || app.session.state().error_message().is_some()
}

/// 現在画面に応じたヘルプ文字列を返す。
fn help_text(app: &App) -> String {
    let shortcuts: &Shortcuts = &app.shortcuts;
    match app.ui.screen {
        Screen::Form => {
            let sc = &shortcuts.form;
            format!(
                "{}/{}: move | {}: edit | {}/{}: method | {}: agree | {}: clear signature | {}: submit | {}: admin | {}: quit",
                format_keys(&sc.prev),
                format_keys(&sc.next),
                format_keys(&sc.activate),
                format_keys(&sc.method_prev),
                format_keys(&sc.method_next),
                format_keys(&sc.toggle_agree),
                format_keys(&sc.clear_signature),
                format_keys(&sc.submit),
                format_keys(&sc.admin),
                format_keys(&sc.quit)
            )
        }
        Screen::Admin => {
            let sc = &shortcuts.admin;
            format!(
                "{}/{}: select | {}: edit | {}: save | {}: test email | {}: open dashboard | {}: back",
                format_keys(&sc.prev),
                format_keys(&sc.next),
                format_keys(&sc.edit),
                format_keys(&sc.save),
                format_keys(&sc.test_send),
                format_keys(&sc.dashboard),
                format_keys(&sc.back)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::tests::test_app, worker::WorkerEvent};
    use ratatui::{Terminal, backend::TestBackend};

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_errors_render_under_fields() {
        let (mut app, _rx, _tx) = test_app();
        app.session.select_method(RefundMethod::Check);
        app.session.begin_submit();
        let (lines, _) = build_form_lines(&app);
        let text: Vec<String> = lines.iter().map(line_text).collect();
        let city = text.iter().position(|l| l.contains("City")).expect("city line");
        assert!(text[city + 1].contains("City is required"));
        assert!(text.iter().any(|l| l.contains("(•) Company Check")));
    }

    fn fill_valid(app: &mut App) {
        for (k, v) in [
            (FieldKey::FullName, "Jane"),
            (FieldKey::BookingNumber, "B1"),
            (FieldKey::Email, "jane@x.com"),
            (FieldKey::Phone, "1"),
            (FieldKey::Reason, "r"),
            (FieldKey::PaypalName, "Jane"),
            (FieldKey::PaypalEmail, "jane@pp.com"),
        ] {
            app.session.set_text(k, v.into());
        }
        app.session.select_method(RefundMethod::PayPal);
        app.session.set_signature("data:x".into());
        app.session.set_agree(true);
    }

    #[test]
    fn test_failure_message_is_shown() {
        let (mut app, _rx, _tx) = test_app();
        fill_valid(&mut app);
        app.session.begin_submit().expect("valid");
        app.session.finish_submit(Err("There was a problem submitting your request.".into()));
        let (lines, _) = build_form_lines(&app);
        assert!(lines.iter().any(|l| line_text(l).starts_with("There was a problem")));
    }

    #[test]
    fn test_status_bar_recovers_after_edit() {
        let (mut app, _rx, _tx) = test_app();
        fill_valid(&mut app);
        app.session.begin_submit().expect("valid");
        crate::app::handle_worker_event(&mut app, WorkerEvent::SubmitFinished(Err("boom".into())));
        let text = status_text(&app);
        assert_eq!(text.matches("Send failed").count(), 1);
        assert!(status_is_alert(&app));

        // 編集で失敗表示が消え、赤い強調も外れる。
        app.session.set_text(FieldKey::Phone, "555-0100".into());
        assert_eq!(app.session.state().error_message(), None);
        let text = status_text(&app);
        assert!(!text.contains("Send failed"), "{text}");
        assert!(text.contains("Ready"));
        assert!(!status_is_alert(&app));
        let (lines, _) = build_form_lines(&app);
        assert!(!lines.iter().any(|l| line_text(l).contains("boom")));
    }

    #[test]
    fn test_draw_does_not_panic_on_small_terminal() {
        let (mut app, _rx, _tx) = test_app();
        app.pad_area = layout::signature_canvas(Rect::new(0, 0, 40, 12));
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).expect("terminal");
        terminal.draw(|f| draw(f, &app)).expect("draw");
    }
}
