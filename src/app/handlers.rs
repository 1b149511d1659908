//! キー入力・マウス入力ハンドラー関数。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::{
    admin,
    events::{FormItem, Screen, form_items},
    input::{InputBoxState, InputCallbackId},
    modal,
    refund::RefundMethod,
    shortcuts::matches_shortcut,
    submission::SubmissionState,
    worker::WorkerCmd,
};

use super::App;

/// キー入力を1件処理し、終了すべきならtrueを返す。
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 入力ボックスが開いていれば最優先で処理する。
    if app.input_box.is_some() {
        return handle_input_box_key(app, k);
    }

    match app.ui.screen {
        // 成功後は結果モーダルが前面に出る。
        Screen::Form if *app.session.state() == SubmissionState::Succeeded => {
            handle_modal_key(app, k);
            Ok(false)
        }
        Screen::Form => handle_form_key(app, k).await,
        Screen::Admin => handle_admin_key(app, k).await,
    }
}

/// Ctrl+Cかどうかを判定する。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// フォーム画面のキー処理。
async fn handle_form_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = app.shortcuts.form.clone();
    let items = form_items(app.session.request().refund_method);
    app.ui.focus = app.ui.focus.min(items.len() - 1);
    let item = items[app.ui.focus];

    if matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if matches_shortcut(&k, &sc.admin) {
        // 管理画面へ遷移し、編集バッファを読み直す。
        app.admin.reload(&app.cfg);
        app.ui.screen = Screen::Admin;
        app.ui.error = None;
        app.ui.status = "Admin".into();
    } else if matches_shortcut(&k, &sc.next) {
        app.ui.focus = (app.ui.focus + 1) % items.len();
    } else if matches_shortcut(&k, &sc.prev) {
        app.ui.focus = (app.ui.focus + items.len() - 1) % items.len();
    } else if matches_shortcut(&k, &sc.submit) {
        submit(app).await?;
    } else if matches_shortcut(&k, &sc.toggle_agree) {
        toggle_agree(app);
    } else if matches_shortcut(&k, &sc.clear_signature) {
        clear_signature(app);
    } else if item == FormItem::Method && matches_shortcut(&k, &sc.method_next) {
        cycle_method(app, true);
    } else if item == FormItem::Method && matches_shortcut(&k, &sc.method_prev) {
        cycle_method(app, false);
    } else if matches_shortcut(&k, &sc.activate) {
        match item {
            FormItem::Text(key) => {
                let value = app.session.request().text(key).unwrap_or_default();
                app.input_box = Some(
                    InputBoxState::new(
                        format!("{}:", key.label()),
                        value,
                        InputCallbackId::Field(key),
                    )
                    .with_hint(key.placeholder()),
                );
            }
            FormItem::Method => cycle_method(app, true),
            FormItem::Signature => {
                app.ui.status = "Draw your signature in the pad with the mouse".into();
            }
            FormItem::Agree => toggle_agree(app),
            FormItem::Submit => submit(app).await?,
        }
    }

    Ok(false)
}

/// 送信ボタン。送信中は何もしない。検証エラー時は最初のエラー項目へ移動する。
async fn submit(app: &mut App) -> Result<()> {
    if let Some(sub) = app.session.begin_submit() {
        app.worker_tx.send(WorkerCmd::Submit(sub)).await?;
        app.ui.status = "Sending refund request...".into();
        return Ok(());
    }
    if *app.session.state() == SubmissionState::Submitting {
        return Ok(());
    }
    let errors = app.session.errors();
    let items = form_items(app.session.request().refund_method);
    if let Some(pos) = items
        .iter()
        .position(|it| it.field().is_some_and(|f| errors.contains_key(&f)))
    {
        app.ui.focus = pos;
    }
    app.ui.status = format!("Please correct {} highlighted field(s)", errors.len());
    Ok(())
}

fn toggle_agree(app: &mut App) {
    let agree = !app.session.request().agree_to_terms;
    app.session.set_agree(agree);
}

fn cycle_method(app: &mut App, forward: bool) {
    let next = RefundMethod::cycle(app.session.request().refund_method, forward);
    app.session.select_method(next);
    app.ui.status = format!("{}: {}", next.label(), next.description());
}

fn clear_signature(app: &mut App) {
    let value = app.pad.clear();
    app.session.set_signature(value);
}

/// 結果モーダルのキー処理。
fn handle_modal_key(app: &mut App, k: KeyEvent) {
    let sc = &app.shortcuts.modal;
    if matches_shortcut(&k, &sc.download) {
        if let Some(receipt) = app.session.receipt() {
            app.ui.status = modal::download_receipt(&receipt);
        }
    } else if matches_shortcut(&k, &sc.close) && app.session.dismiss_result() {
        // フォームが空に戻るので署名パッドとフォーカスも初期化する。
        app.pad.clear();
        app.ui.focus = 0;
        app.ui.status = "Form cleared".into();
    }
}

/// 管理画面のキー処理。
async fn handle_admin_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = app.shortcuts.admin.clone();

    if matches_shortcut(&k, &sc.back) {
        // 保存していない編集は破棄してフォームへ戻る。
        app.admin.reload(&app.cfg);
        app.ui.screen = Screen::Form;
        app.ui.error = None;
        app.ui.status.clear();
    } else if matches_shortcut(&k, &sc.next) {
        app.admin.select_next();
    } else if matches_shortcut(&k, &sc.prev) {
        app.admin.select_prev();
    } else if matches_shortcut(&k, &sc.edit) {
        let field = app.admin.selected_field();
        app.input_box = Some(InputBoxState::new(
            format!("{}:", field.label()),
            app.admin.draft.get(field),
            InputCallbackId::Setting(field),
        ));
    } else if matches_shortcut(&k, &sc.save) {
        // 編集バッファを設定へ反映して保存し、Workerのプロバイダを作り直す。
        app.admin.draft.apply(&mut app.cfg);
        app.cfg.save(&app.cfg_path)?;
        app.worker_tx
            .send(WorkerCmd::ApplySettings(app.cfg.clone()))
            .await?;
        tracing::info!("settings saved to {}", app.cfg_path.display());
        app.ui.status = "Saved settings".into();
    } else if matches_shortcut(&k, &sc.test_send) {
        if app.admin.begin_test() {
            app.worker_tx.send(WorkerCmd::SendTest).await?;
            app.ui.status = "Sending test email...".into();
        }
    } else if matches_shortcut(&k, &sc.dashboard) {
        match admin::open_dashboard() {
            Ok(()) => app.ui.error = None,
            Err(e) => {
                tracing::warn!("failed to open browser: {e}");
                app.ui.error = Some(format!("Could not open {}: {e}", admin::DASHBOARD_URL));
            }
        }
    }

    Ok(false)
}

/// 入力ボックスのキー処理。
fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };
    let sc = &app.shortcuts.input_box;

    // 入力ボックス中でもCtrl+Cで終了できるようにする。
    if is_ctrl_c(&k) {
        return Ok(true);
    }

    if matches_shortcut(&k, &sc.confirm) {
        let value = input_state.value.clone();
        let callback_id = input_state.callback_id;
        app.input_box = None;
        apply_input_callback(app, callback_id, value);
    } else if matches_shortcut(&k, &sc.cancel) {
        app.input_box = None;
    } else if matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        input_state.insert_char(c);
    }

    Ok(false)
}

/// 入力ボックスのコールバックを適用する。
fn apply_input_callback(app: &mut App, callback_id: InputCallbackId, value: String) {
    match callback_id {
        InputCallbackId::Field(key) => app.session.set_text(key, value),
        InputCallbackId::Setting(field) => app.admin.draft.set(field, value),
    }
}

/// マウスイベントを署名パッドへ渡す。
pub fn handle_mouse(app: &mut App, m: MouseEvent) {
    // モーダルや入力ボックスが前面にある間は描かせない。
    if app.ui.screen != Screen::Form
        || app.input_box.is_some()
        || *app.session.state() == SubmissionState::Succeeded
    {
        return;
    }
    let point = app.pad.point_from_cell(app.pad_area, m.column, m.row);
    match m.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(p) = point {
                app.pad.pointer_down(p);
                let items = form_items(app.session.request().refund_method);
                if let Some(pos) = items.iter().position(|it| *it == FormItem::Signature) {
                    app.ui.focus = pos;
                }
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => match point {
            Some(p) => {
                if let Some(uri) = app.pad.pointer_move(p) {
                    app.session.set_signature(uri);
                }
            }
            None => app.pad.pointer_leave(),
        },
        MouseEventKind::Up(MouseButton::Left) => app.pad.pointer_up(),
        // ボタンを離した状態の移動：パッド外で離されたとみなす。
        MouseEventKind::Moved if app.pad.is_drawing() => app.pad.pointer_up(),
        _ => {}
    }
}
