//! TUIのイベントループ、入力処理、状態管理。

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::layout::Rect;
use std::{path::PathBuf, time::Duration};
use tokio::sync::mpsc;

use crate::{
    admin::AdminState,
    config::Config,
    events::{Screen, UiState},
    input::InputBoxState,
    layout,
    shortcuts::Shortcuts,
    signature::SignaturePad,
    submission::FormSession,
    ui::Tui,
    worker::{self, WorkerCmd, WorkerEvent},
};

use handlers::{handle_key, handle_mouse, is_ctrl_c};
use render::draw;

/// ログパネルに保持する最大行数。
const LOG_CAPACITY: usize = 200;

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// 永続化された設定ファイルのパス。
    pub cfg_path: PathBuf,
    /// メモリ上の現在設定。
    pub cfg: Config,
    /// フォーカスやステータスなどUI固有の状態。
    pub ui: UiState,
    /// 入力値・検証結果・送信状態。
    pub session: FormSession,
    /// 署名パッド（マウスイベントだけが書き込む）。
    pub pad: SignaturePad,
    /// 署名パッドの描画面（端末セル座標）。
    pub pad_area: Rect,
    /// 管理画面の状態。
    pub admin: AdminState,
    /// Workerへのコマンド送信チャネル。
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Workerからのイベント受信チャネル。
    pub worker_rx: mpsc::Receiver<WorkerEvent>,
    /// 入力ボックスの状態（入力中はSome）。
    pub input_box: Option<InputBoxState>,
    /// ショートカットキー設定。
    pub shortcuts: Shortcuts,
}

impl App {
    pub fn new(
        cfg_path: PathBuf,
        cfg: Config,
        shortcuts: Shortcuts,
        worker_tx: mpsc::Sender<WorkerCmd>,
        worker_rx: mpsc::Receiver<WorkerEvent>,
    ) -> Self {
        let mut ui = UiState::new(Screen::Form);
        if !cfg.provider.is_configured() {
            ui.status = format!(
                "Email provider not configured (press {} for admin)",
                shortcuts.form.admin.join("/")
            );
        }
        Self {
            pad: SignaturePad::new(cfg.signature.width),
            admin: AdminState::new(&cfg),
            cfg_path,
            cfg,
            ui,
            session: FormSession::new(),
            pad_area: Rect::default(),
            worker_tx,
            worker_rx,
            input_box: None,
            shortcuts,
        }
    }

    /// ログを追加する（古いものから捨てる）。
    pub fn push_log(&mut self, line: String) {
        self.ui.log.push(line);
        if self.ui.log.len() > LOG_CAPACITY {
            let overflow = self.ui.log.len() - LOG_CAPACITY;
            self.ui.log.drain(..overflow);
        }
    }
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    // 設定ファイルを読み込む（初回はデフォルトを生成）。
    let cfg_path = PathBuf::from("config.toml");
    let cfg = Config::load_or_default(&cfg_path)?;

    // ショートカット設定を読み込む（無ければデフォルト）。
    let shortcuts = Shortcuts::load_or_default("shortcut.toml")?;

    // Worker通信用のコマンド/イベントチャネルを作る。
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);

    // 起動時にプロバイダを初期化し、Workerへ渡す。
    tokio::spawn(worker::run(rx_cmd, tx_ev, worker::emailjs_mailer(&cfg)));

    let mut app = App::new(cfg_path, cfg, shortcuts, tx_cmd, rx_ev);

    loop {
        // 署名パッドの位置は端末サイズから決まる。描画前に更新する。
        let size = terminal.size()?;
        app.pad_area = layout::signature_canvas(Rect::new(0, 0, size.width, size.height));

        terminal.draw(|f| draw(f, &app))?;

        // 入力処理の前にWorkerイベントを消化する。
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev);
        }

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(k) if k.kind == KeyEventKind::Press => {
                    // どの画面でもCtrl+Cで終了できるようにする。
                    if is_ctrl_c(&k) {
                        break;
                    }
                    if handle_key(&mut app, k).await? {
                        break;
                    }
                }
                Event::Mouse(m) => handle_mouse(&mut app, m),
                _ => {}
            }
        }
    }
    Ok(())
}

/// WorkerイベントをUI状態へ反映する。
fn handle_worker_event(app: &mut App, ev: WorkerEvent) {
    match ev {
        WorkerEvent::SubmitFinished(outcome) => {
            let ok = outcome.is_ok();
            app.session.finish_submit(outcome);
            // 失敗はフォームとステータスラベルに出るので、ここには残さない。
            if ok {
                tracing::info!("submission succeeded");
                app.ui.status = "Refund request sent".into();
            } else {
                app.ui.status.clear();
            }
        }
        WorkerEvent::TestFinished(res) => {
            app.ui.status = match &res {
                Ok(_) => "Test email sent".into(),
                Err(_) => "Test email failed".into(),
            };
            app.admin.finish_test(res);
        }
        WorkerEvent::Log(s) => app.push_log(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::SubmissionState;

    pub(super) fn test_app() -> (App, mpsc::Receiver<WorkerCmd>, mpsc::Sender<WorkerEvent>) {
        let (tx_cmd, rx_cmd) = mpsc::channel(8);
        let (tx_ev, rx_ev) = mpsc::channel(8);
        let path =
            std::env::temp_dir().join(format!("refund_tui_app_{}.toml", uuid::Uuid::new_v4()));
        let mut app = App::new(path, Config::default(), Shortcuts::default(), tx_cmd, rx_ev);
        app.pad_area = Rect::new(10, 5, 60, 10);
        (app, rx_cmd, tx_ev)
    }

    #[test]
    fn test_unconfigured_provider_is_flagged() {
        let (app, _rx, _tx) = test_app();
        assert!(app.ui.status.contains("not configured"));
        assert_eq!(app.ui.screen, Screen::Form);
    }

    #[test]
    fn test_log_is_bounded() {
        let (mut app, _rx, _tx) = test_app();
        for i in 0..(LOG_CAPACITY + 5) {
            app.push_log(format!("line {i}"));
        }
        assert_eq!(app.ui.log.len(), LOG_CAPACITY);
        assert_eq!(app.ui.log[0], "line 5");
    }

    #[test]
    fn test_late_result_is_ignored() {
        let (mut app, _rx, _tx) = test_app();
        handle_worker_event(&mut app, WorkerEvent::SubmitFinished(Ok(())));
        assert_eq!(app.session.state(), &SubmissionState::Idle);
    }
}
