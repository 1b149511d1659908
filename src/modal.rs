//! 送信成功時の結果モーダル。

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::{input::centered_popup, submission::Receipt};

/// 見出し。
pub const HEADLINE: &str = "Request Submitted Successfully!";

/// 「次に起こること」の箇条書き。
pub const WHATS_NEXT: [&str; 3] = [
    "Confirmation email sent to your inbox",
    "Our team will review your request within 2-3 business days",
    "You'll receive updates via email throughout the process",
];

/// 処理期間の注記。
pub const PROCESSING_NOTE: &str = "Processing time: Up to 30 business days";

/// 控えのダウンロード要求に対するステータス文言（未対応）。
pub fn download_receipt(receipt: &Receipt) -> String {
    tracing::info!("receipt download requested for {}", receipt.reference);
    format!(
        "Receipt download is not available in this version (reference {})",
        receipt.reference
    )
}

/// モーダル本文の行を組み立てる。
pub fn body_lines(receipt: &Receipt) -> Vec<String> {
    let mut lines = vec![
        "Your refund request has been received and is being processed.".to_string(),
        "You'll receive a confirmation email shortly.".to_string(),
        String::new(),
        "What's Next?".to_string(),
    ];
    lines.extend(WHATS_NEXT.iter().map(|s| format!("  • {s}")));
    lines.push(String::new());
    lines.push(PROCESSING_NOTE.to_string());
    if let Some(m) = receipt.method {
        lines.push(format!("Refund method: {} ({})", m.label(), m.description()));
    }
    lines.push(String::new());
    lines.push(format!("Reference: {}", receipt.reference));
    lines.push(format!("Submitted: {}", receipt.submitted_at));
    lines.push(format!("Confirmation to: {}", receipt.customer_email));
    lines.push(format!("Signature: {}", receipt.signature_fingerprint));
    lines
}

/// 結果モーダルを中央に重ねて描画する。
pub fn render_result_modal(f: &mut Frame, receipt: &Receipt, help: &str) {
    let lines = body_lines(receipt);
    // 見出し・本文・ヘルプ・枠線ぶんの高さを確保する。
    let height = (lines.len() as u16 + 6).min(f.area().height);
    let area = centered_popup(f.area(), 70, height);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Submitted")
        .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // 見出し
            Constraint::Min(1),    // 本文
            Constraint::Length(1), // ヘルプ
        ])
        .split(inner);

    let headline = Paragraph::new(HEADLINE)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(headline, chunks[0]);

    let body = Paragraph::new(lines.join("\n")).wrap(Wrap { trim: false });
    f.render_widget(body, chunks[1]);

    let help = Paragraph::new(help.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    f.render_widget(help, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refund::RefundMethod;
    use uuid::Uuid;

    fn receipt() -> Receipt {
        Receipt {
            reference: Uuid::nil(),
            submitted_at: "2026-01-02 10:30".into(),
            customer_email: "jane@x.com".into(),
            method: Some(RefundMethod::Venmo),
            signature_fingerprint: "abcdefgh12345678".into(),
        }
    }

    #[test]
    fn test_body_lists_reference_and_next_steps() {
        let lines = body_lines(&receipt());
        assert!(lines.iter().any(|l| l.contains(WHATS_NEXT[1])));
        assert!(lines.iter().any(|l| l == PROCESSING_NOTE));
        assert!(lines.iter().any(|l| l.starts_with("Refund method: Venmo")));
        assert!(lines.iter().any(|l| l.ends_with("abcdefgh12345678")));
        assert!(lines.iter().any(|l| l.contains(&Uuid::nil().to_string())));
    }

    #[test]
    fn test_download_is_a_stub() {
        let msg = download_receipt(&receipt());
        assert!(msg.contains("not available"));
    }
}
