//! Reusable UI component helpers

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::{header, inactive, success, text, text_dim, warning};
use crate::reimbursement::Reimbursement;

/// Bordered card height: five fields plus top and bottom border
pub const CARD_HEIGHT: u16 = 7;

/// Empty and missing values both fall back
fn or_fallback<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(fallback)
}

/// Amount as shown on a card; blank and missing print `0.00`
pub fn card_amount(record: &Reimbursement) -> String {
    let amount = record
        .amount()
        .filter(|a| !a.is_blank())
        .map(|a| a.as_str());
    format!("{} FRW", amount.unwrap_or("0.00"))
}

fn field<'a>(label: &'a str, value: String, value_style: Style) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(header()).add_modifier(Modifier::BOLD)),
        Span::styled(value, value_style),
    ])
}

/// One reimbursement as a bordered card
pub fn reimbursement_card(record: &Reimbursement) -> Paragraph<'static> {
    let plain = Style::default().fg(text());
    let status_color = if record.is_paid { success() } else { warning() };

    let lines = vec![
        field("Expense Category", or_fallback(record.category(), "N/A").to_string(), plain),
        field("Driver", or_fallback(record.phone_number(), "N/A").to_string(), plain),
        field("Amount", card_amount(record), plain),
        field("Status", record.status_label().to_string(), Style::default().fg(status_color)),
        field("Date", or_fallback(record.date(), "N/A").to_string(), Style::default().fg(text_dim())),
    ];

    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(inactive())),
    )
}
