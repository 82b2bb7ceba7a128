//! Formats a report into chat-sized text blocks.

use crate::calculator::MISSING_RECOMMENDATIONS;
use crate::report::{AvatarReport, ReportSection};
use crate::texts;

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Renders the report as a sequence of messages: the overview, one message
/// per section, then the closing block.
pub fn render_chat_messages(report: &AvatarReport, consultation_url: &str) -> Vec<String> {
    let mut messages = Vec::with_capacity(report.sections.len() + 2);
    messages.push(format!("{}\n\n{}", texts::OVERVIEW, report.date_line()));
    for section in &report.sections {
        messages.extend(split_for_chat(&render_section(section)));
    }
    messages.push(format!(
        "{}\n\n{}",
        texts::WHAT_CAN_CHANGE,
        texts::final_block(consultation_url)
    ));
    messages
}

fn render_section(section: &ReportSection) -> String {
    let mut text = format!(
        "{} {}: {} ({})\n\n{}\n\n{}",
        section.block.emoji(),
        section.heading().to_uppercase(),
        section.avatar_title,
        section.index,
        section.intro,
        section.description,
    );

    let Some(recommendations) = &section.recommendations else {
        return text;
    };
    text.push_str("\n\n");
    text.push_str(&section.recommendations_heading());
    text.push('\n');
    if recommendations.is_empty() {
        text.push_str(MISSING_RECOMMENDATIONS);
    } else {
        let bullets: Vec<String> = recommendations
            .iter()
            .map(|item| format!("• {item}"))
            .collect();
        text.push_str(&bullets.join("\n"));
    }
    text
}

/// Splits on line boundaries so that no part exceeds the chat limit.
fn split_for_chat(text: &str) -> Vec<String> {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        let extra = if current.is_empty() { 0 } else { 1 };
        if current.chars().count() + extra + line.chars().count() > MAX_MESSAGE_CHARS
            && !current.is_empty()
        {
            parts.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        // A single overlong line is cut by characters.
        let mut chars: Vec<char> = line.chars().collect();
        while chars.len() > MAX_MESSAGE_CHARS {
            let rest = chars.split_off(MAX_MESSAGE_CHARS);
            parts.push(chars.into_iter().collect());
            chars = rest;
        }
        current.extend(chars);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
