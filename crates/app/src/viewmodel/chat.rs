//! Chat view model

use std::collections::HashSet;

use emoji_guess_core::{ChatEntry, ChatLine};

/// Displayed chat log, deduplicated by entry id and ordered by timestamp
#[derive(Debug, Default)]
pub struct ChatViewModel {
    lines: Vec<ChatLine>,
    seen: HashSet<String>,
}

impl ChatViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a chat snapshot, returning the lines not shown before
    pub fn merge(&mut self, entries: &[ChatEntry]) -> Vec<ChatLine> {
        let mut added: Vec<ChatLine> = entries
            .iter()
            .filter(|e| self.seen.insert(e.id.clone()))
            .map(ChatLine::from)
            .collect();
        if added.is_empty() {
            return added;
        }

        added.sort_by_key(|l| l.timestamp);
        self.lines.extend(added.iter().cloned());
        self.lines.sort_by_key(|l| l.timestamp);
        added
    }

    pub fn lines(&self) -> &[ChatLine] {
        &self.lines
    }
}

/// One-line rendering used by the table log
pub fn render_line(line: &ChatLine) -> String {
    if line.is_system {
        format!("[{}] * {}", line.format_timestamp(), line.text)
    } else {
        format!("[{}] {}: {}", line.format_timestamp(), line.sender_name, line.text)
    }
}
