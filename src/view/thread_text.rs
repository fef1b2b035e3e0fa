//! Plain-text thread rendering.

use std::io::Write;

use chrono::{FixedOffset, Offset, Utc};
use tracing::warn;

use super::{ThreadPresenter, ThreadView};
use crate::text::{html_to_text, wrap_text};
use crate::thread::{ThreadNode, ThreadSlice, Toggle};

const INDENT: &str = "  ";
const MARK: &str = "> ";
const NO_MARK: &str = "  ";

/// Writes each view as indented text to `out`.
pub struct TextPresenter<W: Write> {
    out: W,
    offset: FixedOffset,
    width: usize,
}

impl<W: Write> TextPresenter<W> {
    /// `utc_offset_minutes` out of range falls back to UTC.
    pub fn new(out: W, utc_offset_minutes: i32, width: usize) -> Self {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self { out, offset, width }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render `view` to a string without writing it.
    #[must_use]
    pub fn render(&self, view: &ThreadView<'_>) -> String {
        let mut lines = vec![format!("Comments on {}", view.entity)];
        if view.threads.is_empty() {
            lines.push("No comments yet.".to_string());
        }
        for thread in &view.threads {
            lines.push(String::new());
            self.render_thread(view, thread, &mut lines);
        }
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    fn render_thread(&self, view: &ThreadView<'_>, thread: &ThreadSlice<'_>, lines: &mut Vec<String>) {
        self.render_node(view, thread.root, 0, lines);
        for branch in &thread.replies {
            self.render_node(view, branch.reply, 1, lines);
            for nested in &branch.nested {
                self.render_node(view, nested, 1, lines);
            }
        }
        match thread.toggle {
            Some(Toggle::Collapsed { .. }) => lines.push(format!(
                "{NO_MARK}{INDENT}[+] show all {} replies",
                thread.reply_count
            )),
            Some(Toggle::Expanded) => {
                lines.push(format!("{NO_MARK}{INDENT}[-] collapse replies"));
            }
            None => {}
        }
        if let Some(pager) = thread.pager {
            lines.push(format!(
                "{NO_MARK}{INDENT}page {}/{}",
                pager.page, pager.page_count
            ));
        }
    }

    /// Depth below the root is clamped to one indent level.
    fn render_node(&self, view: &ThreadView<'_>, node: &ThreadNode, level: usize, lines: &mut Vec<String>) {
        let mark = if view.highlight == Some(node.id()) { MARK } else { NO_MARK };
        let indent = INDENT.repeat(level.min(1));
        let arrow = if level > 0 {
            view.parent_label(node.id())
                .map(|label| format!(" -> {label}"))
                .unwrap_or_default()
        } else {
            String::new()
        };
        let stamp = node
            .created_at()
            .with_timezone(&self.offset)
            .format("%Y-%m-%d %H:%M:%S");
        lines.push(format!(
            "{mark}{indent}#{} {}{arrow}  {stamp}",
            node.id(),
            node.record.author_label()
        ));

        let body_indent = format!("{NO_MARK}{indent}{INDENT}");
        let width = self.width.saturating_sub(body_indent.chars().count()).max(1);
        for line in wrap_text(&html_to_text(&node.display_content), width) {
            if line.is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{body_indent}{line}"));
            }
        }
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            warn!(error = %err, "failed to write comments");
        }
    }
}

impl<W: Write> ThreadPresenter for TextPresenter<W> {
    fn present(&mut self, view: &ThreadView<'_>) {
        let text = self.render(view);
        self.emit(&text);
    }

    fn load_failed(&mut self, message: &str) {
        self.emit(&format!("Comments failed to load: {message}\n"));
    }
}
