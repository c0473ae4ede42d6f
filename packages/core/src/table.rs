//! Text tables for page listings, plus the search helpers shared by every
//! page filter.

use std::fmt;

use crate::format::format_brl;

/// Reverse video, the terminal counterpart of a `<mark>` highlight.
pub const MARK_OPEN: &str = "\x1b[7m";
pub const MARK_CLOSE: &str = "\x1b[0m";

/// Free-text search fires with an empty box (show everything) or from the
/// second character on.
pub fn should_auto_search(term: &str) -> bool {
    let len = term.trim().chars().count();
    len == 0 || len >= 2
}

/// Byte length of the prefix of `hay` that matches `needle` ignoring case.
fn match_len(hay: &str, needle: &str) -> Option<usize> {
    let mut hay_chars = hay.char_indices();
    for n in needle.chars() {
        let (_, h) = hay_chars.next()?;
        if !h.to_lowercase().eq(n.to_lowercase()) {
            return None;
        }
    }
    Some(hay_chars.next().map(|(i, _)| i).unwrap_or(hay.len()))
}

/// Wrap every case-insensitive occurrence of `term` in `open`/`close`.
pub fn highlight_with(text: &str, term: &str, open: &str, close: &str) -> String {
    let term = term.trim();
    if term.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        match match_len(rest, term) {
            Some(len) => {
                out.push_str(open);
                out.push_str(&rest[..len]);
                out.push_str(close);
                rest = &rest[len..];
            }
            None => {
                let ch_len = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                out.push_str(&rest[..ch_len]);
                rest = &rest[ch_len..];
            }
        }
    }
    out
}

pub fn highlight(text: &str, term: &str) -> String {
    highlight_with(text, term, MARK_OPEN, MARK_CLOSE)
}

/// Row count and summed value shown under a listing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub count: usize,
    pub amount: f64,
}

impl Totals {
    pub fn from_amounts<I>(amounts: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        amounts.into_iter().fold(Totals::default(), |acc, a| Totals {
            count: acc.count + 1,
            amount: acc.amount + a,
        })
    }

    pub fn count_label(&self) -> String {
        format!("Total: {}", self.count)
    }

    pub fn amount_label(&self) -> String {
        format_brl(self.amount)
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.count_label(), self.amount_label())
    }
}

/// Headers plus rows of already-formatted cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    empty_message: String,
}

impl TableView {
    pub fn new<I, S>(headers: I, empty_message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            empty_message: empty_message.into(),
        }
    }

    /// Missing cells render empty; extra cells are dropped.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| display_width(h)).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(display_width(cell));
            }
        }
        widths
    }
}

/// Width on screen: characters, not counting highlight escape codes.
fn display_width(cell: &str) -> usize {
    cell.replace(MARK_OPEN, "").replace(MARK_CLOSE, "").chars().count()
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            f.write_str("  ")?;
        }
        f.write_str(cell)?;
        let pad = width.saturating_sub(display_width(cell));
        if i + 1 < cells.len() {
            write!(f, "{:pad$}", "", pad = pad)?;
        }
    }
    writeln!(f)
}

impl fmt::Display for TableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "{}", self.empty_message);
        }

        let widths = self.widths();
        write_row(f, &self.headers, &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_row(f, &rule, &widths)?;
        for row in &self.rows {
            write_row(f, row, &widths)?;
        }
        Ok(())
    }
}
