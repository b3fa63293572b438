// Chunk: docs/chunks/selection_rendering - Selection rendering and clipboard
//!
//! Clipboard payloads for a copied selection.
//!
//! A copy produces two renderings of the selected rectangle:
//!
//! - plain text, one line per row with trailing spaces trimmed, joined with
//!   CRLF
//! - HTML preserving colour, produced by first rendering the cells as a
//!   virtual-terminal stream (SGR colour sequences plus text) and then
//!   converting that stream
//!
//! The VT stream is parsed with `vte`, so any SGR sequence a console could
//! emit is understood, not only the ones this module writes.

use std::fmt::Write as _;

use conline_buffer::{Attr, ConsoleColor};
use vte::{Params, Parser, Perform};

/// Characters and attributes of one selected row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRow {
    pub chars: Vec<char>,
    pub attrs: Vec<Attr>,
}

impl SelectedRow {
    /// Number of cells after trimming trailing spaces.
    fn trimmed_len(&self) -> usize {
        self.chars
            .iter()
            .rposition(|&c| c != ' ')
            .map_or(0, |i| i + 1)
    }
}

/// Plain text: rows with trailing spaces trimmed, joined with CRLF.
pub fn plain_text(rows: &[SelectedRow]) -> String {
    rows.iter()
        .map(|row| row.chars[..row.trimmed_len()].iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// VT rendering: an SGR sequence at every attribute change, rows joined with
/// CRLF, reset at the end.
pub fn vt_stream(rows: &[SelectedRow]) -> String {
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            out.push_str("\r\n");
        }
        let mut last: Option<Attr> = None;
        for (&ch, &attr) in row.chars[..row.trimmed_len()].iter().zip(&row.attrs) {
            if last != Some(attr) {
                out.push_str(&attr.to_sgr());
                last = Some(attr);
            }
            out.push(ch);
        }
    }
    out.push_str("\x1b[0m");
    out
}

/// Converts a VT stream to an HTML fragment.
pub fn vt_to_html(vt: &str) -> String {
    let mut writer = HtmlWriter::new();
    let mut parser = Parser::new();
    for byte in vt.bytes() {
        parser.advance(&mut writer, byte);
    }
    writer.finish()
}

/// Builds HTML as the VT stream is parsed.
struct HtmlWriter {
    body: String,
    attr: Attr,
    /// Attribute of the currently open `<span>`, if any.
    open: Option<Attr>,
}

impl HtmlWriter {
    fn new() -> Self {
        Self {
            body: String::new(),
            attr: Attr::DEFAULT,
            open: None,
        }
    }

    fn ensure_span(&mut self) {
        if self.open == Some(self.attr) {
            return;
        }
        self.close_span();
        let _ = write!(
            self.body,
            "<span style=\"color:{};background-color:{}\">",
            self.attr.fg().html_hex(),
            self.attr.bg().html_hex()
        );
        self.open = Some(self.attr);
    }

    fn close_span(&mut self) {
        if self.open.take().is_some() {
            self.body.push_str("</span>");
        }
    }

    fn apply_sgr(&mut self, params: &Params) {
        let codes: Vec<u16> = params.iter().flat_map(|p| p.iter().copied()).collect();
        if codes.is_empty() {
            self.attr = Attr::DEFAULT;
            return;
        }
        for code in codes {
            self.attr = match code {
                0 => Attr::DEFAULT,
                30..=37 => self.attr.with_fg(ConsoleColor::from_ansi((code - 30) as u8, false)),
                90..=97 => self.attr.with_fg(ConsoleColor::from_ansi((code - 90) as u8, true)),
                39 => self.attr.with_fg(Attr::DEFAULT.fg()),
                40..=47 => self.attr.with_bg(ConsoleColor::from_ansi((code - 40) as u8, false)),
                100..=107 => self.attr.with_bg(ConsoleColor::from_ansi((code - 100) as u8, true)),
                49 => self.attr.with_bg(Attr::DEFAULT.bg()),
                _ => self.attr,
            };
        }
    }

    fn finish(mut self) -> String {
        self.close_span();
        format!(
            "<pre style=\"font-family:Consolas,'Courier New',monospace\">{}</pre>",
            self.body
        )
    }
}

impl Perform for HtmlWriter {
    fn print(&mut self, c: char) {
        self.ensure_span();
        match c {
            '<' => self.body.push_str("&lt;"),
            '>' => self.body.push_str("&gt;"),
            '&' => self.body.push_str("&amp;"),
            '"' => self.body.push_str("&quot;"),
            _ => self.body.push(c),
        }
    }

    fn execute(&mut self, byte: u8) {
        if byte == b'\n' {
            self.close_span();
            self.body.push('\n');
        }
    }

    fn csi_dispatch(&mut self, params: &Params, _intermediates: &[u8], ignore: bool, action: char) {
        if action == 'm' && !ignore {
            self.apply_sgr(params);
        }
    }
}
