use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use serde_json::Value;

use crate::core::error::AppError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 6.0;
/// Characters per line at 10pt; larger text wraps proportionally earlier
const WRAP_AT: usize = 95;

/// A titled block of plain text lines
#[derive(Debug, Clone, Default)]
pub struct ReportSection {
    pub heading: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PdfReport {
    pub title: String,
    pub subtitle: Option<String>,
    pub sections: Vec<ReportSection>,
}

fn pdf_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Internal(format!("Failed to build PDF: {}", e))
}

/// Writes lines top to bottom, starting a new page when the current one is full
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PageCursor<'_> {
    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        if self.y < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.layer
            .use_text(text, size, Mm(MARGIN), Mm(self.y), font);
        self.y -= LINE_HEIGHT * (size / 10.0).max(1.0);
    }

    /// Write `text` over as many lines as its size needs
    fn wrapped(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        for chunk in wrap(text, wrap_width(size)) {
            self.line(&chunk, size, font);
        }
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT / 2.0;
    }
}

/// Render a text-only A4 report
pub fn render_pdf(report: &PdfReport) -> Result<Vec<u8>, AppError> {
    let (doc, page, layer) =
        PdfDocument::new(report.title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;

    {
        let mut cursor = PageCursor {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT - MARGIN,
        };

        cursor.wrapped(&report.title, 18.0, &bold);
        if let Some(subtitle) = &report.subtitle {
            cursor.wrapped(subtitle, 10.0, &regular);
        }
        cursor.gap();

        for section in &report.sections {
            cursor.gap();
            cursor.wrapped(&section.heading, 13.0, &bold);
            if section.lines.is_empty() {
                cursor.line("(none)", 10.0, &regular);
            }
            for line in &section.lines {
                cursor.wrapped(line, 10.0, &regular);
            }
        }
    }

    doc.save_to_bytes().map_err(pdf_err)
}

/// Flatten a JSON value into `key: value` lines
pub fn json_lines(value: &Value) -> Vec<String> {
    let mut lines = Vec::new();
    flatten(value, "", &mut lines);
    lines
}

fn flatten(value: &Value, prefix: &str, out: &mut Vec<String>) {
    let key = |k: &str| {
        if prefix.is_empty() {
            k.to_string()
        } else {
            format!("{}.{}", prefix, k)
        }
    };

    match value {
        Value::Object(map) => {
            for (k, v) in map {
                flatten(v, &key(k), out);
            }
        }
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => {
            let joined = items.iter().map(scalar).collect::<Vec<_>>().join(", ");
            out.push(format!("{}: {}", prefix, joined));
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten(v, &key(&i.to_string()), out);
            }
        }
        other if prefix.is_empty() => out.push(scalar(other)),
        other => out.push(format!("{}: {}", prefix, scalar(other))),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn wrap_width(size: f32) -> usize {
    ((WRAP_AT as f32 * 10.0 / size.max(1.0)) as usize).max(1)
}

/// Greedy word wrap; words longer than `width` are cut into `width`-char pieces
fn wrap(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(width) {
            let current_len = current.chars().count();
            if current_len > 0 && current_len + 1 + piece.len() > width {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.extend(piece);
        }
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_produces_pdf() {
        let report = PdfReport {
            title: "Analysis report".to_string(),
            subtitle: Some("sales.xlsx".to_string()),
            sections: vec![
                ReportSection {
                    heading: "Overview".to_string(),
                    lines: vec!["Rows: 16".to_string(), "Columns: 3".to_string()],
                },
                ReportSection {
                    heading: "Chart".to_string(),
                    lines: (0..200).map(|i| format!("Label {}: {}", i, i * 2)).collect(),
                },
            ],
        };

        let bytes = render_pdf(&report).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_json_lines() {
        let lines = json_lines(&json!({
            "summary": "steady growth",
            "stats": { "mean": 4.5, "tags": ["a", "b"] },
            "missing": null
        }));

        assert!(lines.contains(&"summary: steady growth".to_string()));
        assert!(lines.contains(&"stats.mean: 4.5".to_string()));
        assert!(lines.contains(&"stats.tags: a, b".to_string()));
        assert!(lines.contains(&"missing: -".to_string()));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let path = "x".repeat(250);
        let chunks = wrap(&format!("see {}", path), WRAP_AT);
        assert!(chunks.iter().all(|c| c.chars().count() <= WRAP_AT));
        assert_eq!(chunks.concat().replace(' ', ""), format!("see{}", path));

        assert_eq!(wrap("abcdefg hi", 3), vec!["abc", "def", "g", "hi"]);
        assert_eq!(wrap("ééééé", 2), vec!["éé", "éé", "é"]);
    }

    #[test]
    fn test_larger_text_wraps_earlier() {
        assert_eq!(wrap_width(10.0), WRAP_AT);
        assert!(wrap_width(18.0) < wrap_width(13.0));
        assert!(wrap_width(13.0) < WRAP_AT);
    }

    #[test]
    fn test_render_long_title_and_heading() {
        let report = PdfReport {
            title: format!("Analysis report: {}.xlsx", "quarterly_".repeat(30)),
            subtitle: None,
            sections: vec![ReportSection {
                heading: "h".repeat(300),
                lines: vec!["y".repeat(1000)],
            }],
        };
        assert!(render_pdf(&report).unwrap().starts_with(b"%PDF"));
    }
}
