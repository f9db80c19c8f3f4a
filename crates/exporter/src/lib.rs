//! Structured-document exporter
//!
//! Parses the assembled article's line-oriented markup into typed
//! blocks and renders those blocks into presentation formats. The
//! parser is a single pass with one line of lookahead and is
//! deliberately forgiving: anything it does not recognize degrades to a
//! plain paragraph instead of failing.

mod html;
mod text;

pub use html::render_html;
pub use text::render_text;

use std::path::{Path, PathBuf};
use tracing::{error, info};

/// One run of styled-paragraph text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub strong: bool,
}

impl TextRun {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            strong: false,
        }
    }

    fn strong(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            strong: true,
        }
    }
}

/// A typed block of the parsed document
#[derive(Debug, Clone, PartialEq)]
pub enum ExportBlock {
    /// Heading at nesting level 1-3
    Heading { level: u8, text: String },
    /// Image reference; a styled caption line immediately after the
    /// reference is folded into this block
    Image { path: String, caption: String },
    /// Emphasis-only line, rendered as a standalone styled note
    Note { text: String },
    /// Paragraph containing inline strong-emphasis spans
    Styled { runs: Vec<TextRun> },
    /// Plain paragraph with residual emphasis markers stripped
    Paragraph { text: String },
}

/// Target rendering formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Text,
}

impl ExportFormat {
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Html => "article.html",
            ExportFormat::Text => "article.txt",
        }
    }
}

/// Parse line-oriented markup into typed blocks
///
/// Recognized forms, in match order: `#`/`##`/`###` headings,
/// `![caption](path)` image lines (with an immediately following
/// `*caption*` line consumed into the same block), lines containing
/// `**strong**` spans, emphasis-only `*note*` lines, and plain
/// paragraphs. Blank lines are separators and produce no block.
#[must_use]
pub fn parse_blocks(source: &str) -> Vec<ExportBlock> {
    let lines: Vec<&str> = source.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            i += 1;
            continue;
        }

        if let Some(text) = line.strip_prefix("### ") {
            blocks.push(ExportBlock::Heading {
                level: 3,
                text: text.to_string(),
            });
        } else if let Some(text) = line.strip_prefix("## ") {
            blocks.push(ExportBlock::Heading {
                level: 2,
                text: text.to_string(),
            });
        } else if let Some(text) = line.strip_prefix("# ") {
            blocks.push(ExportBlock::Heading {
                level: 1,
                text: text.to_string(),
            });
        } else if line.starts_with("![") {
            match parse_image_line(line) {
                Some((caption, path)) => {
                    // Fold an immediately following styled caption line
                    // into the image block instead of re-emitting it
                    if lines
                        .get(i + 1)
                        .map(|next| is_emphasis_only(next.trim()))
                        .unwrap_or(false)
                    {
                        i += 1;
                    }
                    blocks.push(ExportBlock::Image { path, caption });
                }
                None => blocks.push(plain_paragraph(line)),
            }
        } else if line.contains("**") {
            blocks.push(ExportBlock::Styled {
                runs: split_strong_runs(line),
            });
        } else if is_emphasis_only(line) {
            blocks.push(ExportBlock::Note {
                text: line.trim_matches('*').to_string(),
            });
        } else {
            blocks.push(plain_paragraph(line));
        }

        i += 1;
    }

    blocks
}

/// Render the markup into every requested format
///
/// Each format is attempted independently; a failure in one is logged
/// and reported in its slot without aborting the others.
pub fn write_exports(
    markup: &str,
    output_dir: &Path,
    formats: &[ExportFormat],
) -> Vec<(ExportFormat, std::io::Result<PathBuf>)> {
    let blocks = parse_blocks(markup);

    formats
        .iter()
        .map(|&format| {
            let rendered = match format {
                ExportFormat::Html => render_html(&blocks),
                ExportFormat::Text => render_text(&blocks),
            };
            let path = output_dir.join(format.file_name());
            let result = std::fs::write(&path, rendered).map(|()| {
                info!("Wrote {:?} export to {}", format, path.display());
                path
            });
            if let Err(e) = &result {
                error!("Failed to write {:?} export: {}", format, e);
            }
            (format, result)
        })
        .collect()
}

/// Parse `![caption](path)` into its caption and path
fn parse_image_line(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("![")?;
    let (caption, rest) = rest.split_once("](")?;
    let path = rest.strip_suffix(')')?;
    Some((caption.to_string(), path.to_string()))
}

/// A line wrapped in single emphasis markers, e.g. `*caption*`
fn is_emphasis_only(line: &str) -> bool {
    line.len() > 2
        && line.starts_with('*')
        && line.ends_with('*')
        && !line.starts_with("**")
}

/// Split a line into alternating plain and strong runs at `**` markers
///
/// An unbalanced trailing marker leaves the remainder as a plain run.
fn split_strong_runs(line: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut rest = line;

    while let Some(start) = rest.find("**") {
        let Some(end) = rest[start + 2..].find("**") else {
            break;
        };
        if start > 0 {
            runs.push(TextRun::plain(&rest[..start]));
        }
        let strong = &rest[start + 2..start + 2 + end];
        if !strong.is_empty() {
            runs.push(TextRun::strong(strong));
        }
        rest = &rest[start + 2 + end + 2..];
    }

    if !rest.is_empty() {
        runs.push(TextRun::plain(rest));
    }
    runs
}

fn plain_paragraph(line: &str) -> ExportBlock {
    ExportBlock::Paragraph {
        text: line.replace("**", ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_heading_levels() {
        let blocks = parse_blocks("# Title\n\n## Section\n\n### Subsection\n");
        assert_eq!(
            blocks,
            vec![
                ExportBlock::Heading {
                    level: 1,
                    text: "Title".to_string()
                },
                ExportBlock::Heading {
                    level: 2,
                    text: "Section".to_string()
                },
                ExportBlock::Heading {
                    level: 3,
                    text: "Subsection".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_image_consumes_caption_line() {
        let blocks = parse_blocks("![Opening shot](images/frame_1.jpg)\n*Opening shot*\n\nNext paragraph.\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            ExportBlock::Image {
                path: "images/frame_1.jpg".to_string(),
                caption: "Opening shot".to_string(),
            }
        );
        assert_eq!(
            blocks[1],
            ExportBlock::Paragraph {
                text: "Next paragraph.".to_string()
            }
        );
    }

    #[test]
    fn test_parse_image_without_caption_line() {
        let blocks = parse_blocks("![Shot](images/a.jpg)\nPlain text follows.");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], ExportBlock::Image { .. }));
        assert!(matches!(blocks[1], ExportBlock::Paragraph { .. }));
    }

    #[test]
    fn test_parse_emphasis_only_line_is_note() {
        let blocks = parse_blocks("*A quiet aside*");
        assert_eq!(
            blocks,
            vec![ExportBlock::Note {
                text: "A quiet aside".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_strong_spans_split_into_runs() {
        let blocks = parse_blocks("The **key insight** is **simple**.");
        assert_eq!(
            blocks,
            vec![ExportBlock::Styled {
                runs: vec![
                    TextRun::plain("The "),
                    TextRun::strong("key insight"),
                    TextRun::plain(" is "),
                    TextRun::strong("simple"),
                    TextRun::plain("."),
                ]
            }]
        );
    }

    #[test]
    fn test_parse_unbalanced_strong_marker() {
        let blocks = parse_blocks("A **dangling marker here");
        assert_eq!(
            blocks,
            vec![ExportBlock::Styled {
                runs: vec![TextRun::plain("A **dangling marker here")]
            }]
        );
    }

    #[test]
    fn test_parse_malformed_image_degrades_to_paragraph() {
        let blocks = parse_blocks("![broken image line");
        assert_eq!(
            blocks,
            vec![ExportBlock::Paragraph {
                text: "![broken image line".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_blank_lines_produce_no_blocks() {
        assert!(parse_blocks("\n\n   \n").is_empty());
    }

    #[test]
    fn test_parse_full_article() {
        let source = "# Video Notes\n\nIntro paragraph.\n\n![First](images/frame_0.jpg)\n*First*\n\n## Details\n\nThe **main** point.\n";
        let blocks = parse_blocks(source);
        assert_eq!(blocks.len(), 5);
        assert!(matches!(blocks[0], ExportBlock::Heading { level: 1, .. }));
        assert!(matches!(blocks[2], ExportBlock::Image { .. }));
        assert!(matches!(blocks[3], ExportBlock::Heading { level: 2, .. }));
        assert!(matches!(blocks[4], ExportBlock::Styled { .. }));
    }

    #[test]
    fn test_write_exports_produces_all_formats() {
        let dir = tempfile::tempdir().unwrap();
        let results = write_exports(
            "# Title\n\nBody.\n",
            dir.path(),
            &[ExportFormat::Html, ExportFormat::Text],
        );
        assert_eq!(results.len(), 2);
        for (format, result) in &results {
            let path = result.as_ref().unwrap();
            assert!(path.exists(), "{format:?} output missing");
        }
    }

    #[test]
    fn test_write_exports_reports_failure_per_format() {
        let results = write_exports(
            "# Title\n",
            Path::new("/nonexistent/output/dir"),
            &[ExportFormat::Html, ExportFormat::Text],
        );
        assert!(results.iter().all(|(_, r)| r.is_err()));
    }
}
