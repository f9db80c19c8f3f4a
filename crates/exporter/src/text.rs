//! Plain-text renderer
//!
//! Strips all styling; headings are underlined so the article remains
//! scannable in a terminal or plain email body.

use crate::{ExportBlock, TextRun};

/// Render typed blocks into plain text
#[must_use]
pub fn render_text(blocks: &[ExportBlock]) -> String {
    let mut parts = Vec::with_capacity(blocks.len());

    for block in blocks {
        match block {
            ExportBlock::Heading { level, text } => {
                let underline = match level {
                    1 => "=",
                    2 => "-",
                    _ => "",
                };
                if underline.is_empty() {
                    parts.push(text.clone());
                } else {
                    parts.push(format!("{text}\n{}", underline.repeat(text.chars().count())));
                }
            }
            ExportBlock::Image { caption, .. } => {
                parts.push(format!("[Image: {caption}]"));
            }
            ExportBlock::Note { text } => parts.push(text.clone()),
            ExportBlock::Styled { runs } => {
                parts.push(runs.iter().map(|r: &TextRun| r.text.as_str()).collect());
            }
            ExportBlock::Paragraph { text } => parts.push(text.clone()),
        }
    }

    let mut out = parts.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_headings_underlined() {
        let text = render_text(&[
            ExportBlock::Heading {
                level: 1,
                text: "Title".to_string(),
            },
            ExportBlock::Heading {
                level: 3,
                text: "Sub".to_string(),
            },
        ]);
        assert!(text.contains("Title\n====="));
        // Level 3 headings get no underline
        assert!(text.ends_with("\n\nSub\n"));
    }

    #[test]
    fn test_render_image_placeholder() {
        let text = render_text(&[ExportBlock::Image {
            path: "images/frame_1.jpg".to_string(),
            caption: "A moment".to_string(),
        }]);
        assert_eq!(text, "[Image: A moment]\n");
    }

    #[test]
    fn test_render_styled_runs_flattened() {
        let text = render_text(&[ExportBlock::Styled {
            runs: vec![
                TextRun {
                    text: "The ".to_string(),
                    strong: false,
                },
                TextRun {
                    text: "point".to_string(),
                    strong: true,
                },
            ],
        }]);
        assert_eq!(text, "The point\n");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_text(&[]), "");
    }
}
