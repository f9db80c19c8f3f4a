//! HTML renderer
//!
//! Produces a self-contained styled page suitable for web viewing or
//! pasting into note-taking tools.

use crate::{ExportBlock, TextRun};

const PAGE_STYLE: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
            line-height: 1.8;
            max-width: 800px;
            margin: 0 auto;
            padding: 40px 20px;
            color: #333;
            background-color: #fff;
        }
        h1 {
            color: #1a1a1a;
            font-size: 2.5em;
            margin-bottom: 0.5em;
            line-height: 1.3;
            border-bottom: 3px solid #667eea;
            padding-bottom: 10px;
        }
        h2 {
            color: #2a2a2a;
            font-size: 2em;
            margin-top: 1.5em;
            margin-bottom: 0.5em;
        }
        h3 {
            color: #3a3a3a;
            font-size: 1.5em;
            margin-top: 1.2em;
            margin-bottom: 0.5em;
        }
        p {
            margin-bottom: 1.2em;
            font-size: 1.05em;
        }
        img {
            max-width: 100%;
            height: auto;
            border-radius: 8px;
            margin: 20px 0;
            box-shadow: 0 4px 12px rgba(0,0,0,0.1);
        }
        em {
            display: block;
            text-align: center;
            color: #666;
            font-size: 0.9em;
            margin-top: -10px;
            margin-bottom: 20px;
        }
        strong {
            color: #1a1a1a;
            font-weight: 600;
        }
"#;

/// Render typed blocks into a complete HTML document
#[must_use]
pub fn render_html(blocks: &[ExportBlock]) -> String {
    let mut body = String::new();

    for block in blocks {
        match block {
            ExportBlock::Heading { level, text } => {
                let text = escape(text);
                body.push_str(&format!("<h{level}>{text}</h{level}>\n"));
            }
            ExportBlock::Image { path, caption } => {
                body.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\">\n<em>{}</em>\n",
                    escape(path),
                    escape(caption),
                    escape(caption)
                ));
            }
            ExportBlock::Note { text } => {
                body.push_str(&format!("<em>{}</em>\n", escape(text)));
            }
            ExportBlock::Styled { runs } => {
                body.push_str("<p>");
                for run in runs {
                    body.push_str(&render_run(run));
                }
                body.push_str("</p>\n");
            }
            ExportBlock::Paragraph { text } => {
                body.push_str(&format!("<p>{}</p>\n", escape(text)));
            }
        }
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    <title>Article</title>\n    <style>{PAGE_STYLE}    </style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

fn render_run(run: &TextRun) -> String {
    let text = escape(&run.text);
    if run.strong {
        format!("<strong>{text}</strong>")
    } else {
        text
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_heading_and_paragraph() {
        let html = render_html(&[
            ExportBlock::Heading {
                level: 1,
                text: "Title".to_string(),
            },
            ExportBlock::Paragraph {
                text: "Body.".to_string(),
            },
        ]);
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<p>Body.</p>"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_render_image_with_caption() {
        let html = render_html(&[ExportBlock::Image {
            path: "images/frame_1.jpg".to_string(),
            caption: "A moment".to_string(),
        }]);
        assert!(html.contains("<img src=\"images/frame_1.jpg\" alt=\"A moment\">"));
        assert!(html.contains("<em>A moment</em>"));
    }

    #[test]
    fn test_render_strong_runs() {
        let html = render_html(&[ExportBlock::Styled {
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
        assert!(html.contains("<p>The <strong>point</strong></p>"));
    }

    #[test]
    fn test_render_escapes_markup() {
        let html = render_html(&[ExportBlock::Paragraph {
            text: "a < b && c > \"d\"".to_string(),
        }]);
        assert!(html.contains("a &lt; b &amp;&amp; c &gt; &quot;d&quot;"));
    }
}
