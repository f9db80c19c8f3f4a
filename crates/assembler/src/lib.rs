//! Document assembly
//!
//! Merges the generated prose with the selected frames into a single
//! ordered document, placing images at computed positions. Placement is
//! purely positional: it spreads images evenly through the text and
//! makes no attempt at semantic alignment between an image and its
//! surrounding paragraphs.

use tracing::debug;
use video_article_common::{Document, DocumentBlock, SelectedFrame};

/// Split generated prose into paragraphs at blank-line boundaries
///
/// Paragraphs are trimmed; empty segments are dropped. Single newlines
/// inside a paragraph (e.g. a heading followed by its first line in
/// tight markup) are preserved as-is.
#[must_use]
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Assemble paragraphs and selected frames into a document
///
/// Computes `interval = max(1, paragraphs / (images + 1))` and emits a
/// text block per paragraph, inserting the next unplaced image after
/// every `interval`-th paragraph (1-indexed). Images left over once the
/// paragraphs run out are appended in order, so no image is ever
/// dropped. Total over all inputs: zero images yields pure text, zero
/// paragraphs yields the images alone.
///
/// Image paths are carried into the document verbatim; callers are
/// expected to have relocated the image files and rewritten the paths
/// to their final, document-relative form beforehand.
#[must_use]
pub fn assemble(paragraphs: &[String], images: &[SelectedFrame]) -> Document {
    let interval = std::cmp::max(1, paragraphs.len() / (images.len() + 1));
    debug!(
        "Assembling document: {} paragraphs, {} images, interval {}",
        paragraphs.len(),
        images.len(),
        interval
    );

    let mut blocks = Vec::with_capacity(paragraphs.len() + images.len());
    let mut remaining = images.iter();

    for (i, paragraph) in paragraphs.iter().enumerate() {
        blocks.push(DocumentBlock::Text {
            content: paragraph.clone(),
        });
        if (i + 1) % interval == 0 {
            if let Some(image) = remaining.next() {
                blocks.push(image_block(image));
            }
        }
    }

    // Images without a computed slot trail the text in their original order
    blocks.extend(remaining.map(image_block));

    Document::new(blocks)
}

fn image_block(image: &SelectedFrame) -> DocumentBlock {
    DocumentBlock::Image {
        path: image.path.display().to_string(),
        caption: image.caption.clone(),
    }
}
