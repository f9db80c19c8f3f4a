//! Frame sampling, selection reconciliation, and deterministic fallback
//!
//! The full frame sequence of a video is too large to hand to the
//! external selection collaborator, so it is first reduced to a bounded
//! candidate set by fixed-stride sampling. The collaborator's raw
//! selection payload is then reconciled back onto the candidates; if the
//! payload cannot be parsed at all, a deterministic fallback produces an
//! evenly spaced selection so the pipeline always has images to work
//! with.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use video_article_common::{Frame, SelectedFrame};

/// Default cap on the candidate set size
pub const DEFAULT_CANDIDATE_CAP: usize = 20;

/// Default number of frames chosen by the fallback selection
pub const DEFAULT_FALLBACK_TARGET: usize = 6;

/// Selection payload could not be structurally parsed
///
/// This error never fails a job: the orchestrator absorbs it by
/// substituting the deterministic fallback selection.
#[derive(Error, Debug)]
pub enum SelectionParseError {
    #[error("selection payload contains no JSON object")]
    NoJsonObject,

    #[error("selection payload is not well-formed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One entry of the external selector's payload
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionEntry {
    pub frame_index: i64,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub reason: String,
}

/// Parsed selection payload
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionPayload {
    pub selected_frames: Vec<SelectionEntry>,
}

/// Reduce a dense frame sequence to a bounded candidate set
///
/// Returns all frames unchanged when there are at most `cap` of them.
/// Otherwise takes every `stride`-th frame starting at index 0, where
/// `stride = max(1, len / cap)`, preserving the original order. Output
/// is a pure function of the input length and `cap`. A cap of 0 is
/// treated as 1 so the candidate set stays bounded.
#[must_use]
pub fn sample(frames: &[Frame], cap: usize) -> Vec<Frame> {
    let cap = cap.max(1);
    if frames.len() <= cap {
        return frames.to_vec();
    }
    let stride = std::cmp::max(1, frames.len() / cap);
    frames.iter().step_by(stride).cloned().collect()
}

/// Reconcile a raw selection payload against the candidate set
///
/// The payload is expected to be a JSON object of the form
/// `{"selected_frames": [{"frame_index": 0, "caption": "...",
/// "reason": "..."}]}`, possibly embedded in surrounding prose; the
/// substring from the first `{` to the last `}` is parsed. Entries whose
/// index falls outside the candidate set are silently dropped.
/// Surviving frames are re-sorted by timestamp.
///
/// # Errors
/// Returns [`SelectionParseError`] only when the payload cannot be
/// structurally parsed at all.
pub fn reconcile(
    candidates: &[Frame],
    raw_payload: &str,
) -> Result<Vec<SelectedFrame>, SelectionParseError> {
    let payload = parse_payload(raw_payload)?;

    let mut selected: Vec<SelectedFrame> = payload
        .selected_frames
        .iter()
        .filter_map(|entry| {
            let index = usize::try_from(entry.frame_index).ok()?;
            let frame = candidates.get(index);
            if frame.is_none() {
                debug!(
                    "Dropping out-of-range selection index {} ({} candidates)",
                    entry.frame_index,
                    candidates.len()
                );
            }
            frame.map(|f| SelectedFrame::from_frame(f, &entry.caption, &entry.reason))
        })
        .collect();

    selected.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    Ok(selected)
}

/// Deterministic fallback selection
///
/// Picks `n = min(target_count, len(candidates))` evenly spaced frames
/// at indices `0, stride, 2*stride, ...` with `stride = len / n`, each
/// given a caption synthesized from its timestamp and a fixed
/// auto-selected reason. Identical inputs always produce identical
/// output.
#[must_use]
pub fn fallback(candidates: &[Frame], target_count: usize) -> Vec<SelectedFrame> {
    let n = std::cmp::min(target_count, candidates.len());
    if n == 0 {
        return Vec::new();
    }
    let stride = candidates.len() / n;
    (0..n)
        .map(|i| {
            let frame = &candidates[i * stride];
            SelectedFrame::from_frame(
                frame,
                format!("Frame at {}s", frame.timestamp.round() as i64),
                "Auto-selected",
            )
        })
        .collect()
}

/// Extract and parse the JSON object embedded in a raw payload
///
/// Model output routinely wraps the JSON object in prose, so everything
/// outside the outermost braces is discarded before parsing.
fn parse_payload(raw: &str) -> Result<SelectionPayload, SelectionParseError> {
    let start = raw.find('{').ok_or(SelectionParseError::NoJsonObject)?;
    let end = raw.rfind('}').ok_or(SelectionParseError::NoJsonObject)?;
    if end < start {
        return Err(SelectionParseError::NoJsonObject);
    }
    let payload: SelectionPayload = serde_json::from_str(&raw[start..=end])?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| Frame::new(i as f64 * 4.0, PathBuf::from(format!("/tmp/frame_{i:04}.jpg"))))
            .collect()
    }

    #[test]
    fn test_sample_under_cap_returns_all() {
        let input = frames(15);
        let out = sample(&input, 20);
        assert_eq!(out, input);
    }

    #[test]
    fn test_sample_at_cap_returns_all() {
        let input = frames(20);
        assert_eq!(sample(&input, 20).len(), 20);
    }

    #[test]
    fn test_sample_over_cap_bounded_and_increasing() {
        let input = frames(200);
        let out = sample(&input, 20);
        assert!(out.len() <= 20);
        for pair in out.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn test_sample_45_frames_cap_20_stride_2() {
        // 45 / 20 -> stride 2 -> indices 0, 2, ..., 44 -> 23 candidates
        let input = frames(45);
        let out = sample(&input, 20);
        assert_eq!(out.len(), 23);
        assert_eq!(out[0].timestamp, input[0].timestamp);
        assert_eq!(out[1].timestamp, input[2].timestamp);
        assert_eq!(out[22].timestamp, input[44].timestamp);
    }

    #[test]
    fn test_sample_zero_cap_stays_bounded() {
        // A zero cap clamps to 1 instead of returning everything
        let input = frames(50);
        let out = sample(&input, 0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].timestamp, input[0].timestamp);
    }

    #[test]
    fn test_sample_is_deterministic() {
        let input = frames(137);
        assert_eq!(sample(&input, 20), sample(&input, 20));
    }

    #[test]
    fn test_reconcile_valid_payload() {
        let candidates = frames(20);
        let raw = r#"{"selected_frames": [
            {"frame_index": 3, "caption": "A chart", "reason": "Shows the trend"},
            {"frame_index": 0, "caption": "Title slide", "reason": "Opens the talk"}
        ]}"#;
        let selected = reconcile(&candidates, raw).unwrap();
        assert_eq!(selected.len(), 2);
        // Re-sorted by timestamp regardless of payload order
        assert_eq!(selected[0].caption, "Title slide");
        assert_eq!(selected[1].caption, "A chart");
    }

    #[test]
    fn test_reconcile_drops_out_of_range_indices() {
        let candidates = frames(20);
        let raw = r#"{"selected_frames": [
            {"frame_index": 0, "caption": "a", "reason": "r"},
            {"frame_index": 5, "caption": "b", "reason": "r"},
            {"frame_index": 99, "caption": "c", "reason": "r"}
        ]}"#;
        let selected = reconcile(&candidates, raw).unwrap();
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|f| f.caption != "c"));
    }

    #[test]
    fn test_reconcile_drops_negative_indices() {
        let candidates = frames(5);
        let raw = r#"{"selected_frames": [
            {"frame_index": -1, "caption": "a", "reason": "r"},
            {"frame_index": 2, "caption": "b", "reason": "r"}
        ]}"#;
        let selected = reconcile(&candidates, raw).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].caption, "b");
    }

    #[test]
    fn test_reconcile_tolerates_surrounding_prose() {
        let candidates = frames(5);
        let raw = "Here is my selection:\n{\"selected_frames\": [{\"frame_index\": 1, \"caption\": \"x\", \"reason\": \"y\"}]}\nHope that helps!";
        let selected = reconcile(&candidates, raw).unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_reconcile_rejects_non_json() {
        let candidates = frames(5);
        let err = reconcile(&candidates, "I could not decide.").unwrap_err();
        assert!(matches!(err, SelectionParseError::NoJsonObject));
    }

    #[test]
    fn test_reconcile_rejects_wrong_shape() {
        let candidates = frames(5);
        let err = reconcile(&candidates, r#"{"frames": [1, 2, 3]}"#).unwrap_err();
        assert!(matches!(err, SelectionParseError::Malformed(_)));
    }

    #[test]
    fn test_fallback_12_candidates_target_6() {
        let candidates = frames(12);
        let selected = fallback(&candidates, 6);
        assert_eq!(selected.len(), 6);
        // stride 2 -> candidates 0, 2, 4, 6, 8, 10
        assert_eq!(selected[1].timestamp, candidates[2].timestamp);
        assert_eq!(selected[5].timestamp, candidates[10].timestamp);
    }

    #[test]
    fn test_fallback_fewer_candidates_than_target() {
        let candidates = frames(4);
        let selected = fallback(&candidates, 6);
        assert_eq!(selected.len(), 4);
    }

    #[test]
    fn test_fallback_empty_candidates() {
        assert!(fallback(&[], 6).is_empty());
    }

    #[test]
    fn test_fallback_deterministic_and_sorted() {
        let candidates = frames(17);
        let a = fallback(&candidates, 6);
        let b = fallback(&candidates, 6);
        assert_eq!(a, b);
        for pair in a.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_fallback_caption_texture() {
        let candidates = frames(3);
        let selected = fallback(&candidates, 1);
        assert_eq!(selected[0].caption, "Frame at 0s");
        assert_eq!(selected[0].reason, "Auto-selected");
    }
}
