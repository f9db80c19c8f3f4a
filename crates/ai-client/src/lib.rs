//! Anthropic Messages API client
//!
//! Implements the two model-backed collaborators: vision-based frame
//! selection (candidate stills attached as base64 JPEG) and article
//! generation from the transcript plus the chosen frames. Frame
//! selection reports failures as plain diagnostics because the caller
//! recovers with a deterministic fallback; generation failures are
//! fatal to the job.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{debug, info};
use video_article_common::{ArticleGenerator, Frame, FrameSelector, PipelineError, SelectedFrame};

const DEFAULT_MODEL: &str = "claude-haiku-4-5";
const SELECTION_MAX_TOKENS: usize = 2000;
const GENERATION_MAX_TOKENS: usize = 4000;

/// How much transcript the selection prompt carries; the full
/// transcript goes only to generation
const TRANSCRIPT_EXCERPT_LEN: usize = 2000;

/// Anthropic Messages API client
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    api_key: String,
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

/// Messages API request
#[derive(Debug, Clone, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<Message>,
}

/// A single conversation message
#[derive(Debug, Clone, Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

/// Content block of a message (text or base64 image attachment)
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

/// Base64 image attachment source
#[derive(Debug, Clone, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

impl ImageSource {
    fn jpeg_base64(data: String) -> Self {
        Self {
            source_type: "base64".to_string(),
            media_type: "image/jpeg".to_string(),
            data,
        }
    }
}

/// Messages API response
#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
}

/// Response content block (only text blocks are consumed)
#[derive(Debug, Clone, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    /// Create a new client
    ///
    /// Reads the API key from `ANTHROPIC_API_KEY`; `ANTHROPIC_API_BASE`
    /// and `ANTHROPIC_MODEL` override the endpoint and model.
    ///
    /// # Errors
    /// Returns an error if `ANTHROPIC_API_KEY` is not set or HTTP
    /// client creation fails.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = env::var("ANTHROPIC_API_BASE")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1".to_string());
        let model = env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            http_client,
            base_url,
            model,
        })
    }

    /// Send a Messages API request and return the first text block
    async fn send(&self, request: &MessagesRequest) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .context("Failed to send Messages API request")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read Messages API response")?;

        if !status.is_success() {
            anyhow::bail!("Messages API request failed with status {status}: {response_text}");
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&response_text).context("Failed to parse Messages API response")?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .context("No text content in response")
    }
}

#[async_trait]
impl FrameSelector for AnthropicClient {
    async fn select_frames(
        &self,
        candidates: &[Frame],
        transcript: &str,
    ) -> anyhow::Result<String> {
        info!(
            "Requesting frame selection over {} candidates",
            candidates.len()
        );

        let mut content = vec![ContentBlock::Text {
            text: selection_prompt(candidates.len(), transcript),
        }];
        for (i, frame) in candidates.iter().enumerate() {
            content.push(ContentBlock::Text {
                text: format!("\n--- Frame {i} (at {}s) ---", frame.timestamp),
            });
            content.push(ContentBlock::Image {
                source: ImageSource::jpeg_base64(encode_image(&frame.path)?),
            });
        }

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: SELECTION_MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content,
            }],
        };

        let payload = self.send(&request).await?;
        debug!("Selection payload: {} bytes", payload.len());
        Ok(payload)
    }
}

#[async_trait]
impl ArticleGenerator for AnthropicClient {
    async fn generate_article(
        &self,
        transcript: &str,
        frames: &[SelectedFrame],
    ) -> video_article_common::Result<String> {
        info!("Requesting article generation with {} frames", frames.len());

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: GENERATION_MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![ContentBlock::Text {
                    text: generation_prompt(transcript, frames),
                }],
            }],
        };

        self.send(&request)
            .await
            .map_err(|e| PipelineError::Generation(format!("{e:#}")))
    }
}

fn selection_prompt(candidate_count: usize, transcript: &str) -> String {
    let excerpt: String = transcript.chars().take(TRANSCRIPT_EXCERPT_LEN).collect();
    let last_index = candidate_count.saturating_sub(1);
    format!(
        "You are analyzing frames from a video to select the most important moments for an article.\n\n\
         Video transcript:\n{excerpt}...\n\n\
         I'm providing you with {candidate_count} frames extracted from the video. Analyze them and \
         identify the 5-8 most visually interesting and relevant frames to use as illustrations.\n\n\
         For each selected frame, provide:\n\
         1. The frame number (0-{last_index})\n\
         2. A brief description of what makes it important\n\
         3. A caption\n\n\
         Respond in JSON format:\n\
         {{\n  \"selected_frames\": [\n    {{\n      \"frame_index\": 0,\n      \"reason\": \"Shows the main topic introduction\",\n      \"caption\": \"Introduction to the topic\"\n    }}\n  ]\n}}"
    )
}

fn generation_prompt(transcript: &str, frames: &[SelectedFrame]) -> String {
    let frame_descriptions: Vec<String> = frames
        .iter()
        .map(|f| format!("- Frame at {}s: {} ({})", f.timestamp, f.caption, f.reason))
        .collect();

    format!(
        "You are a professional writer. Create a comprehensive article based on the following video content.\n\n\
         Video transcript:\n{transcript}\n\n\
         Key visual moments:\n{}\n\n\
         Instructions:\n\
         1. The article should be well-structured in markdown, with a `#` title, `##` section headings, an introduction, main content sections, and a conclusion\n\
         2. The article should be approximately 800-1200 words\n\
         3. Create natural transitions between sections\n\
         4. The tone should be informative and engaging\n\
         5. Include relevant context and explanations\n\n\
         Important: write ONLY the article content. Do not include any explanations or meta-commentary.",
        frame_descriptions.join("\n")
    )
}

/// Read and base64-encode a frame image for attachment
fn encode_image(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read frame image {}", path.display()))?;
    Ok(BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_content_block_serialization() {
        let block = ContentBlock::Image {
            source: ImageSource::jpeg_base64("QUJD".to_string()),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["source"]["type"], "base64");
        assert_eq!(json["source"]["media_type"], "image/jpeg");
        assert_eq!(json["source"]["data"], "QUJD");
    }

    #[test]
    fn test_messages_request_shape() {
        let request = MessagesRequest {
            model: "test-model".to_string(),
            max_tokens: 100,
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![ContentBlock::Text {
                    text: "hello".to_string(),
                }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], "hello");
    }

    #[test]
    fn test_response_parsing_skips_non_text_blocks() {
        let raw = r#"{"content": [{"type": "thinking"}, {"type": "text", "text": "answer"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        let text = parsed.content.into_iter().find_map(|b| b.text).unwrap();
        assert_eq!(text, "answer");
    }

    #[test]
    fn test_selection_prompt_mentions_candidate_range() {
        let prompt = selection_prompt(12, "a transcript");
        assert!(prompt.contains("12 frames"));
        assert!(prompt.contains("(0-11)"));
        assert!(prompt.contains("selected_frames"));
    }

    #[test]
    fn test_generation_prompt_lists_frames() {
        let frames = vec![SelectedFrame {
            timestamp: 30.0,
            path: PathBuf::from("images/frame_1.jpg"),
            caption: "The demo".to_string(),
            reason: "Key moment".to_string(),
        }];
        let prompt = generation_prompt("words", &frames);
        assert!(prompt.contains("- Frame at 30s: The demo (Key moment)"));
    }
}
