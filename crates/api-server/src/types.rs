//! API request and response types

use serde::{Deserialize, Serialize};
use video_article_orchestrator::JobStatus;

/// Request body for submitting a remote video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitUrlRequest {
    /// Video URL to fetch and convert
    pub url: String,
}

/// Response returned when a job is accepted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Job identifier to poll with
    pub job_id: String,
    /// Initial lifecycle state
    pub status: JobStatus,
}

/// Response for a completed job's result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResultResponse {
    /// Job identifier
    pub job_id: String,
    /// Directory holding the article and its exports
    pub result_location: String,
    /// The assembled article markup
    pub article: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_url_request_deserialization() {
        let request: SubmitUrlRequest =
            serde_json::from_str(r#"{"url": "https://youtu.be/abc"}"#).unwrap();
        assert_eq!(request.url, "https://youtu.be/abc");
    }

    #[test]
    fn test_submit_response_serialization() {
        let response = SubmitResponse {
            job_id: "job-1".to_string(),
            status: JobStatus::Queued,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["job_id"], "job-1");
        assert_eq!(json["status"], "queued");
    }

    #[test]
    fn test_result_response_round_trip() {
        let response = JobResultResponse {
            job_id: "job-1".to_string(),
            result_location: "output/job-1".to_string(),
            article: "# Title\n".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        let parsed: JobResultResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.result_location, "output/job-1");
    }
}
