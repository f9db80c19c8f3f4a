//! HTTP request handlers for API endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::path::Path as FsPath;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::fetcher::validate_video_url;
use crate::types::{HealthResponse, JobResultResponse, SubmitResponse, SubmitUrlRequest};
use crate::ApiState;
use video_article_orchestrator::{JobRecord, JobSource};

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Accept a video upload and start a conversion job
///
/// The multipart body must carry the video in a field named `file` with
/// a `video/*` content type. Oversized or mistyped uploads are rejected
/// before any job is created.
pub async fn upload_video(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Malformed multipart body: {e}"),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("video/") {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Unsupported content type: {content_type}"),
            ));
        }

        let extension = field
            .file_name()
            .and_then(|name| FsPath::new(name).extension())
            .and_then(|ext| ext.to_str())
            .unwrap_or("mp4")
            .to_string();

        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Failed to read upload: {e}"),
            )
        })?;

        if data.len() as u64 > state.config.max_video_size {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "Video exceeds the {} byte limit",
                    state.config.max_video_size
                ),
            ));
        }

        let job_id = Uuid::new_v4().to_string();
        let video_path = state.config.upload_dir.join(format!("{job_id}.{extension}"));
        tokio::fs::write(&video_path, &data).await.map_err(|e| {
            error!("Failed to persist upload: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to persist upload".to_string(),
            )
        })?;

        info!(
            "Upload accepted: job_id={}, {} bytes, {}",
            job_id,
            data.len(),
            content_type
        );

        return Ok(spawn_job(&state, job_id, JobSource::Upload(video_path)).await);
    }

    Err((
        StatusCode::BAD_REQUEST,
        "Missing multipart field: file".to_string(),
    ))
}

/// Accept a remote video URL and start a conversion job
///
/// The URL is validated before any job is created; fetching happens
/// inside the job's own `downloading` stage.
pub async fn submit_url(
    State(state): State<ApiState>,
    Json(request): Json<SubmitUrlRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(reason) = validate_video_url(&request.url) {
        warn!("Rejected URL submission: {}", reason);
        return Err((StatusCode::BAD_REQUEST, reason));
    }

    let job_id = Uuid::new_v4().to_string();
    info!("URL submission accepted: job_id={}, {}", job_id, request.url);

    Ok(spawn_job(&state, job_id, JobSource::Remote(request.url)).await)
}

/// Get a job's current status
pub async fn get_job_status(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.pipeline.registry().snapshot(&job_id).await {
        Some(record) => Ok(Json(record)),
        None => Err((StatusCode::NOT_FOUND, format!("Job not found: {job_id}"))),
    }
}

/// Get a completed job's article
pub async fn get_job_result(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let record = state
        .pipeline
        .registry()
        .snapshot(&job_id)
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Job not found: {job_id}")))?;

    if record.status != video_article_orchestrator::JobStatus::Completed {
        return Err((
            StatusCode::CONFLICT,
            format!("Job is not complete: {job_id}"),
        ));
    }

    let result_location = record.result_location.ok_or_else(|| {
        error!("Completed job {} has no result location", job_id);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Result location missing".to_string(),
        )
    })?;

    let article = tokio::fs::read_to_string(result_location.join("article.md"))
        .await
        .map_err(|e| {
            error!("Failed to read article for job {}: {}", job_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read article".to_string(),
            )
        })?;

    Ok(Json(JobResultResponse {
        job_id,
        result_location: result_location.display().to_string(),
        article,
    }))
}

/// Download one of a completed job's rendered exports
///
/// `format` is `html`, `text` (or `txt`), or `markdown` (or `md`).
pub async fn download_export(
    State(state): State<ApiState>,
    Path((job_id, format)): Path<(String, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (file_name, content_type) = export_artifact(&format).ok_or((
        StatusCode::BAD_REQUEST,
        format!("Unknown export format: {format}"),
    ))?;

    let record = state
        .pipeline
        .registry()
        .snapshot(&job_id)
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Job not found: {job_id}")))?;

    if record.status != video_article_orchestrator::JobStatus::Completed {
        return Err((
            StatusCode::CONFLICT,
            format!("Job is not complete: {job_id}"),
        ));
    }

    let result_location = record.result_location.ok_or_else(|| {
        error!("Completed job {} has no result location", job_id);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Result location missing".to_string(),
        )
    })?;

    let body = tokio::fs::read(result_location.join(file_name))
        .await
        .map_err(|e| {
            error!("Failed to read {} for job {}: {}", file_name, job_id, e);
            (
                StatusCode::NOT_FOUND,
                format!("Export not available: {file_name}"),
            )
        })?;

    Ok(([(header::CONTENT_TYPE, content_type)], body))
}

/// Map a requested export format to its artifact file and content type
fn export_artifact(format: &str) -> Option<(&'static str, &'static str)> {
    match format {
        "html" => Some(("article.html", "text/html; charset=utf-8")),
        "text" | "txt" => Some(("article.txt", "text/plain; charset=utf-8")),
        "markdown" | "md" => Some(("article.md", "text/markdown; charset=utf-8")),
        _ => None,
    }
}

/// Delete a finished job and its artifacts
///
/// Jobs still in flight cannot be deleted; poll until they settle.
pub async fn delete_job(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let registry = state.pipeline.registry();
    let record = registry
        .snapshot(&job_id)
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Job not found: {job_id}")))?;

    if !record.status.is_terminal() {
        return Err((
            StatusCode::CONFLICT,
            format!("Job is still active: {job_id}"),
        ));
    }

    registry.remove(&job_id).await;
    if let Some(result_location) = record.result_location {
        if let Err(e) = tokio::fs::remove_dir_all(&result_location).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove results for job {}: {}", job_id, e);
            }
        }
    }

    info!("Deleted job {}", job_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Register the job and hand it to the pipeline on its own task
async fn spawn_job(state: &ApiState, job_id: String, source: JobSource) -> impl IntoResponse {
    let registry = state.pipeline.registry();
    registry.insert(JobRecord::new(job_id.clone())).await;

    let pipeline = state.pipeline.clone();
    let job_id_clone = job_id.clone();
    tokio::spawn(async move {
        pipeline.run(&job_id_clone, source).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id,
            status: video_article_orchestrator::JobStatus::Queued,
        }),
    )
}
