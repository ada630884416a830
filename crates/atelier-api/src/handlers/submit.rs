//! Submission endpoint.
//!
//! Reads the multipart form into a [`SubmissionRequest`] and runs it under the
//! request deadline. Every outcome answers with either a `success` or an
//! `errors` body.

use atelier_core::models::{ContentStatus, ContentType, ErrorAccumulator};
use atelier_core::{AppError, GENERIC_FAILURE_MESSAGE};
use atelier_processing::{SizeCeiling, TransportError, UploadError};
use atelier_services::{SubmissionError, SubmissionRequest, SubmissionSuccess, UploadFile};
use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::BytesMut;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::CurrentActor;
use crate::error::HttpAppError;
use crate::state::AppState;

const CONTENT_ID: &str = "content_id";
const TOKEN: &str = "token";
const TITLE: &str = "title";
const BODY: &str = "body";
const STATUS: &str = "status";
const TAGS: &str = "tags";
const AUTHOR: &str = "author";
const PRIMARY_IMAGE: &str = "primary_image";
const GALLERY: &str = "gallery";
const EXISTING_GALLERY: &str = "existing_gallery_ids";

const INTERRUPTED_FORM_MESSAGE: &str =
    "Your submission did not arrive completely. Please try again.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitResponse {
    Success(SubmissionSuccess),
    Errors(ErrorAccumulator),
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(content_type): Path<String>,
    CurrentActor(actor): CurrentActor,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let content_type: ContentType = content_type
        .parse()
        .map_err(|e: String| HttpAppError(AppError::NotFound(e)))?;

    let request = match read_submission(content_type, multipart, &state.upload_ceiling()).await {
        Ok(request) => request,
        Err(err @ SubmissionError::Rejected(_)) => {
            return Ok(errors_response(StatusCode::BAD_REQUEST, err))
        }
        Err(err) => return Ok(failure_response(err)),
    };

    let deadline = state.config.request_deadline();
    match tokio::time::timeout(deadline, state.submissions.submit(&actor, request)).await {
        Ok(Ok(success)) => Ok((StatusCode::OK, Json(SubmitResponse::Success(success))).into_response()),
        Ok(Err(err)) => Ok(failure_response(err)),
        Err(_) => {
            let err = state.deadline_error();
            tracing::warn!(error = %err, actor_id = %actor.id, "Submission deadline exceeded");
            let mut errors = ErrorAccumulator::new();
            errors.push_unexpected(GENERIC_FAILURE_MESSAGE);
            Ok((StatusCode::GATEWAY_TIMEOUT, Json(SubmitResponse::Errors(errors))).into_response())
        }
    }
}

fn failure_response(err: SubmissionError) -> Response {
    let status = match &err {
        SubmissionError::Unauthorized => StatusCode::FORBIDDEN,
        SubmissionError::Rejected(errors) if errors.unexpected.is_empty() => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SubmissionError::Rejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    errors_response(status, err)
}

fn errors_response(status: StatusCode, err: SubmissionError) -> Response {
    (status, Json(SubmitResponse::Errors(err.into_errors()))).into_response()
}

/// Collect the form into a request.
///
/// A broken stream rejects the whole form; nothing read before the break is
/// ever submitted.
async fn read_submission(
    content_type: ContentType,
    mut multipart: Multipart,
    ceiling: &SizeCeiling,
) -> Result<SubmissionRequest, SubmissionError> {
    let mut request = SubmissionRequest::new(content_type, None, String::new());

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Multipart stream ended early");
                return Err(interrupted(None));
            }
        };

        let name = field
            .name()
            .map(|n| n.trim_end_matches("[]").to_string())
            .unwrap_or_default();

        if name == PRIMARY_IMAGE || name == GALLERY {
            let (file, broken) = read_file(field, ceiling.max_bytes()).await;
            if broken {
                return Err(interrupted(Some((&file, ceiling))));
            }
            if name == PRIMARY_IMAGE {
                request.primary_image = Some(file);
            } else {
                request.gallery.push(file);
            }
            continue;
        }

        let value = match field.text().await {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, field = %name, "Failed to read form field");
                return Err(interrupted(None));
            }
        };

        match name.as_str() {
            CONTENT_ID => {
                let raw = value.trim();
                if !raw.is_empty() {
                    let id = Uuid::parse_str(raw).map_err(|_| SubmissionError::Unauthorized)?;
                    request.content_id = Some(id);
                }
            }
            TOKEN => request.token = value,
            TITLE => request.core.title = value,
            BODY => request.core.body = value,
            STATUS => {
                if let Ok(status) = value.parse::<ContentStatus>() {
                    request.core.status = status;
                }
            }
            TAGS => {
                for tag in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    if !request.core.tags.iter().any(|t| t == tag) {
                        request.core.tags.push(tag.to_string());
                    }
                }
            }
            EXISTING_GALLERY => request.existing_gallery_ids.extend(
                value
                    .split(',')
                    .filter_map(|id| Uuid::parse_str(id.trim()).ok()),
            ),
            AUTHOR => {}
            _ => request.fields.entry(name.clone()).or_default().push(value),
        }
    }

    Ok(request)
}

/// Rejection for a form whose stream broke, naming the file being read if any
fn interrupted(file: Option<(&UploadFile, &SizeCeiling)>) -> SubmissionError {
    let mut errors = ErrorAccumulator::new();
    match file {
        Some((file, ceiling)) => {
            let name = file.name.clone();
            let err = if file.transport_error == TransportError::ExceedsLimit {
                UploadError::TooLarge {
                    name,
                    limit: ceiling.describe(),
                }
            } else {
                UploadError::Incomplete { name }
            };
            errors.push(err.category(), err.client_message());
        }
        None => errors.push_unexpected(INTERRUPTED_FORM_MESSAGE),
    }
    SubmissionError::Rejected(errors)
}

/// Read one file part. The flag reports a broken stream.
async fn read_file(mut field: Field<'_>, ceiling: u64) -> (UploadFile, bool) {
    let name = field.file_name().unwrap_or_default().to_string();
    let declared_mime = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let mut data = BytesMut::new();
    let mut transport_error = TransportError::Ok;
    let mut broken = false;

    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if transport_error != TransportError::Ok {
                    continue;
                }
                if data.len() as u64 + chunk.len() as u64 > ceiling {
                    transport_error = TransportError::ExceedsLimit;
                } else {
                    data.extend_from_slice(&chunk);
                }
            }
            Ok(None) => break,
            Err(e) => {
                transport_error = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    TransportError::ExceedsLimit
                } else {
                    TransportError::Partial
                };
                tracing::debug!(error = %e, file_name = %name, "File upload interrupted");
                broken = true;
                break;
            }
        }
    }

    if name.is_empty() && data.is_empty() && transport_error == TransportError::Ok {
        transport_error = TransportError::NoFile;
    }

    let file = UploadFile {
        name,
        declared_mime,
        transport_error,
        data: data.freeze(),
    };
    (file, broken)
}
