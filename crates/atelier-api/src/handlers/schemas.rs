use atelier_core::models::{ContentSchema, ContentType};
use atelier_core::AppError;
use axum::{extract::Path, Json};

use crate::error::HttpAppError;

/// Section and field list of a content type, for form renderers
pub async fn get_schema(Path(content_type): Path<String>) -> Result<Json<ContentSchema>, HttpAppError> {
    let content_type: ContentType = content_type
        .parse()
        .map_err(|e: String| HttpAppError(AppError::NotFound(e)))?;
    Ok(Json(ContentSchema::for_type(content_type)))
}
