//! Scout content API endpoints.

use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::StatusCode,
    Extension, Json,
};

use super::{
    blank_to_none, file_field, int_field, invalid_choice, is_multipart, text_field, ListParams,
    UploadedFile,
};
use crate::auth::AuthContext;
use crate::db::{ScoutContentFilter, ScoutContentRecord};
use crate::errors::AppError;
use crate::models::{
    Difficulty, ScoutCategory, ScoutContent, ScoutContentPayload, ScoutContentResponse, ScoutType,
};
use crate::storage::scout_upload_path;
use crate::validate;
use crate::AppState;

/// Create/update body for a scout content entry: JSON metadata, or a
/// multipart form carrying the same fields plus `picture`/`video` parts.
pub struct ScoutContentForm {
    pub payload: ScoutContentPayload,
    pub picture: Option<UploadedFile>,
    pub video: Option<UploadedFile>,
}

impl<S> FromRequest<S> for ScoutContentForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Json(payload) = Json::<ScoutContentPayload>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(format!("Malformed JSON body: {}", e)))?;
            return Ok(Self {
                payload,
                picture: None,
                video: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?;

        let mut form = Self {
            payload: ScoutContentPayload::default(),
            picture: None,
            video: None,
        };

        while let Some(field) = multipart.next_field().await.map_err(super::bad_multipart)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "name" => form.payload.name = Some(text_field(field).await?),
                "type" => form.payload.scout_type = Some(text_field(field).await?),
                "category" => form.payload.category = Some(text_field(field).await?),
                "difficulty" => form.payload.difficulty = int_field("difficulty", field).await?,
                "usage" => form.payload.usage = Some(text_field(field).await?),
                "youtubeLink" => form.payload.youtube_link = Some(text_field(field).await?),
                "model3dLink" => form.payload.model_3d_link = Some(text_field(field).await?),
                "picture" => form.picture = file_field(field).await?,
                "video" => form.video = file_field(field).await?,
                _ => {}
            }
        }

        Ok(form)
    }
}

/// GET /api/scout-content - List scout content with filtering, search, and ordering.
pub async fn list_scout_content(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ScoutContentResponse>>, AppError> {
    let filter = scout_filter(&params)?;
    let entries = state.repo.list_scout_content(&filter).await?;
    Ok(Json(
        entries
            .into_iter()
            .map(ScoutContentResponse::from)
            .collect(),
    ))
}

/// GET /api/scout-content/:id - Get a single scout content entry.
pub async fn get_scout_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScoutContentResponse>, AppError> {
    let content = state
        .repo
        .get_scout_content(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Scout content {} not found", id)))?;
    Ok(Json(content.into()))
}

/// POST /api/scout-content - Create a new entry. Authenticated only.
pub async fn create_scout_content(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    form: ScoutContentForm,
) -> Result<(StatusCode, Json<ScoutContentResponse>), AppError> {
    let identity = auth.require_identity()?.clone();

    let mut record = merge_scout_fields(&form.payload, None, true)?;
    validate_scout_uploads(form.picture.as_ref(), form.video.as_ref())?;
    store_scout_uploads(&state, &mut record, form.picture, form.video).await?;

    let content = state
        .repo
        .create_scout_content(&record, Some(&identity))
        .await?;
    tracing::info!(
        "Scout content {} created by {}",
        content.id,
        identity.username
    );
    Ok((StatusCode::CREATED, Json(content.into())))
}

/// PUT /api/scout-content/:id - Full update. Authenticated only.
pub async fn update_scout_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthContext>,
    form: ScoutContentForm,
) -> Result<Json<ScoutContentResponse>, AppError> {
    apply_scout_update(state, id, auth, form, false).await
}

/// PATCH /api/scout-content/:id - Partial update. Authenticated only.
pub async fn partial_update_scout_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthContext>,
    form: ScoutContentForm,
) -> Result<Json<ScoutContentResponse>, AppError> {
    apply_scout_update(state, id, auth, form, true).await
}

/// DELETE /api/scout-content/:id - Delete an entry and its stored files.
pub async fn delete_scout_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_identity()?;

    let existing = state
        .repo
        .get_scout_content(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Scout content {} not found", id)))?;

    state.repo.delete_scout_content(&id).await?;

    for reference in [existing.picture, existing.video].into_iter().flatten() {
        if let Err(e) = state.store.delete(&reference).await {
            tracing::warn!("Failed to delete stored file {}: {}", reference, e);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn apply_scout_update(
    state: AppState,
    id: String,
    auth: AuthContext,
    form: ScoutContentForm,
    partial: bool,
) -> Result<Json<ScoutContentResponse>, AppError> {
    auth.require_identity()?;

    let existing = state
        .repo
        .get_scout_content(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Scout content {} not found", id)))?;

    let mut record = merge_scout_fields(&form.payload, Some(&existing), !partial)?;
    validate_scout_uploads(form.picture.as_ref(), form.video.as_ref())?;
    store_scout_uploads(&state, &mut record, form.picture, form.video).await?;

    let updated = state.repo.update_scout_content(&id, &record).await?;
    Ok(Json(updated.into()))
}

/// Resolve filter query parameters into typed values.
fn scout_filter(params: &ListParams) -> Result<ScoutContentFilter, AppError> {
    let scout_type = params
        .type_code
        .as_deref()
        .map(|code| ScoutType::from_str(code).ok_or_else(|| invalid_choice("type", code)))
        .transpose()?;

    let category = params
        .category
        .as_deref()
        .map(|code| ScoutCategory::from_str(code).ok_or_else(|| invalid_choice("category", code)))
        .transpose()?;

    let difficulty = params
        .difficulty
        .as_deref()
        .map(|raw| {
            raw.parse::<i64>()
                .ok()
                .and_then(Difficulty::from_i64)
                .ok_or_else(|| invalid_choice("difficulty", raw))
        })
        .transpose()?;

    Ok(ScoutContentFilter {
        scout_type,
        category,
        difficulty,
        search: params.search.as_deref().and_then(blank_to_none),
        ordering: params.ordering.clone(),
    })
}

/// Merge an incoming payload over the existing entry (if any) into the final
/// field values, running the field-level validators.
fn merge_scout_fields(
    payload: &ScoutContentPayload,
    existing: Option<&ScoutContent>,
    require_all: bool,
) -> Result<ScoutContentRecord, AppError> {
    let name = match payload.name.as_deref().and_then(blank_to_none) {
        Some(n) => n,
        None if payload.name.is_some() => {
            return Err(AppError::validation_field("name", "This field is required."));
        }
        None => match existing {
            Some(e) if !require_all => e.name.clone(),
            _ => return Err(AppError::validation_field("name", "This field is required.")),
        },
    };
    validate::check_max_length("name", &name)?;

    let scout_type = match payload.scout_type.as_deref() {
        Some(code) => ScoutType::from_str(code).ok_or_else(|| invalid_choice("type", code))?,
        None => match existing {
            Some(e) if !require_all => e.scout_type,
            _ => return Err(AppError::validation_field("type", "This field is required.")),
        },
    };

    let category = match payload.category.as_deref() {
        Some(code) => {
            ScoutCategory::from_str(code).ok_or_else(|| invalid_choice("category", code))?
        }
        None => match existing {
            Some(e) if !require_all => e.category,
            _ => {
                return Err(AppError::validation_field(
                    "category",
                    "This field is required.",
                ));
            }
        },
    };

    let difficulty = match payload.difficulty {
        Some(value) => Difficulty::from_i64(value)
            .ok_or_else(|| invalid_choice("difficulty", &value.to_string()))?,
        None => match existing {
            Some(e) if !require_all => e.difficulty,
            _ => {
                return Err(AppError::validation_field(
                    "difficulty",
                    "This field is required.",
                ));
            }
        },
    };

    let usage = match payload.usage.as_deref().and_then(blank_to_none) {
        Some(u) => u,
        None if payload.usage.is_some() => {
            return Err(AppError::validation_field("usage", "This field is required."));
        }
        None => match existing {
            Some(e) if !require_all => e.usage.clone(),
            _ => return Err(AppError::validation_field("usage", "This field is required.")),
        },
    };

    let youtube_link = merge_link("youtubeLink", payload.youtube_link.as_deref(), || {
        existing.and_then(|e| e.youtube_link.clone())
    })?;
    let model_3d_link = merge_link("model3dLink", payload.model_3d_link.as_deref(), || {
        existing.and_then(|e| e.model_3d_link.clone())
    })?;

    Ok(ScoutContentRecord {
        name,
        scout_type,
        category,
        difficulty,
        usage,
        youtube_link,
        model_3d_link,
        picture: existing.and_then(|e| e.picture.clone()),
        video: existing.and_then(|e| e.video.clone()),
    })
}

fn merge_link(
    field: &str,
    provided: Option<&str>,
    fallback: impl FnOnce() -> Option<String>,
) -> Result<Option<String>, AppError> {
    match provided {
        Some(value) => {
            let normalized = blank_to_none(value);
            if let Some(link) = &normalized {
                validate::check_url(field, link)?;
            }
            Ok(normalized)
        }
        None => Ok(fallback()),
    }
}

fn validate_scout_uploads(
    picture: Option<&UploadedFile>,
    video: Option<&UploadedFile>,
) -> Result<(), AppError> {
    if let Some(file) = picture {
        validate::check_content_type("picture", &file.content_type, "image")?;
    }
    if let Some(file) = video {
        validate::check_content_type("video", &file.content_type, "video")?;
    }
    Ok(())
}

/// Resolve storage paths and hand the upload bytes to the file store.
async fn store_scout_uploads(
    state: &AppState,
    record: &mut ScoutContentRecord,
    picture: Option<UploadedFile>,
    video: Option<UploadedFile>,
) -> Result<(), AppError> {
    if let Some(file) = picture {
        let path = scout_upload_path(record.category.as_str(), &record.name, &file.filename);
        record.picture = Some(state.store.store(&path, file.bytes).await?);
    }
    if let Some(file) = video {
        let path = scout_upload_path(record.category.as_str(), &record.name, &file.filename);
        record.video = Some(state.store.store(&path, file.bytes).await?);
    }
    Ok(())
}
