//! Music API endpoints.

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
use crate::db::{MusicFilter, MusicRecord};
use crate::errors::AppError;
use crate::models::{Difficulty, Music, MusicCategory, MusicPayload, MusicResponse, MusicType};
use crate::storage::music_upload_path;
use crate::validate;
use crate::AppState;

/// Create/update body for a music entry: JSON metadata, or a multipart form
/// carrying the same fields plus `audioFile`/`videoFile` parts.
pub struct MusicForm {
    pub payload: MusicPayload,
    pub audio_file: Option<UploadedFile>,
    pub video_file: Option<UploadedFile>,
}

impl<S> FromRequest<S> for MusicForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Json(payload) = Json::<MusicPayload>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(format!("Malformed JSON body: {}", e)))?;
            return Ok(Self {
                payload,
                audio_file: None,
                video_file: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?;

        let mut form = Self {
            payload: MusicPayload::default(),
            audio_file: None,
            video_file: None,
        };

        while let Some(field) = multipart.next_field().await.map_err(super::bad_multipart)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "title" => form.payload.title = Some(text_field(field).await?),
                "type" => form.payload.music_type = Some(text_field(field).await?),
                "lyrics" => form.payload.lyrics = Some(text_field(field).await?),
                "category" => form.payload.category = Some(text_field(field).await?),
                "difficulty" => form.payload.difficulty = int_field("difficulty", field).await?,
                "webLink" => form.payload.web_link = Some(text_field(field).await?),
                "audioFile" => form.audio_file = file_field(field).await?,
                "videoFile" => form.video_file = file_field(field).await?,
                _ => {}
            }
        }

        Ok(form)
    }
}

/// GET /api/music - List music entries with filtering, search, and ordering.
pub async fn list_music(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<MusicResponse>>, AppError> {
    let filter = music_filter(&params)?;
    let entries = state.repo.list_music(&filter).await?;
    Ok(Json(entries.into_iter().map(MusicResponse::from).collect()))
}

/// GET /api/music/:id - Get a single music entry.
pub async fn get_music(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MusicResponse>, AppError> {
    let music = state
        .repo
        .get_music(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Music entry {} not found", id)))?;
    Ok(Json(music.into()))
}

/// POST /api/music - Create a new music entry. Authenticated only.
pub async fn create_music(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    form: MusicForm,
) -> Result<(StatusCode, Json<MusicResponse>), AppError> {
    let identity = auth.require_identity()?.clone();

    let mut record = merge_music_fields(&form.payload, None, true)?;
    validate_music_uploads(&record, form.audio_file.as_ref(), form.video_file.as_ref())?;
    store_music_uploads(&state, &mut record, form.audio_file, form.video_file).await?;

    let music = state.repo.create_music(&record, Some(&identity)).await?;
    tracing::info!("Music entry {} created by {}", music.id, identity.username);
    Ok((StatusCode::CREATED, Json(music.into())))
}

/// PUT /api/music/:id - Full update. Authenticated only.
pub async fn update_music(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthContext>,
    form: MusicForm,
) -> Result<Json<MusicResponse>, AppError> {
    apply_music_update(state, id, auth, form, false).await
}

/// PATCH /api/music/:id - Partial update. Authenticated only.
pub async fn partial_update_music(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthContext>,
    form: MusicForm,
) -> Result<Json<MusicResponse>, AppError> {
    apply_music_update(state, id, auth, form, true).await
}

/// DELETE /api/music/:id - Delete an entry and its stored files. Authenticated only.
pub async fn delete_music(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_identity()?;

    let existing = state
        .repo
        .get_music(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Music entry {} not found", id)))?;

    state.repo.delete_music(&id).await?;

    // File cleanup is best-effort; the record is already gone
    for reference in [existing.audio_file, existing.video_file]
        .into_iter()
        .flatten()
    {
        if let Err(e) = state.store.delete(&reference).await {
            tracing::warn!("Failed to delete stored file {}: {}", reference, e);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn apply_music_update(
    state: AppState,
    id: String,
    auth: AuthContext,
    form: MusicForm,
    partial: bool,
) -> Result<Json<MusicResponse>, AppError> {
    auth.require_identity()?;

    let existing = state
        .repo
        .get_music(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Music entry {} not found", id)))?;

    let mut record = merge_music_fields(&form.payload, Some(&existing), !partial)?;
    validate_music_uploads(&record, form.audio_file.as_ref(), form.video_file.as_ref())?;
    store_music_uploads(&state, &mut record, form.audio_file, form.video_file).await?;

    let updated = state.repo.update_music(&id, &record).await?;
    Ok(Json(updated.into()))
}

/// Resolve filter query parameters into typed values.
fn music_filter(params: &ListParams) -> Result<MusicFilter, AppError> {
    let music_type = params
        .type_code
        .as_deref()
        .map(|code| MusicType::from_str(code).ok_or_else(|| invalid_choice("type", code)))
        .transpose()?;

    let category = params
        .category
        .as_deref()
        .map(|code| MusicCategory::from_str(code).ok_or_else(|| invalid_choice("category", code)))
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

    Ok(MusicFilter {
        music_type,
        category,
        difficulty,
        search: params.search.as_deref().and_then(blank_to_none),
        ordering: params.ordering.clone(),
    })
}

/// Merge an incoming payload over the existing entry (if any) into the final
/// field values, running the field-level validators.
///
/// `require_all` enforces the presence of required fields in the payload
/// itself (create and PUT); PATCH falls back to stored values. Fields absent
/// from the payload keep their stored values; provided-but-blank clears.
fn merge_music_fields(
    payload: &MusicPayload,
    existing: Option<&Music>,
    require_all: bool,
) -> Result<MusicRecord, AppError> {
    let title = match payload.title.as_deref().and_then(blank_to_none) {
        Some(t) => t,
        None if payload.title.is_some() => {
            return Err(AppError::validation_field("title", "This field is required."));
        }
        None => match existing {
            Some(e) if !require_all => e.title.clone(),
            _ => return Err(AppError::validation_field("title", "This field is required.")),
        },
    };
    validate::check_max_length("title", &title)?;

    let music_type = match payload.music_type.as_deref() {
        Some(code) => MusicType::from_str(code).ok_or_else(|| invalid_choice("type", code))?,
        None => match existing {
            Some(e) if !require_all => e.music_type,
            _ => return Err(AppError::validation_field("type", "This field is required.")),
        },
    };

    let lyrics = match payload.lyrics.as_deref() {
        Some(value) => blank_to_none(value),
        None => existing.and_then(|e| e.lyrics.clone()),
    };

    let category = match payload.category.as_deref() {
        Some(code) if code.trim().is_empty() => None,
        Some(code) => {
            Some(MusicCategory::from_str(code).ok_or_else(|| invalid_choice("category", code))?)
        }
        None => existing.and_then(|e| e.category),
    };

    let difficulty = match payload.difficulty {
        Some(value) => Some(
            Difficulty::from_i64(value)
                .ok_or_else(|| invalid_choice("difficulty", &value.to_string()))?,
        ),
        None => existing.and_then(|e| e.difficulty),
    };

    let web_link = match payload.web_link.as_deref() {
        Some(value) => {
            let normalized = blank_to_none(value);
            if let Some(link) = &normalized {
                validate::check_url("webLink", link)?;
            }
            normalized
        }
        None => existing.and_then(|e| e.web_link.clone()),
    };

    Ok(MusicRecord {
        title,
        music_type,
        lyrics,
        category,
        difficulty,
        audio_file: existing.and_then(|e| e.audio_file.clone()),
        video_file: existing.and_then(|e| e.video_file.clone()),
        web_link,
    })
}

/// Content-type checks and the whole-entity content invariant, before any
/// bytes are stored.
fn validate_music_uploads(
    record: &MusicRecord,
    audio: Option<&UploadedFile>,
    video: Option<&UploadedFile>,
) -> Result<(), AppError> {
    if let Some(file) = audio {
        validate::check_content_type("audioFile", &file.content_type, "audio")?;
    }
    if let Some(file) = video {
        validate::check_content_type("videoFile", &file.content_type, "video")?;
    }

    validate::check_music_has_content(
        record.lyrics.as_deref(),
        record.audio_file.is_some() || audio.is_some(),
        record.video_file.is_some() || video.is_some(),
        record.web_link.as_deref(),
    )
}

/// Resolve storage paths and hand the upload bytes to the file store.
async fn store_music_uploads(
    state: &AppState,
    record: &mut MusicRecord,
    audio: Option<UploadedFile>,
    video: Option<UploadedFile>,
) -> Result<(), AppError> {
    if let Some(file) = audio {
        let path = music_upload_path(record.music_type.as_str(), &record.title, &file.filename);
        record.audio_file = Some(state.store.store(&path, file.bytes).await?);
    }
    if let Some(file) = video {
        let path = music_upload_path(record.music_type.as_str(), &record.title, &file.filename);
        record.video_file = Some(state.store.store(&path, file.bytes).await?);
    }
    Ok(())
}
