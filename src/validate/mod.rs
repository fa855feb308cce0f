//! Field-level and cross-field validation applied before persistence.

use url::Url;

use crate::errors::AppError;

/// Maximum length for titles, names, and URL fields.
pub const MAX_CHAR_LENGTH: usize = 200;

/// Check an uploaded file's declared content type against the expected
/// top-level type (`audio`, `video`, `image`).
pub fn check_content_type(
    field: &str,
    declared: &str,
    expected_prefix: &str,
) -> Result<(), AppError> {
    let main_type = declared.split('/').next().unwrap_or_default();
    if main_type != expected_prefix {
        return Err(AppError::validation_field(
            field,
            format!(
                "Unsupported file type. Please upload {} {} file.",
                article(expected_prefix),
                expected_prefix
            ),
        ));
    }
    Ok(())
}

/// Check a text field against the maximum character length.
pub fn check_max_length(field: &str, value: &str) -> Result<(), AppError> {
    if value.chars().count() > MAX_CHAR_LENGTH {
        return Err(AppError::validation_field(
            field,
            format!("Ensure this field has no more than {} characters.", MAX_CHAR_LENGTH),
        ));
    }
    Ok(())
}

/// Check that a link field holds a well-formed http(s) URL.
pub fn check_url(field: &str, value: &str) -> Result<(), AppError> {
    check_max_length(field, value)?;
    let parsed = Url::parse(value)
        .map_err(|_| AppError::validation_field(field, "Enter a valid URL."))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::validation_field(field, "Enter a valid URL."));
    }
    Ok(())
}

/// Whole-entity invariant for music entries: at least one of lyrics (after
/// trimming), audio file, video file, or web link must be present.
pub fn check_music_has_content(
    lyrics: Option<&str>,
    has_audio: bool,
    has_video: bool,
    web_link: Option<&str>,
) -> Result<(), AppError> {
    let has_lyrics = lyrics.is_some_and(|l| !l.trim().is_empty());
    if has_lyrics || has_audio || has_video || web_link.is_some() {
        return Ok(());
    }
    Err(AppError::validation(
        "A music entry needs at least one of lyrics, an audio file, a video file, or a web link.",
    ))
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: AppError) -> Option<String> {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {}", other),
        }
    }

    #[test]
    fn test_content_type_prefix_match() {
        assert!(check_content_type("audioFile", "audio/mpeg", "audio").is_ok());
        assert!(check_content_type("videoFile", "video/mp4", "video").is_ok());
        assert!(check_content_type("picture", "image/png", "image").is_ok());
    }

    #[test]
    fn test_content_type_mismatch_names_field() {
        let err = check_content_type("audioFile", "video/mp4", "audio").unwrap_err();
        assert_eq!(field_of(err).as_deref(), Some("audioFile"));
    }

    #[test]
    fn test_max_length() {
        assert!(check_max_length("title", &"x".repeat(200)).is_ok());
        assert!(check_max_length("title", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(check_url("webLink", "https://youtube.com/watch?v=1").is_ok());
        assert!(check_url("webLink", "http://example.com").is_ok());
        assert!(check_url("webLink", "not a url").is_err());
        assert!(check_url("webLink", "ftp://example.com/file").is_err());
    }

    #[test]
    fn test_music_content_invariant() {
        assert!(check_music_has_content(None, false, false, None).is_err());
        assert!(check_music_has_content(Some("   "), false, false, None).is_err());
        assert!(check_music_has_content(Some("words"), false, false, None).is_ok());
        assert!(check_music_has_content(None, true, false, None).is_ok());
        assert!(check_music_has_content(None, false, false, Some("https://x.com")).is_ok());

        let err = check_music_has_content(None, false, false, None).unwrap_err();
        assert!(field_of(err).is_none());
    }
}
