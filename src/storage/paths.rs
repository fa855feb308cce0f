//! Upload path resolution.
//!
//! Pure string mapping from an entity's declared type/category and an uploaded
//! filename to its canonical relative path under the media root. Total
//! functions: unrecognized codes fall back to an `other` folder, never an error.

/// Extensions classified as audio uploads.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a"];

/// Extensions classified as video uploads.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// Classify an uploaded filename as `audio`, `video`, or `other` by extension.
pub fn media_kind(filename: &str) -> &'static str {
    let ext = extension(filename).to_ascii_lowercase();
    let ext = ext.trim_start_matches('.');
    if AUDIO_EXTENSIONS.contains(&ext) {
        "audio"
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        "video"
    } else {
        "other"
    }
}

/// Resolve the storage path for a music upload.
///
/// `music/<typeFolder>/<mediaKind>/<title><ext>`. The filename is rewritten
/// from the entry title, so identical titles collide and silently overwrite
/// the prior upload; that is accepted behavior.
pub fn music_upload_path(type_code: &str, title: &str, filename: &str) -> String {
    let type_folder = match type_code {
        "SONG" => "songs",
        "CHANT" => "chants",
        "CLAP" => "claps",
        _ => "other",
    };

    let ext = extension(filename).to_ascii_lowercase();
    format!(
        "music/{}/{}/{}{}",
        type_folder,
        media_kind(filename),
        title,
        ext
    )
}

/// Resolve the storage path for a scout content upload.
///
/// `scout_content/<categoryFolder>/<mediaKind>/<name><ext>`, with spaces in
/// the name replaced by underscores.
pub fn scout_upload_path(category_code: &str, name: &str, filename: &str) -> String {
    let category_folder = match category_code {
        "PIONEERING" => "pioneering",
        "KNOTS" => "knots",
        _ => "other",
    };

    let ext = extension(filename).to_ascii_lowercase();
    format!(
        "scout_content/{}/{}/{}{}",
        category_folder,
        media_kind(filename),
        name.replace(' ', "_"),
        ext
    )
}

/// The extension of `filename` including its leading dot, or an empty string.
fn extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[idx..],
        _ => "",
    }
}
