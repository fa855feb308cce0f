//! Music entry model: songs, chants, and claps.

use serde::{Deserialize, Serialize};

/// Kind of music entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MusicType {
    Song,
    Chant,
    Clap,
}

impl MusicType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MusicType::Song => "SONG",
            MusicType::Chant => "CHANT",
            MusicType::Clap => "CLAP",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SONG" => Some(MusicType::Song),
            "CHANT" => Some(MusicType::Chant),
            "CLAP" => Some(MusicType::Clap),
            _ => None,
        }
    }

    /// Human-readable display string.
    pub fn label(&self) -> &'static str {
        match self {
            MusicType::Song => "Song",
            MusicType::Chant => "Chant",
            MusicType::Clap => "Clap",
        }
    }
}

/// Category a music entry is filed under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MusicCategory {
    Campfire,
    Marching,
    Traditional,
    Fun,
}

impl MusicCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MusicCategory::Campfire => "CAMPFIRE",
            MusicCategory::Marching => "MARCHING",
            MusicCategory::Traditional => "TRADITIONAL",
            MusicCategory::Fun => "FUN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CAMPFIRE" => Some(MusicCategory::Campfire),
            "MARCHING" => Some(MusicCategory::Marching),
            "TRADITIONAL" => Some(MusicCategory::Traditional),
            "FUN" => Some(MusicCategory::Fun),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MusicCategory::Campfire => "Campfire",
            MusicCategory::Marching => "Marching",
            MusicCategory::Traditional => "Traditional",
            MusicCategory::Fun => "Fun",
        }
    }
}

/// Difficulty level, stored and serialized as its numeric value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "i64", into = "i64")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_i64(&self) -> i64 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Medium),
            3 => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Difficulty::from_i64(value).ok_or_else(|| format!("{} is not a valid difficulty", value))
    }
}

impl From<Difficulty> for i64 {
    fn from(value: Difficulty) -> Self {
        value.as_i64()
    }
}

/// A persisted music entry.
#[derive(Debug, Clone)]
pub struct Music {
    pub id: String,
    pub title: String,
    pub music_type: MusicType,
    pub lyrics: Option<String>,
    pub category: Option<MusicCategory>,
    pub difficulty: Option<Difficulty>,
    /// Stored-file references, relative to the media root
    pub audio_file: Option<String>,
    pub video_file: Option<String>,
    pub web_link: Option<String>,
    /// Author username; null once the identity is deleted
    pub author: Option<String>,
    pub created_at: String,
    pub last_updated: String,
}

/// Music entry as returned by the API, with display labels for choice fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicResponse {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub music_type: MusicType,
    pub type_display: &'static str,
    pub lyrics: Option<String>,
    pub category: Option<MusicCategory>,
    pub category_display: Option<&'static str>,
    pub difficulty: Option<Difficulty>,
    pub difficulty_display: Option<&'static str>,
    pub audio_file: Option<String>,
    pub video_file: Option<String>,
    pub web_link: Option<String>,
    pub author: Option<String>,
    pub created_at: String,
    pub last_updated: String,
}

impl From<Music> for MusicResponse {
    fn from(music: Music) -> Self {
        Self {
            id: music.id,
            title: music.title,
            music_type: music.music_type,
            type_display: music.music_type.label(),
            lyrics: music.lyrics,
            category: music.category,
            category_display: music.category.map(|c| c.label()),
            difficulty: music.difficulty,
            difficulty_display: music.difficulty.map(|d| d.label()),
            audio_file: music.audio_file,
            video_file: music.video_file,
            web_link: music.web_link,
            author: music.author,
            created_at: music.created_at,
            last_updated: music.last_updated,
        }
    }
}

/// Incoming music fields, shared by create and update payloads.
///
/// Choice fields stay raw strings here so the validators can report
/// field-scoped errors instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub music_type: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<i64>,
    #[serde(default)]
    pub web_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_music_type_round_trip() {
        for t in [MusicType::Song, MusicType::Chant, MusicType::Clap] {
            assert_eq!(MusicType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(MusicType::from_str("XYZ"), None);
    }

    #[test]
    fn test_difficulty_serializes_as_number() {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, "2");
        let back: Difficulty = serde_json::from_str("3").unwrap();
        assert_eq!(back, Difficulty::Hard);
        assert!(serde_json::from_str::<Difficulty>("4").is_err());
    }

    #[test]
    fn test_response_display_labels() {
        let music = Music {
            id: "1".into(),
            title: "Camp Song".into(),
            music_type: MusicType::Song,
            lyrics: None,
            category: Some(MusicCategory::Campfire),
            difficulty: Some(Difficulty::Easy),
            audio_file: None,
            video_file: None,
            web_link: Some("https://example.com".into()),
            author: None,
            created_at: "2024-01-01T00:00:00Z".into(),
            last_updated: "2024-01-01T00:00:00Z".into(),
        };
        let resp = MusicResponse::from(music);
        assert_eq!(resp.type_display, "Song");
        assert_eq!(resp.category_display, Some("Campfire"));
        assert_eq!(resp.difficulty_display, Some("Easy"));

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["type"], "SONG");
        assert_eq!(value["typeDisplay"], "Song");
        assert_eq!(value["difficulty"], 1);
        assert!(value["lyrics"].is_null());
    }
}
