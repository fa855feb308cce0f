//! Scout content model: knots and lashings.

use serde::{Deserialize, Serialize};

use super::Difficulty;

/// Kind of scout content entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScoutType {
    #[serde(rename = "KNOT")]
    Knot,
    #[serde(rename = "LASHING_1")]
    Lashing1,
    #[serde(rename = "LASHING_2")]
    Lashing2,
}

impl ScoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoutType::Knot => "KNOT",
            ScoutType::Lashing1 => "LASHING_1",
            ScoutType::Lashing2 => "LASHING_2",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "KNOT" => Some(ScoutType::Knot),
            "LASHING_1" => Some(ScoutType::Lashing1),
            "LASHING_2" => Some(ScoutType::Lashing2),
            _ => None,
        }
    }

    /// Human-readable display string (Arabic, matching the published site).
    pub fn label(&self) -> &'static str {
        match self {
            ScoutType::Knot => "عقدة",
            ScoutType::Lashing1 => "ربطة 1",
            ScoutType::Lashing2 => "ربطة 2",
        }
    }
}

/// Category a scout content entry is filed under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoutCategory {
    Pioneering,
    Knots,
}

impl ScoutCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoutCategory::Pioneering => "PIONEERING",
            ScoutCategory::Knots => "KNOTS",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PIONEERING" => Some(ScoutCategory::Pioneering),
            "KNOTS" => Some(ScoutCategory::Knots),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoutCategory::Pioneering => "عمل ريادي",
            ScoutCategory::Knots => "عقد",
        }
    }
}

/// A persisted scout content entry.
#[derive(Debug, Clone)]
pub struct ScoutContent {
    pub id: String,
    pub name: String,
    pub scout_type: ScoutType,
    pub category: ScoutCategory,
    pub difficulty: Difficulty,
    pub usage: String,
    pub youtube_link: Option<String>,
    pub model_3d_link: Option<String>,
    /// Stored-file references, relative to the media root
    pub picture: Option<String>,
    pub video: Option<String>,
    /// Author username; null once the identity is deleted
    pub author: Option<String>,
    pub created_at: String,
    pub last_updated: String,
}

/// Scout content entry as returned by the API, with display labels.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoutContentResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub scout_type: ScoutType,
    pub type_display: &'static str,
    pub category: ScoutCategory,
    pub category_display: &'static str,
    pub difficulty: Difficulty,
    pub difficulty_display: &'static str,
    pub usage: String,
    pub youtube_link: Option<String>,
    pub model_3d_link: Option<String>,
    pub picture: Option<String>,
    pub video: Option<String>,
    pub author: Option<String>,
    pub created_at: String,
    pub last_updated: String,
}

impl From<ScoutContent> for ScoutContentResponse {
    fn from(content: ScoutContent) -> Self {
        Self {
            id: content.id,
            name: content.name,
            scout_type: content.scout_type,
            type_display: content.scout_type.label(),
            category: content.category,
            category_display: content.category.label(),
            difficulty: content.difficulty,
            difficulty_display: content.difficulty.label(),
            usage: content.usage,
            youtube_link: content.youtube_link,
            model_3d_link: content.model_3d_link,
            picture: content.picture,
            video: content.video,
            author: content.author,
            created_at: content.created_at,
            last_updated: content.last_updated,
        }
    }
}

/// Incoming scout content fields, shared by create and update payloads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoutContentPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub scout_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<i64>,
    #[serde(default)]
    pub usage: Option<String>,
    #[serde(default)]
    pub youtube_link: Option<String>,
    #[serde(default)]
    pub model_3d_link: Option<String>,
}
