//! Database repository for CRUD operations.
//!
//! Uses prepared statements with bound parameters; list queries are assembled
//! with `QueryBuilder` so filters compose without string interpolation.

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Difficulty, Identity, Music, MusicCategory, MusicType, ScoutCategory, ScoutContent, ScoutType,
};

const MUSIC_COLUMNS: &str = "m.id, m.title, m.type, m.lyrics, m.category, m.difficulty, \
     m.audio_file, m.video_file, m.web_link, i.username AS author, m.created_at, m.last_updated";

const SCOUT_COLUMNS: &str = "m.id, m.name, m.type, m.category, m.difficulty, m.usage, \
     m.youtube_link, m.model_3d_link, m.picture, m.video, i.username AS author, \
     m.created_at, m.last_updated";

/// Filter, search, and ordering parameters for the music list query.
#[derive(Debug, Default)]
pub struct MusicFilter {
    pub music_type: Option<MusicType>,
    pub category: Option<MusicCategory>,
    pub difficulty: Option<Difficulty>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// Filter, search, and ordering parameters for the scout content list query.
#[derive(Debug, Default)]
pub struct ScoutContentFilter {
    pub scout_type: Option<ScoutType>,
    pub category: Option<ScoutCategory>,
    pub difficulty: Option<Difficulty>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// Final field values for a music row write (create or full update).
#[derive(Debug, Clone)]
pub struct MusicRecord {
    pub title: String,
    pub music_type: MusicType,
    pub lyrics: Option<String>,
    pub category: Option<MusicCategory>,
    pub difficulty: Option<Difficulty>,
    pub audio_file: Option<String>,
    pub video_file: Option<String>,
    pub web_link: Option<String>,
}

/// Final field values for a scout content row write.
#[derive(Debug, Clone)]
pub struct ScoutContentRecord {
    pub name: String,
    pub scout_type: ScoutType,
    pub category: ScoutCategory,
    pub difficulty: Difficulty,
    pub usage: String,
    pub youtube_link: Option<String>,
    pub model_3d_link: Option<String>,
    pub picture: Option<String>,
    pub video: Option<String>,
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== IDENTITY OPERATIONS ====================

    /// Look up an identity by username, creating it if missing.
    pub async fn ensure_identity(&self, username: &str) -> Result<Identity, AppError> {
        if let Some(identity) = self.get_identity_by_username(username).await? {
            return Ok(identity);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO identities (id, username, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(username)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(Identity {
            id,
            username: username.to_string(),
        })
    }

    pub async fn get_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query("SELECT id, username FROM identities WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Identity {
            id: r.get("id"),
            username: r.get("username"),
        }))
    }

    /// Delete an identity. Author references on existing entities are cleared
    /// to null by the foreign-key ON DELETE SET NULL rule.
    pub async fn delete_identity(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM identities WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Identity {} not found", id)));
        }
        Ok(())
    }

    // ==================== MUSIC OPERATIONS ====================

    /// List music entries matching the filter.
    pub async fn list_music(&self, filter: &MusicFilter) -> Result<Vec<Music>, AppError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM music m LEFT JOIN identities i ON i.id = m.author_id WHERE 1 = 1",
            MUSIC_COLUMNS
        ));

        if let Some(t) = filter.music_type {
            qb.push(" AND m.type = ").push_bind(t.as_str());
        }
        if let Some(c) = filter.category {
            qb.push(" AND m.category = ").push_bind(c.as_str());
        }
        if let Some(d) = filter.difficulty {
            qb.push(" AND m.difficulty = ").push_bind(d.as_i64());
        }
        if let Some(q) = &filter.search {
            let pattern = like_pattern(q);
            qb.push(" AND (m.title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR m.lyrics LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        qb.push(" ORDER BY ");
        qb.push(music_order_clause(filter.ordering.as_deref()));

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(music_from_row).collect()
    }

    /// Get a music entry by ID.
    pub async fn get_music(&self, id: &str) -> Result<Option<Music>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM music m LEFT JOIN identities i ON i.id = m.author_id WHERE m.id = ?",
            MUSIC_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(music_from_row).transpose()
    }

    /// Insert a new music entry.
    pub async fn create_music(
        &self,
        record: &MusicRecord,
        author: Option<&Identity>,
    ) -> Result<Music, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO music (
                id, title, type, lyrics, category, difficulty,
                audio_file, video_file, web_link, author_id, created_at, last_updated
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&record.title)
        .bind(record.music_type.as_str())
        .bind(&record.lyrics)
        .bind(record.category.map(|c| c.as_str()))
        .bind(record.difficulty.map(|d| d.as_i64()))
        .bind(&record.audio_file)
        .bind(&record.video_file)
        .bind(&record.web_link)
        .bind(author.map(|a| a.id.as_str()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Music {
            id,
            title: record.title.clone(),
            music_type: record.music_type,
            lyrics: record.lyrics.clone(),
            category: record.category,
            difficulty: record.difficulty,
            audio_file: record.audio_file.clone(),
            video_file: record.video_file.clone(),
            web_link: record.web_link.clone(),
            author: author.map(|a| a.username.clone()),
            created_at: now.clone(),
            last_updated: now,
        })
    }

    /// Persist the merged state of an existing music entry.
    ///
    /// Refreshes `last_updated`; `created_at` and the author reference are
    /// never touched after creation.
    pub async fn update_music(&self, id: &str, record: &MusicRecord) -> Result<Music, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"UPDATE music SET
                title = ?, type = ?, lyrics = ?, category = ?, difficulty = ?,
                audio_file = ?, video_file = ?, web_link = ?, last_updated = ?
            WHERE id = ?"#,
        )
        .bind(&record.title)
        .bind(record.music_type.as_str())
        .bind(&record.lyrics)
        .bind(record.category.map(|c| c.as_str()))
        .bind(record.difficulty.map(|d| d.as_i64()))
        .bind(&record.audio_file)
        .bind(&record.video_file)
        .bind(&record.web_link)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Music entry {} not found", id)));
        }

        self.get_music(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Music entry {} not found", id)))
    }

    /// Delete a music entry.
    pub async fn delete_music(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM music WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Music entry {} not found", id)));
        }
        Ok(())
    }

    // ==================== SCOUT CONTENT OPERATIONS ====================

    /// List scout content entries matching the filter.
    pub async fn list_scout_content(
        &self,
        filter: &ScoutContentFilter,
    ) -> Result<Vec<ScoutContent>, AppError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM scout_content m LEFT JOIN identities i ON i.id = m.author_id WHERE 1 = 1",
            SCOUT_COLUMNS
        ));

        if let Some(t) = filter.scout_type {
            qb.push(" AND m.type = ").push_bind(t.as_str());
        }
        if let Some(c) = filter.category {
            qb.push(" AND m.category = ").push_bind(c.as_str());
        }
        if let Some(d) = filter.difficulty {
            qb.push(" AND m.difficulty = ").push_bind(d.as_i64());
        }
        if let Some(q) = &filter.search {
            let pattern = like_pattern(q);
            qb.push(" AND (m.name LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR m.usage LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        qb.push(" ORDER BY ");
        qb.push(scout_order_clause(filter.ordering.as_deref()));

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(scout_content_from_row).collect()
    }

    /// Get a scout content entry by ID.
    pub async fn get_scout_content(&self, id: &str) -> Result<Option<ScoutContent>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM scout_content m LEFT JOIN identities i ON i.id = m.author_id WHERE m.id = ?",
            SCOUT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(scout_content_from_row).transpose()
    }

    /// Insert a new scout content entry.
    pub async fn create_scout_content(
        &self,
        record: &ScoutContentRecord,
        author: Option<&Identity>,
    ) -> Result<ScoutContent, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO scout_content (
                id, name, type, category, difficulty, usage,
                youtube_link, model_3d_link, picture, video,
                author_id, created_at, last_updated
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&record.name)
        .bind(record.scout_type.as_str())
        .bind(record.category.as_str())
        .bind(record.difficulty.as_i64())
        .bind(&record.usage)
        .bind(&record.youtube_link)
        .bind(&record.model_3d_link)
        .bind(&record.picture)
        .bind(&record.video)
        .bind(author.map(|a| a.id.as_str()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(ScoutContent {
            id,
            name: record.name.clone(),
            scout_type: record.scout_type,
            category: record.category,
            difficulty: record.difficulty,
            usage: record.usage.clone(),
            youtube_link: record.youtube_link.clone(),
            model_3d_link: record.model_3d_link.clone(),
            picture: record.picture.clone(),
            video: record.video.clone(),
            author: author.map(|a| a.username.clone()),
            created_at: now.clone(),
            last_updated: now,
        })
    }

    /// Persist the merged state of an existing scout content entry.
    pub async fn update_scout_content(
        &self,
        id: &str,
        record: &ScoutContentRecord,
    ) -> Result<ScoutContent, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"UPDATE scout_content SET
                name = ?, type = ?, category = ?, difficulty = ?, usage = ?,
                youtube_link = ?, model_3d_link = ?, picture = ?, video = ?,
                last_updated = ?
            WHERE id = ?"#,
        )
        .bind(&record.name)
        .bind(record.scout_type.as_str())
        .bind(record.category.as_str())
        .bind(record.difficulty.as_i64())
        .bind(&record.usage)
        .bind(&record.youtube_link)
        .bind(&record.model_3d_link)
        .bind(&record.picture)
        .bind(&record.video)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Scout content {} not found",
                id
            )));
        }

        self.get_scout_content(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Scout content {} not found", id)))
    }

    /// Delete a scout content entry.
    pub async fn delete_scout_content(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM scout_content WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Scout content {} not found",
                id
            )));
        }
        Ok(())
    }
}

/// ORDER BY clause for music lists; unknown keys fall back to newest-first.
fn music_order_clause(key: Option<&str>) -> &'static str {
    match key.unwrap_or("-createdAt").trim() {
        "title" => "m.title ASC",
        "-title" => "m.title DESC",
        "type" => "m.type ASC",
        "-type" => "m.type DESC",
        "category" => "m.category ASC",
        "-category" => "m.category DESC",
        "difficulty" => "m.difficulty ASC",
        "-difficulty" => "m.difficulty DESC",
        "createdAt" => "m.created_at ASC",
        "lastUpdated" => "m.last_updated ASC",
        "-lastUpdated" => "m.last_updated DESC",
        _ => "m.created_at DESC",
    }
}

/// ORDER BY clause for scout content lists.
fn scout_order_clause(key: Option<&str>) -> &'static str {
    match key.unwrap_or("-createdAt").trim() {
        "name" => "m.name ASC",
        "-name" => "m.name DESC",
        "type" => "m.type ASC",
        "-type" => "m.type DESC",
        "category" => "m.category ASC",
        "-category" => "m.category DESC",
        "difficulty" => "m.difficulty ASC",
        "-difficulty" => "m.difficulty DESC",
        "createdAt" => "m.created_at ASC",
        "lastUpdated" => "m.last_updated ASC",
        "-lastUpdated" => "m.last_updated DESC",
        _ => "m.created_at DESC",
    }
}

/// Substring pattern for LIKE with %, _ and \ escaped.
fn like_pattern(q: &str) -> String {
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

// Helper functions for row conversion

fn music_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Music, AppError> {
    let type_code: String = row.get("type");
    let music_type = MusicType::from_str(&type_code)
        .ok_or_else(|| AppError::Internal(format!("Unknown music type code {}", type_code)))?;

    let category_code: Option<String> = row.get("category");
    let difficulty_value: Option<i64> = row.get("difficulty");

    Ok(Music {
        id: row.get("id"),
        title: row.get("title"),
        music_type,
        lyrics: row.get("lyrics"),
        category: category_code.as_deref().and_then(MusicCategory::from_str),
        difficulty: difficulty_value.and_then(Difficulty::from_i64),
        audio_file: row.get("audio_file"),
        video_file: row.get("video_file"),
        web_link: row.get("web_link"),
        author: row.get("author"),
        created_at: row.get("created_at"),
        last_updated: row.get("last_updated"),
    })
}

fn scout_content_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ScoutContent, AppError> {
    let type_code: String = row.get("type");
    let scout_type = ScoutType::from_str(&type_code)
        .ok_or_else(|| AppError::Internal(format!("Unknown scout type code {}", type_code)))?;

    let category_code: String = row.get("category");
    let category = ScoutCategory::from_str(&category_code)
        .ok_or_else(|| AppError::Internal(format!("Unknown category code {}", category_code)))?;

    let difficulty_value: i64 = row.get("difficulty");
    let difficulty = Difficulty::from_i64(difficulty_value).ok_or_else(|| {
        AppError::Internal(format!("Unknown difficulty value {}", difficulty_value))
    })?;

    Ok(ScoutContent {
        id: row.get("id"),
        name: row.get("name"),
        scout_type,
        category,
        difficulty,
        usage: row.get("usage"),
        youtube_link: row.get("youtube_link"),
        model_3d_link: row.get("model_3d_link"),
        picture: row.get("picture"),
        video: row.get("video"),
        author: row.get("author"),
        created_at: row.get("created_at"),
        last_updated: row.get("last_updated"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_whitelist() {
        assert_eq!(music_order_clause(None), "m.created_at DESC");
        assert_eq!(music_order_clause(Some("title")), "m.title ASC");
        assert_eq!(music_order_clause(Some("-title")), "m.title DESC");
        assert_eq!(music_order_clause(Some("createdAt")), "m.created_at ASC");
        // Unknown keys fall back to the default order
        assert_eq!(music_order_clause(Some("author")), "m.created_at DESC");
        assert_eq!(
            music_order_clause(Some("title; DROP TABLE music")),
            "m.created_at DESC"
        );
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("camp"), "%camp%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
