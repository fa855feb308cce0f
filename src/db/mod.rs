//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        // Carries the ON DELETE SET NULL rule for author references
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS identities (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS music (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            type TEXT NOT NULL,
            lyrics TEXT,
            category TEXT,
            difficulty INTEGER,
            audio_file TEXT,
            video_file TEXT,
            web_link TEXT,
            author_id TEXT REFERENCES identities(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            last_updated TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scout_content (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            category TEXT NOT NULL,
            difficulty INTEGER NOT NULL,
            usage TEXT NOT NULL,
            youtube_link TEXT,
            model_3d_link TEXT,
            picture TEXT,
            video TEXT,
            author_id TEXT REFERENCES identities(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            last_updated TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Indexes for the filterable columns and the default ordering
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_music_type ON music(type);
        CREATE INDEX IF NOT EXISTS idx_music_category ON music(category);
        CREATE INDEX IF NOT EXISTS idx_music_created_at ON music(created_at);
        CREATE INDEX IF NOT EXISTS idx_scout_content_type ON scout_content(type);
        CREATE INDEX IF NOT EXISTS idx_scout_content_category ON scout_content(category);
        CREATE INDEX IF NOT EXISTS idx_scout_content_created_at ON scout_content(created_at);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
