//! # ms-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `ms-core` domain models.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ms_core::error::{AppError, Result};
use ms_core::models::{Comment, CommentView, MediaItem, Rating, RatingView, User};
use ms_core::traits::MediaRepo;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const MEDIA_COLUMNS: &str = "id, creator_id, file, content_type, title, caption, location, \
                             people_present, created_at, is_active";

const SEARCH_FILTER: &str = r"is_active = 1 AND (title LIKE ? ESCAPE '\' OR caption LIKE ? ESCAPE '\' OR location LIKE ? ESCAPE '\')";

pub struct SqliteMediaRepo {
    pool: SqlitePool,
}

impl SqliteMediaRepo {
    /// Connects to a database URL such as `sqlite:mediashare.db` or
    /// `sqlite::memory:` and brings the schema up to date.
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url).map_err(db_err)?;
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        Self::connect(options, max_connections, in_memory).await
    }

    /// Opens (creating if needed) a database file.
    pub async fn open(path: &Path, max_connections: u32) -> Result<Self> {
        Self::connect(SqliteConnectOptions::new().filename(path), max_connections, false).await
    }

    async fn connect(options: SqliteConnectOptions, max_connections: u32, in_memory: bool) -> Result<Self> {
        let options = options
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // Every connection to `:memory:` is a separate database, so an
        // in-memory store lives on exactly one connection that is never recycled.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options.journal_mode(SqliteJournalMode::Wal))
                .await
        }
        .map_err(db_err)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {e}")))?;

        Ok(Self { pool })
    }
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Result<Uuid> {
    Uuid::from_slice(blob).map_err(|e| AppError::Internal(format!("corrupt id column: {e}")))
}

fn get_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    blob_to_uuid(row.try_get::<Vec<u8>, _>(column).map_err(db_err)?.as_slice())
}

/// Unique-index races and lock contention become `Conflict` so callers can
/// retry; everything else is an internal failure.
fn db_err(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::Conflict(db.message().to_string());
        }
        if db.is_foreign_key_violation() {
            return AppError::ValidationError("referenced record does not exist".into());
        }
        if is_lock_contention(db.code().as_deref()) {
            return AppError::Conflict(db.message().to_string());
        }
    }
    log::error!("sqlite error: {e}");
    AppError::Internal(e.to_string())
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// SQLITE_BUSY or SQLITE_LOCKED, including every extended code built on them
/// (the primary result code lives in the low byte).
fn is_lock_contention(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

/// Escapes LIKE wildcards so the query is matched literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: get_uuid(row, "id")?,
        username: row.try_get("username").map_err(db_err)?,
        role: row.try_get::<String, _>("role").map_err(db_err)?.parse()?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

/// Reads the author columns a joined comment/rating query aliases with `author_`.
fn row_to_author(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: get_uuid(row, "author_id")?,
        username: row.try_get("author_username").map_err(db_err)?,
        role: row
            .try_get::<String, _>("author_role")
            .map_err(db_err)?
            .parse()?,
        created_at: row.try_get("author_created_at").map_err(db_err)?,
    })
}

fn row_to_media(row: &SqliteRow) -> Result<MediaItem> {
    Ok(MediaItem {
        id: get_uuid(row, "id")?,
        creator_id: get_uuid(row, "creator_id")?,
        file: row.try_get("file").map_err(db_err)?,
        content_type: row.try_get("content_type").map_err(db_err)?,
        title: row.try_get("title").map_err(db_err)?,
        caption: row.try_get("caption").map_err(db_err)?,
        location: row.try_get("location").map_err(db_err)?,
        people_present: row.try_get("people_present").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        is_active: row.try_get("is_active").map_err(db_err)?,
    })
}

fn row_to_comment(row: &SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: get_uuid(row, "id")?,
        author_id: get_uuid(row, "author_id")?,
        media_id: get_uuid(row, "media_id")?,
        text: row.try_get("text").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn row_to_rating(row: &SqliteRow) -> Result<Rating> {
    Ok(Rating {
        id: get_uuid(row, "id")?,
        author_id: get_uuid(row, "author_id")?,
        media_id: get_uuid(row, "media_id")?,
        score: row.try_get("score").map_err(db_err)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(db_err)?,
    })
}

#[async_trait]
impl MediaRepo for SqliteMediaRepo {
    async fn create_user(&self, user: User) -> Result<()> {
        sqlx::query("INSERT INTO users (id, username, role, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(user.id))
            .bind(&user.username)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, role, created_at FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Foreign keys cascade the delete to media, comments and ratings.
    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_media(&self, item: MediaItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO media_items (id, creator_id, file, content_type, title, caption, location, people_present, created_at, is_active) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(item.id))
        .bind(uuid_to_blob(item.creator_id))
        .bind(item.file)
        .bind(item.content_type)
        .bind(item.title)
        .bind(item.caption)
        .bind(item.location)
        .bind(item.people_present)
        .bind(item.created_at)
        .bind(item.is_active)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_media(&self, id: Uuid) -> Result<Option<MediaItem>> {
        let row = sqlx::query(&format!("SELECT {MEDIA_COLUMNS} FROM media_items WHERE id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_media).transpose()
    }

    async fn set_media_active(&self, id: Uuid, active: bool) -> Result<Option<MediaItem>> {
        let row = sqlx::query(&format!(
            "UPDATE media_items SET is_active = ? WHERE id = ? RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(active)
        .bind(uuid_to_blob(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(row_to_media).transpose()
    }

    async fn list_active_media(&self, limit: i64, offset: i64) -> Result<Vec<MediaItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media_items WHERE is_active = 1 \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_media).collect()
    }

    async fn count_active_media(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM media_items WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn search_active_media(&self, query: &str, limit: i64, offset: i64) -> Result<Vec<MediaItem>> {
        let pattern = like_pattern(query);
        let rows = sqlx::query(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media_items WHERE {SEARCH_FILTER} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_media).collect()
    }

    async fn count_search_results(&self, query: &str) -> Result<i64> {
        let pattern = like_pattern(query);
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM media_items WHERE {SEARCH_FILTER}"))
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn create_comment(&self, comment: Comment) -> Result<()> {
        sqlx::query("INSERT INTO comments (id, author_id, media_id, text, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(uuid_to_blob(comment.id))
            .bind(uuid_to_blob(comment.author_id))
            .bind(uuid_to_blob(comment.media_id))
            .bind(comment.text)
            .bind(comment.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_comments(&self, media_id: Uuid) -> Result<Vec<CommentView>> {
        let rows = sqlx::query(
            "SELECT c.id, c.author_id, c.media_id, c.text, c.created_at, \
                    u.username AS author_username, u.role AS author_role, u.created_at AS author_created_at \
             FROM comments c JOIN users u ON u.id = c.author_id \
             WHERE c.media_id = ? ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(uuid_to_blob(media_id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(CommentView {
                    comment: row_to_comment(row)?,
                    author: row_to_author(row)?,
                })
            })
            .collect()
    }

    async fn count_comments(&self, media_id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE media_id = ?")
            .bind(uuid_to_blob(media_id))
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    /// Single-statement insert-or-update against the (author_id, media_id)
    /// unique constraint. An existing row keeps its id and created_at.
    async fn upsert_rating(&self, rating: Rating) -> Result<Rating> {
        let row = sqlx::query(
            "INSERT INTO ratings (id, author_id, media_id, score, created_at) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (author_id, media_id) DO UPDATE SET score = excluded.score \
             RETURNING id, author_id, media_id, score, created_at",
        )
        .bind(uuid_to_blob(rating.id))
        .bind(uuid_to_blob(rating.author_id))
        .bind(uuid_to_blob(rating.media_id))
        .bind(rating.score)
        .bind(rating.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        row_to_rating(&row)
    }

    async fn get_rating(&self, author_id: Uuid, media_id: Uuid) -> Result<Option<Rating>> {
        let row = sqlx::query(
            "SELECT id, author_id, media_id, score, created_at FROM ratings WHERE author_id = ? AND media_id = ?",
        )
        .bind(uuid_to_blob(author_id))
        .bind(uuid_to_blob(media_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(row_to_rating).transpose()
    }

    async fn list_ratings(&self, media_id: Uuid) -> Result<Vec<RatingView>> {
        let rows = sqlx::query(
            "SELECT r.id, r.author_id, r.media_id, r.score, r.created_at, \
                    u.username AS author_username, u.role AS author_role, u.created_at AS author_created_at \
             FROM ratings r JOIN users u ON u.id = r.author_id \
             WHERE r.media_id = ? ORDER BY r.created_at DESC, r.id DESC",
        )
        .bind(uuid_to_blob(media_id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(RatingView {
                    rating: row_to_rating(row)?,
                    author: row_to_author(row)?,
                })
            })
            .collect()
    }

    async fn average_score(&self, media_id: Uuid) -> Result<Option<f64>> {
        sqlx::query_scalar("SELECT AVG(score) FROM ratings WHERE media_id = ?")
            .bind(uuid_to_blob(media_id))
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }
}
