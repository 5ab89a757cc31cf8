//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use crate::error::Result;
use crate::models::{Comment, CommentView, MediaItem, Rating, RatingView, User};
use async_trait::async_trait;
use uuid::Uuid;

/// Data persistence contract for users, media items, comments and ratings.
///
/// Listing methods named `*_active_*` only ever return items whose
/// `is_active` flag is set. Deleting a user or a media item must cascade to
/// everything that references it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaRepo: Send + Sync {
    // User Operations
    async fn create_user(&self, user: User) -> Result<()>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    /// Returns `false` when no such user existed.
    async fn delete_user(&self, id: Uuid) -> Result<bool>;

    // Media Operations
    async fn create_media(&self, item: MediaItem) -> Result<()>;
    /// Returns the item whether or not it is active.
    async fn get_media(&self, id: Uuid) -> Result<Option<MediaItem>>;
    async fn set_media_active(&self, id: Uuid, active: bool) -> Result<Option<MediaItem>>;
    async fn list_active_media(&self, limit: i64, offset: i64) -> Result<Vec<MediaItem>>;
    async fn count_active_media(&self) -> Result<i64>;
    /// Case-insensitive substring match on title, caption and location.
    async fn search_active_media(&self, query: &str, limit: i64, offset: i64)
        -> Result<Vec<MediaItem>>;
    async fn count_search_results(&self, query: &str) -> Result<i64>;

    // Comment Operations
    async fn create_comment(&self, comment: Comment) -> Result<()>;
    /// Newest first.
    async fn list_comments(&self, media_id: Uuid) -> Result<Vec<CommentView>>;
    async fn count_comments(&self, media_id: Uuid) -> Result<i64>;

    // Rating Operations
    /// Inserts the rating, or overwrites the score of the existing rating for
    /// the same (author, media) pair, in one atomic statement. Returns the
    /// stored row. Races the store cannot settle surface as `AppError::Conflict`.
    async fn upsert_rating(&self, rating: Rating) -> Result<Rating>;
    async fn get_rating(&self, author_id: Uuid, media_id: Uuid) -> Result<Option<Rating>>;
    /// Newest first.
    async fn list_ratings(&self, media_id: Uuid) -> Result<Vec<RatingView>>;
    /// Mean score, `None` when the item has no ratings.
    async fn average_score(&self, media_id: Uuid) -> Result<Option<f64>>;
}

/// Media storage contract for handling uploads and thumbnails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns the key stored on the MediaItem.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> Result<String>;
    /// Returns the public URL of the original file.
    fn get_url(&self, key: &str) -> String;
    /// Returns the public URL of the thumbnail, if this kind of media has one.
    fn get_thumbnail_url(&self, key: &str, content_type: &str) -> Option<String>;
}
