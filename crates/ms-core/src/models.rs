//! # Domain Models
//!
//! These structs represent the core entities of Mediashare.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum lengths (in characters) of the free-text fields.
pub const USERNAME_MAX_LEN: usize = 150;
pub const TITLE_MAX_LEN: usize = 100;
pub const CAPTION_MAX_LEN: usize = 500;
pub const LOCATION_MAX_LEN: usize = 100;
pub const PEOPLE_PRESENT_MAX_LEN: usize = 200;
pub const COMMENT_MAX_LEN: usize = 300;

/// Inclusive bounds of a rating score.
pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;

/// The closed set of roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May upload media.
    Creator,
    /// May comment on and rate media.
    Consumer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Creator => "creator",
            Role::Consumer => "consumer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" => Ok(Role::Creator),
            "consumer" => Ok(Role::Consumer),
            other => Err(crate::error::AppError::ValidationError(format!(
                "unknown role '{other}'"
            ))),
        }
    }
}

/// A registered account. Identity and role are all the core consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn caller(&self) -> Caller {
        Caller {
            id: self.id,
            role: self.role,
        }
    }
}

/// The identity an operation is performed on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn is_consumer(&self) -> bool {
        self.role == Role::Consumer
    }
}

/// A piece of uploaded content (photo or video).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    /// Owner. Never changes after upload.
    pub creator_id: Uuid,
    /// Key of the stored file, as returned by `MediaStore::save_upload`
    pub file: String,
    pub content_type: String,
    pub title: String,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub people_present: Option<String>,
    /// Upload date; also the listing sort key
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker. Inactive items are invisible to every read path.
    pub is_active: bool,
}

/// User-supplied fields of an upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMedia {
    pub title: String,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub people_present: Option<String>,
}

/// A consumer's freeform remark on a media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub media_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A consumer's score for a media item. At most one per (author, media).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub author_id: Uuid,
    pub media_id: Uuid,
    pub score: i32,
    pub created_at: DateTime<Utc>,
}

/// A comment paired with its author, newest-first in listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author: User,
}

/// A rating paired with its author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingView {
    pub rating: Rating,
    pub author: User,
}

/// The listing shape of a media item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaSummary {
    pub item: MediaItem,
    pub creator: User,
    pub average_rating: f64,
    pub comment_count: i64,
}

/// Everything the detail page shows about one media item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaDetail {
    pub item: MediaItem,
    pub creator: User,
    pub comments: Vec<CommentView>,
    pub ratings: Vec<RatingView>,
    pub average_rating: f64,
    pub comment_count: i64,
    /// The caller's own rating, when the caller is a consumer who rated it
    pub user_rating: Option<Rating>,
}
