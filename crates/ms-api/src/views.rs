//! JSON response shapes.
//!
//! Every average rating leaves the API through [`display_rating`].

use chrono::{DateTime, Utc};
use ms_core::models::{
    Comment, CommentView, MediaDetail, MediaItem, MediaSummary, Rating, RatingView, Role, User,
};
use ms_core::pagination::Page;
use ms_core::traits::MediaStore;
use serde::Serialize;
use uuid::Uuid;

/// Rounds a mean score to one decimal place for display.
pub fn display_rating(average: f64) -> f64 {
    (average * 10.0).round() / 10.0
}

#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<&User> for UserOut {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentOut {
    pub id: Uuid,
    pub media_id: Uuid,
    pub user: UserOut,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl CommentOut {
    pub fn new(comment: &Comment, author: &User) -> Self {
        Self {
            id: comment.id,
            media_id: comment.media_id,
            user: author.into(),
            text: comment.text.clone(),
            created_at: comment.created_at,
        }
    }
}

impl From<&CommentView> for CommentOut {
    fn from(view: &CommentView) -> Self {
        Self::new(&view.comment, &view.author)
    }
}

#[derive(Debug, Serialize)]
pub struct RatingOut {
    pub id: Uuid,
    pub media_id: Uuid,
    pub user: UserOut,
    pub score: i32,
    pub created_at: DateTime<Utc>,
}

impl RatingOut {
    pub fn new(rating: &Rating, author: &User) -> Self {
        Self {
            id: rating.id,
            media_id: rating.media_id,
            user: author.into(),
            score: rating.score,
            created_at: rating.created_at,
        }
    }
}

impl From<&RatingView> for RatingOut {
    fn from(view: &RatingView) -> Self {
        Self::new(&view.rating, &view.author)
    }
}

/// Response to a rating submission: the stored rating and the new average.
#[derive(Debug, Serialize)]
pub struct RatingSaved {
    pub rating: RatingOut,
    pub average_rating: f64,
}

#[derive(Debug, Serialize)]
pub struct MediaListItem {
    pub id: Uuid,
    pub creator: UserOut,
    pub file: String,
    pub thumbnail: Option<String>,
    pub title: String,
    pub upload_date: DateTime<Utc>,
    pub is_active: bool,
    pub average_rating: f64,
    pub comment_count: i64,
}

impl MediaListItem {
    pub fn new(summary: &MediaSummary, store: &dyn MediaStore) -> Self {
        let item = &summary.item;
        Self {
            id: item.id,
            creator: (&summary.creator).into(),
            file: store.get_url(&item.file),
            thumbnail: store.get_thumbnail_url(&item.file, &item.content_type),
            title: item.title.clone(),
            upload_date: item.created_at,
            is_active: item.is_active,
            average_rating: display_rating(summary.average_rating),
            comment_count: summary.comment_count,
        }
    }
}

/// The owner's view of an item right after upload or an activity toggle.
#[derive(Debug, Serialize)]
pub struct MediaOut {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub file: String,
    pub thumbnail: Option<String>,
    pub title: String,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub people_present: Option<String>,
    pub upload_date: DateTime<Utc>,
    pub is_active: bool,
}

impl MediaOut {
    pub fn new(item: &MediaItem, store: &dyn MediaStore) -> Self {
        Self {
            id: item.id,
            creator_id: item.creator_id,
            file: store.get_url(&item.file),
            thumbnail: store.get_thumbnail_url(&item.file, &item.content_type),
            title: item.title.clone(),
            caption: item.caption.clone(),
            location: item.location.clone(),
            people_present: item.people_present.clone(),
            upload_date: item.created_at,
            is_active: item.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MediaDetailOut {
    pub id: Uuid,
    pub creator: UserOut,
    pub file: String,
    pub thumbnail: Option<String>,
    pub title: String,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub people_present: Option<String>,
    pub upload_date: DateTime<Utc>,
    pub is_active: bool,
    pub comments: Vec<CommentOut>,
    pub ratings: Vec<RatingOut>,
    pub average_rating: f64,
    pub comment_count: i64,
    /// The caller's own score, when they have rated this item
    pub user_rating: Option<i32>,
}

impl MediaDetailOut {
    pub fn new(detail: &MediaDetail, store: &dyn MediaStore) -> Self {
        let item = &detail.item;
        Self {
            id: item.id,
            creator: (&detail.creator).into(),
            file: store.get_url(&item.file),
            thumbnail: store.get_thumbnail_url(&item.file, &item.content_type),
            title: item.title.clone(),
            caption: item.caption.clone(),
            location: item.location.clone(),
            people_present: item.people_present.clone(),
            upload_date: item.created_at,
            is_active: item.is_active,
            comments: detail.comments.iter().map(Into::into).collect(),
            ratings: detail.ratings.iter().map(Into::into).collect(),
            average_rating: display_rating(detail.average_rating),
            comment_count: detail.comment_count,
            user_rating: detail.user_rating.as_ref().map(|r| r.score),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageOut<T: Serialize> {
    pub results: Vec<T>,
    pub page: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl<T: Serialize> PageOut<T> {
    pub fn new(page: Page<T>, query: Option<String>) -> Self {
        Self {
            results: page.items,
            page: page.number,
            num_pages: page.num_pages,
            count: page.total,
            has_next: page.has_next,
            has_previous: page.has_previous,
            query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_display_with_one_decimal() {
        assert_eq!(display_rating(0.0), 0.0);
        assert_eq!(display_rating(4.0), 4.0);
        assert_eq!(display_rating(13.0 / 3.0), 4.3);
        assert_eq!(display_rating(4.25), 4.3);
        assert_eq!(display_rating(11.0 / 3.0), 3.7);
    }
}
