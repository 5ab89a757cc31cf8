//! # Services
//!
//! The domain operations the web layer calls into. Each service owns its
//! role checks and validation and talks to storage only through the ports
//! in [`crate::traits`].

mod comment;
mod media;
mod rating;
mod user;

pub use comment::CommentService;
pub use media::{MediaService, FEATURED_COUNT};
pub use rating::{RatingService, MAX_UPSERT_ATTEMPTS};
pub use user::UserService;

use crate::error::{AppError, Result};
use crate::models::{Caller, MediaItem, Role};
use crate::traits::MediaRepo;
use uuid::Uuid;

fn require_role(caller: &Caller, role: Role, action: &str) -> Result<()> {
    if caller.role == role {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("only {role}s can {action}")))
    }
}

/// Counts characters, not bytes.
fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(AppError::ValidationError(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Trims an optional text field; blank becomes `None`.
fn optional_text(field: &str, value: Option<String>, max: usize) -> Result<Option<String>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => {
            check_len(field, text, max)?;
            Ok(Some(text.to_string()))
        }
    }
}

/// Inactive items are reported exactly like missing ones.
async fn find_active_media(repo: &dyn MediaRepo, id: Uuid) -> Result<MediaItem> {
    match repo.get_media(id).await? {
        Some(item) if item.is_active => Ok(item),
        _ => Err(AppError::not_found("MediaItem", id)),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{Caller, MediaItem, Role, User};
    use chrono::Utc;
    use uuid::Uuid;

    pub fn consumer() -> Caller {
        Caller {
            id: Uuid::now_v7(),
            role: Role::Consumer,
        }
    }

    pub fn creator() -> Caller {
        Caller {
            id: Uuid::now_v7(),
            role: Role::Creator,
        }
    }

    pub fn user(caller: &Caller, username: &str) -> User {
        User {
            id: caller.id,
            username: username.to_string(),
            role: caller.role,
            created_at: Utc::now(),
        }
    }

    pub fn media(creator_id: Uuid, active: bool) -> MediaItem {
        MediaItem {
            id: Uuid::now_v7(),
            creator_id,
            file: "ab12cd".into(),
            content_type: "image/png".into(),
            title: "Sunset".into(),
            caption: None,
            location: Some("Lisbon".into()),
            people_present: None,
            created_at: Utc::now(),
            is_active: active,
        }
    }
}
