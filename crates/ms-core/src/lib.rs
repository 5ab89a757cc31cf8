//! mediashare/crates/ms-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Mediashare.

pub mod error;
pub mod models;
pub mod pagination;
pub mod services;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use pagination::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    #[test]
    fn test_media_creation_v7() {
        let id = Uuid::now_v7();
        let item = MediaItem {
            id,
            creator_id: Uuid::now_v7(),
            file: "0a1b2c".to_string(),
            content_type: "image/jpeg".to_string(),
            title: "Hello Rust!".to_string(),
            caption: None,
            location: None,
            people_present: None,
            created_at: chrono::Utc::now(),
            is_active: true,
        };
        assert_eq!(item.id, id);
        assert!(item.is_active);
    }

    #[test]
    fn test_role_round_trips_through_text() {
        for role in [Role::Creator, Role::Consumer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Consumer).unwrap(), "\"consumer\"");
    }
}
