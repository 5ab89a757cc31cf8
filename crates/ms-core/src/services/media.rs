//! Upload, listing, search and detail of media items.

use super::{check_len, find_active_media, optional_text, require_role, CommentService, RatingService};
use crate::error::{AppError, Result};
use crate::models::{
    Caller, MediaDetail, MediaItem, MediaSummary, NewMedia, Role, User, CAPTION_MAX_LEN,
    LOCATION_MAX_LEN, PEOPLE_PRESENT_MAX_LEN, TITLE_MAX_LEN,
};
use crate::pagination::{Page, Paginator, PAGE_SIZE};
use crate::traits::{MediaRepo, MediaStore};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Number of newest items shown on the home page.
pub const FEATURED_COUNT: i64 = 3;

#[derive(Clone)]
pub struct MediaService {
    repo: Arc<dyn MediaRepo>,
    store: Arc<dyn MediaStore>,
    comments: CommentService,
    ratings: RatingService,
}

impl MediaService {
    pub fn new(repo: Arc<dyn MediaRepo>, store: Arc<dyn MediaStore>) -> Self {
        Self {
            comments: CommentService::new(repo.clone()),
            ratings: RatingService::new(repo.clone()),
            repo,
            store,
        }
    }

    pub fn store(&self) -> &dyn MediaStore {
        self.store.as_ref()
    }

    /// Stores the file and records a new, active item owned by the caller.
    pub async fn upload(
        &self,
        caller: &Caller,
        fields: NewMedia,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<MediaItem> {
        require_role(caller, Role::Creator, "upload media")?;

        let title = fields.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError("title is required".into()));
        }
        check_len("title", title, TITLE_MAX_LEN)?;
        let caption = optional_text("caption", fields.caption, CAPTION_MAX_LEN)?;
        let location = optional_text("location", fields.location, LOCATION_MAX_LEN)?;
        let people_present =
            optional_text("people present", fields.people_present, PEOPLE_PRESENT_MAX_LEN)?;

        let mime: mime::Mime = content_type
            .parse()
            .map_err(|_| AppError::ValidationError(format!("invalid content type '{content_type}'")))?;
        if mime.type_() != mime::IMAGE && mime.type_() != mime::VIDEO {
            return Err(AppError::ValidationError(format!(
                "only photos and videos can be uploaded, got '{mime}'"
            )));
        }
        if data.is_empty() {
            return Err(AppError::ValidationError("uploaded file is empty".into()));
        }

        let content_type = mime.essence_str().to_string();
        let file = self.store.save_upload(data, &content_type).await?;
        let item = MediaItem {
            id: Uuid::now_v7(),
            creator_id: caller.id,
            file,
            content_type,
            title: title.to_string(),
            caption,
            location,
            people_present,
            created_at: Utc::now(),
            is_active: true,
        };
        self.repo.create_media(item.clone()).await?;
        log::info!("media {} '{}' uploaded by {}", item.id, item.title, caller.id);
        Ok(item)
    }

    pub async fn featured(&self) -> Result<Vec<MediaSummary>> {
        let items = self.repo.list_active_media(FEATURED_COUNT, 0).await?;
        self.summarize_all(items).await
    }

    pub async fn list(&self, page: Option<&str>) -> Result<Page<MediaSummary>> {
        let paginator = Paginator::new(self.repo.count_active_media().await?, PAGE_SIZE);
        let number = paginator.resolve(page);
        let items = self
            .repo
            .list_active_media(paginator.limit(), paginator.offset(number))
            .await?;
        Ok(paginator.page(number, self.summarize_all(items).await?))
    }

    /// A blank query matches nothing rather than everything.
    pub async fn search(&self, query: &str, page: Option<&str>) -> Result<Page<MediaSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Page::empty());
        }
        let paginator = Paginator::new(self.repo.count_search_results(query).await?, PAGE_SIZE);
        let number = paginator.resolve(page);
        let items = self
            .repo
            .search_active_media(query, paginator.limit(), paginator.offset(number))
            .await?;
        Ok(paginator.page(number, self.summarize_all(items).await?))
    }

    pub async fn detail(&self, caller: Option<&Caller>, media_id: Uuid) -> Result<MediaDetail> {
        let item = find_active_media(self.repo.as_ref(), media_id).await?;
        let creator = self.creator_of(&item).await?;
        let comments = self.comments.list_comments(media_id).await?;
        let ratings = self.repo.list_ratings(media_id).await?;
        let average_rating = self.ratings.average_rating(media_id).await?;
        let user_rating = match caller {
            Some(c) => self.ratings.user_rating(c, media_id).await?,
            None => None,
        };

        Ok(MediaDetail {
            comment_count: comments.len() as i64,
            item,
            creator,
            comments,
            ratings,
            average_rating,
            user_rating,
        })
    }

    /// Soft-deletes or restores an item. Only its creator may do this, and it
    /// works on inactive items too so they can be brought back.
    pub async fn set_active(&self, caller: &Caller, media_id: Uuid, active: bool) -> Result<MediaItem> {
        let item = self
            .repo
            .get_media(media_id)
            .await?
            .ok_or_else(|| AppError::not_found("MediaItem", media_id))?;
        if item.creator_id != caller.id {
            return Err(AppError::Forbidden("only the creator can change this item".into()));
        }
        let updated = self
            .repo
            .set_media_active(media_id, active)
            .await?
            .ok_or_else(|| AppError::not_found("MediaItem", media_id))?;
        log::info!("media {} active={} by {}", media_id, active, caller.id);
        Ok(updated)
    }

    async fn creator_of(&self, item: &MediaItem) -> Result<User> {
        self.repo
            .get_user(item.creator_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", item.creator_id))
    }

    async fn summarize_all(&self, items: Vec<MediaItem>) -> Result<Vec<MediaSummary>> {
        let mut summaries = Vec::with_capacity(items.len());
        for item in items {
            let creator = self.creator_of(&item).await?;
            let average_rating = self.repo.average_score(item.id).await?.unwrap_or(0.0);
            let comment_count = self.repo.count_comments(item.id).await?;
            summaries.push(MediaSummary {
                item,
                creator,
                average_rating,
                comment_count,
            });
        }
        Ok(summaries)
    }
}
