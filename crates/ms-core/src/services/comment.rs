use super::{check_len, find_active_media, require_role};
use crate::error::{AppError, Result};
use crate::models::{Caller, Comment, CommentView, Role, COMMENT_MAX_LEN};
use crate::traits::MediaRepo;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct CommentService {
    repo: Arc<dyn MediaRepo>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn MediaRepo>) -> Self {
        Self { repo }
    }

    /// Posts a comment on an active item. Consumers may comment any number
    /// of times on the same item.
    pub async fn add_comment(&self, caller: &Caller, media_id: Uuid, text: &str) -> Result<Comment> {
        let media = find_active_media(self.repo.as_ref(), media_id).await?;
        require_role(caller, Role::Consumer, "add comments")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::ValidationError("comment text is required".into()));
        }
        check_len("comment", text, COMMENT_MAX_LEN)?;

        let comment = Comment {
            id: Uuid::now_v7(),
            author_id: caller.id,
            media_id: media.id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.repo.create_comment(comment.clone()).await?;
        log::info!("comment {} added by {} on {}", comment.id, caller.id, media.id);
        Ok(comment)
    }

    /// Comments on an active item, newest first.
    pub async fn list_comments(&self, media_id: Uuid) -> Result<Vec<CommentView>> {
        find_active_media(self.repo.as_ref(), media_id).await?;
        self.repo.list_comments(media_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures;
    use crate::traits::MockMediaRepo;

    fn service_for(item: crate::models::MediaItem) -> (MockMediaRepo, Uuid) {
        let id = item.id;
        let mut repo = MockMediaRepo::new();
        repo.expect_get_media()
            .returning(move |_| Ok(Some(item.clone())));
        (repo, id)
    }

    #[tokio::test]
    async fn consumer_comment_is_trimmed_and_stored() {
        let (mut repo, media_id) = service_for(fixtures::media(Uuid::now_v7(), true));
        repo.expect_create_comment()
            .withf(|c| c.text == "Lovely light")
            .times(1)
            .returning(|_| Ok(()));
        let service = CommentService::new(Arc::new(repo));
        let caller = fixtures::consumer();

        let comment = service
            .add_comment(&caller, media_id, "  Lovely light \n")
            .await
            .unwrap();
        assert_eq!(comment.author_id, caller.id);
        assert_eq!(comment.media_id, media_id);
    }

    #[tokio::test]
    async fn inactive_media_cannot_be_commented() {
        let (repo, media_id) = service_for(fixtures::media(Uuid::now_v7(), false));
        let service = CommentService::new(Arc::new(repo));
        let err = service
            .add_comment(&fixtures::consumer(), media_id, "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn text_must_be_present_and_bounded() {
        let (repo, media_id) = service_for(fixtures::media(Uuid::now_v7(), true));
        let service = CommentService::new(Arc::new(repo));
        let caller = fixtures::consumer();

        let err = service.add_comment(&caller, media_id, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let long = "é".repeat(COMMENT_MAX_LEN + 1);
        let err = service.add_comment(&caller, media_id, &long).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn exactly_max_length_is_accepted() {
        let (mut repo, media_id) = service_for(fixtures::media(Uuid::now_v7(), true));
        repo.expect_create_comment().returning(|_| Ok(()));
        let service = CommentService::new(Arc::new(repo));

        let text = "é".repeat(COMMENT_MAX_LEN);
        assert!(service.add_comment(&fixtures::consumer(), media_id, &text).await.is_ok());
    }

    #[tokio::test]
    async fn creators_cannot_comment() {
        let (repo, media_id) = service_for(fixtures::media(Uuid::now_v7(), true));
        let service = CommentService::new(Arc::new(repo));
        let err = service
            .add_comment(&fixtures::creator(), media_id, "nice")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn listing_keeps_repo_order_for_active_media() {
        let creator = fixtures::creator();
        let item = fixtures::media(creator.id, true);
        let (mut repo, media_id) = service_for(item);
        let reader = fixtures::consumer();
        let author = fixtures::user(&reader, "ben");
        let newer = CommentView {
            comment: Comment {
                id: Uuid::now_v7(),
                author_id: reader.id,
                media_id,
                text: "second".into(),
                created_at: Utc::now(),
            },
            author: author.clone(),
        };
        let older = CommentView {
            comment: Comment {
                id: Uuid::now_v7(),
                author_id: reader.id,
                media_id,
                text: "first".into(),
                created_at: Utc::now() - chrono::Duration::minutes(5),
            },
            author,
        };
        repo.expect_list_comments()
            .returning(move |_| Ok(vec![newer.clone(), older.clone()]));
        let service = CommentService::new(Arc::new(repo));

        let comments = service.list_comments(media_id).await.unwrap();
        let texts: Vec<_> = comments.iter().map(|c| c.comment.text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
    }

    #[tokio::test]
    async fn listing_inactive_media_is_not_found() {
        // No list_comments expectation: the repo listing must not be reached.
        let (repo, media_id) = service_for(fixtures::media(Uuid::now_v7(), false));
        let service = CommentService::new(Arc::new(repo));
        let err = service.list_comments(media_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }
}
