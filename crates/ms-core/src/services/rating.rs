//! Rating upsert and aggregation.

use super::{find_active_media, require_role};
use crate::error::{AppError, Result};
use crate::models::{Caller, Rating, Role, MAX_SCORE, MIN_SCORE};
use crate::traits::MediaRepo;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Total tries (first attempt included) before a storage conflict is surfaced.
pub const MAX_UPSERT_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct RatingService {
    repo: Arc<dyn MediaRepo>,
}

impl RatingService {
    pub fn new(repo: Arc<dyn MediaRepo>) -> Self {
        Self { repo }
    }

    /// Creates the caller's rating of an active item, or overwrites the score
    /// of the one they already gave it.
    ///
    /// The insert-or-update is a single storage operation; the store's unique
    /// index on (author, media) is what keeps concurrent submissions down to
    /// one row. Conflicts it reports are retried here.
    pub async fn upsert_rating(&self, caller: &Caller, media_id: Uuid, score: i32) -> Result<Rating> {
        let media = find_active_media(self.repo.as_ref(), media_id).await?;
        require_role(caller, Role::Consumer, "rate content")?;
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(AppError::ValidationError(format!(
                "score must be between {MIN_SCORE} and {MAX_SCORE}, got {score}"
            )));
        }

        let mut attempt = 1;
        loop {
            let candidate = Rating {
                id: Uuid::now_v7(),
                author_id: caller.id,
                media_id: media.id,
                score,
                created_at: Utc::now(),
            };
            match self.repo.upsert_rating(candidate).await {
                Ok(stored) => {
                    log::info!(
                        "rating {} set to {} by {} on {}",
                        stored.id,
                        stored.score,
                        caller.id,
                        media.id
                    );
                    return Ok(stored);
                }
                Err(AppError::Conflict(reason)) if attempt < MAX_UPSERT_ATTEMPTS => {
                    log::warn!(
                        "rating upsert conflict for ({}, {}), attempt {}: {}",
                        caller.id,
                        media.id,
                        attempt,
                        reason
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Mean score of an active item; exactly `0.0` when nobody has rated it.
    pub async fn average_rating(&self, media_id: Uuid) -> Result<f64> {
        find_active_media(self.repo.as_ref(), media_id).await?;
        Ok(self.repo.average_score(media_id).await?.unwrap_or(0.0))
    }

    /// The caller's own rating of an active item. Non-consumers never have one.
    pub async fn user_rating(&self, caller: &Caller, media_id: Uuid) -> Result<Option<Rating>> {
        find_active_media(self.repo.as_ref(), media_id).await?;
        if !caller.is_consumer() {
            return Ok(None);
        }
        self.repo.get_rating(caller.id, media_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures;
    use crate::traits::MockMediaRepo;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn repo_with_media(active: bool) -> (MockMediaRepo, Uuid) {
        let item = fixtures::media(Uuid::now_v7(), active);
        let id = item.id;
        let mut repo = MockMediaRepo::new();
        repo.expect_get_media()
            .returning(move |_| Ok(Some(item.clone())));
        (repo, id)
    }

    #[tokio::test]
    async fn every_score_in_range_is_accepted() {
        let (mut repo, media_id) = repo_with_media(true);
        repo.expect_upsert_rating().times(5).returning(Ok);
        let service = RatingService::new(Arc::new(repo));
        let caller = fixtures::consumer();

        for score in MIN_SCORE..=MAX_SCORE {
            let rating = service.upsert_rating(&caller, media_id, score).await.unwrap();
            assert_eq!(rating.score, score);
            assert_eq!(rating.author_id, caller.id);
            assert_eq!(rating.media_id, media_id);
        }
    }

    #[tokio::test]
    async fn out_of_range_scores_are_rejected() {
        // No upsert expectation: nothing may be written.
        let (repo, media_id) = repo_with_media(true);
        let service = RatingService::new(Arc::new(repo));
        let caller = fixtures::consumer();

        for score in [-1, 0, 6, 100] {
            let err = service
                .upsert_rating(&caller, media_id, score)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)), "score {score}: {err}");
        }
    }

    #[tokio::test]
    async fn creators_cannot_rate() {
        let (repo, media_id) = repo_with_media(true);
        let service = RatingService::new(Arc::new(repo));
        let err = service
            .upsert_rating(&fixtures::creator(), media_id, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn missing_media_is_reported_before_role_or_score() {
        let mut repo = MockMediaRepo::new();
        repo.expect_get_media().returning(|_| Ok(None));
        let service = RatingService::new(Arc::new(repo));

        let err = service
            .upsert_rating(&fixtures::creator(), Uuid::now_v7(), 9)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn inactive_or_missing_media_is_not_found() {
        let (repo, media_id) = repo_with_media(false);
        let service = RatingService::new(Arc::new(repo));
        let err = service
            .upsert_rating(&fixtures::consumer(), media_id, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));

        let mut repo = MockMediaRepo::new();
        repo.expect_get_media().returning(|_| Ok(None));
        let service = RatingService::new(Arc::new(repo));
        let err = service.average_rating(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn conflicts_are_retried() {
        let (mut repo, media_id) = repo_with_media(true);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        repo.expect_upsert_rating().returning(move |rating| {
            if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AppError::Conflict("database is locked".into()))
            } else {
                Ok(rating)
            }
        });
        let service = RatingService::new(Arc::new(repo));

        let rating = service
            .upsert_rating(&fixtures::consumer(), media_id, 2)
            .await
            .unwrap();
        assert_eq!(rating.score, 2);
        assert_eq!(calls.load(Ordering::SeqCst), MAX_UPSERT_ATTEMPTS);
    }

    #[tokio::test]
    async fn persistent_conflict_is_surfaced() {
        let (mut repo, media_id) = repo_with_media(true);
        repo.expect_upsert_rating()
            .times(MAX_UPSERT_ATTEMPTS)
            .returning(|_| Err(AppError::Conflict("unique violation".into())));
        let service = RatingService::new(Arc::new(repo));

        let err = service
            .upsert_rating(&fixtures::consumer(), media_id, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn average_is_zero_without_ratings() {
        let (mut repo, media_id) = repo_with_media(true);
        repo.expect_average_score().returning(|_| Ok(None));
        let service = RatingService::new(Arc::new(repo));
        assert_eq!(service.average_rating(media_id).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn average_passes_through_unrounded() {
        let (mut repo, media_id) = repo_with_media(true);
        repo.expect_average_score().returning(|_| Ok(Some(11.0 / 3.0)));
        let service = RatingService::new(Arc::new(repo));
        assert_eq!(service.average_rating(media_id).await.unwrap(), 11.0 / 3.0);
    }

    #[tokio::test]
    async fn creators_have_no_rating_of_their_own() {
        let (repo, media_id) = repo_with_media(true);
        let service = RatingService::new(Arc::new(repo));
        let rating = service
            .user_rating(&fixtures::creator(), media_id)
            .await
            .unwrap();
        assert!(rating.is_none());
    }

    #[tokio::test]
    async fn own_rating_of_inactive_media_is_not_found() {
        // No get_rating expectation: the stored score must not leak.
        let (repo, media_id) = repo_with_media(false);
        let service = RatingService::new(Arc::new(repo));
        let err = service
            .user_rating(&fixtures::consumer(), media_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }
}
