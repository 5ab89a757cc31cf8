//! # ms-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core services.

use crate::error::ApiError;
use crate::middleware::{optional_user, require_user};
use crate::views::{
    display_rating, CommentOut, MediaDetailOut, MediaListItem, MediaOut, PageOut, RatingOut,
    RatingSaved, UserOut,
};
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use ms_core::error::AppError;
use ms_core::models::{NewMedia, Role};
use ms_core::services::{CommentService, MediaService, RatingService, UserService};
use ms_core::traits::{MediaRepo, MediaStore};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound for a non-file multipart field.
const MAX_TEXT_FIELD_BYTES: usize = 4 * 1024;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub users: UserService,
    pub media: MediaService,
    pub comments: CommentService,
    pub ratings: RatingService,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(repo: Arc<dyn MediaRepo>, store: Arc<dyn MediaStore>, max_upload_bytes: usize) -> Self {
        Self {
            users: UserService::new(repo.clone()),
            media: MediaService::new(repo.clone(), store),
            comments: CommentService::new(repo.clone()),
            ratings: RatingService::new(repo),
            max_upload_bytes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RatingForm {
    pub score: i32,
}

#[derive(Debug, Deserialize)]
pub struct ActiveForm {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub role: Role,
}

/// Home page: the newest few active items.
pub async fn home(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let featured = data.media.featured().await?;
    let store = data.media.store();
    let items: Vec<MediaListItem> = featured.iter().map(|s| MediaListItem::new(s, store)).collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "featured_media": items })))
}

/// Paginated list of active media, newest first.
pub async fn media_list(
    data: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = data.media.list(query.page.as_deref()).await?;
    let store = data.media.store();
    let page = page.map(|s| MediaListItem::new(&s, store));
    Ok(HttpResponse::Ok().json(PageOut::new(page, None)))
}

/// Substring search over title, caption and location.
pub async fn media_search(
    data: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = data.media.search(&query.query, query.page.as_deref()).await?;
    let store = data.media.store();
    let page = page.map(|s| MediaListItem::new(&s, store));
    Ok(HttpResponse::Ok().json(PageOut::new(page, Some(query.query.clone()))))
}

/// One item with its comments, ratings and average. Anonymous callers are welcome.
pub async fn media_detail(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let caller = optional_user(&req, &data).await?.map(|u| u.caller());
    let detail = data.media.detail(caller.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MediaDetailOut::new(&detail, data.media.store())))
}

/// Creator upload: multipart with `title`, optional `caption`, `location`,
/// `people_present`, and the `file` itself.
pub async fn upload_media(
    data: web::Data<AppState>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req, &data).await?;
    if user.role != Role::Creator {
        // Refuse before reading a potentially large body.
        return Err(AppError::Forbidden("only creators can upload media".into()).into());
    }
    let (fields, bytes, content_type) = read_upload(payload, data.max_upload_bytes).await?;
    let item = data
        .media
        .upload(&user.caller(), fields, bytes, &content_type)
        .await?;
    Ok(HttpResponse::Created().json(MediaOut::new(&item, data.media.store())))
}

pub async fn add_comment(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    form: web::Json<CommentForm>,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req, &data).await?;
    let comment = data
        .comments
        .add_comment(&user.caller(), path.into_inner(), &form.text)
        .await?;
    Ok(HttpResponse::Created().json(CommentOut::new(&comment, &user)))
}

/// Creates or replaces the caller's rating and reports the new average.
pub async fn add_rating(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    form: web::Json<RatingForm>,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req, &data).await?;
    let media_id = path.into_inner();
    let rating = data
        .ratings
        .upsert_rating(&user.caller(), media_id, form.score)
        .await?;
    let average = data.ratings.average_rating(media_id).await?;
    Ok(HttpResponse::Ok().json(RatingSaved {
        rating: RatingOut::new(&rating, &user),
        average_rating: display_rating(average),
    }))
}

/// Soft-deletes (`active: false`) or restores an item; owner only.
pub async fn set_active(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    form: web::Json<ActiveForm>,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req, &data).await?;
    let item = data
        .media
        .set_active(&user.caller(), path.into_inner(), form.active)
        .await?;
    Ok(HttpResponse::Ok().json(MediaOut::new(&item, data.media.store())))
}

pub async fn register_user(
    data: web::Data<AppState>,
    form: web::Json<RegisterForm>,
) -> Result<HttpResponse, ApiError> {
    let user = data.users.register(&form.username, form.role).await?;
    Ok(HttpResponse::Created().json(UserOut::from(&user)))
}

pub async fn get_user(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user = data.users.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserOut::from(&user)))
}

/// Account removal, which takes the user's media, comments and ratings with it.
pub async fn delete_user(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req, &data).await?;
    let target = path.into_inner();
    if user.id != target {
        return Err(AppError::Forbidden("users can only remove their own account".into()).into());
    }
    data.users.remove(target).await?;
    Ok(HttpResponse::NoContent().finish())
}

fn malformed(e: impl std::fmt::Display) -> ApiError {
    AppError::ValidationError(format!("malformed upload: {e}")).into()
}

/// Drains the multipart stream into the form fields and the file bytes.
async fn read_upload(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<(NewMedia, Vec<u8>, String), ApiError> {
    let mut fields = NewMedia::default();
    let mut file: Option<(Vec<u8>, String)> = None;

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(malformed)?;
        let name = field.content_disposition().get_name().unwrap_or_default().to_string();

        if name == "file" {
            let content_type = upload_content_type(&field);
            let bytes = read_field(&mut field, max_bytes, "file").await?;
            file = Some((bytes, content_type));
            continue;
        }

        let raw = read_field(&mut field, MAX_TEXT_FIELD_BYTES, &name).await?;
        let text = String::from_utf8(raw)
            .map_err(|_| AppError::ValidationError(format!("{name} must be valid UTF-8")))?;
        match name.as_str() {
            "title" => fields.title = text,
            "caption" => fields.caption = Some(text),
            "location" => fields.location = Some(text),
            "people_present" => fields.people_present = Some(text),
            other => log::debug!("ignoring upload field '{other}'"),
        }
    }

    let (bytes, content_type) =
        file.ok_or_else(|| AppError::ValidationError("a file is required".into()))?;
    Ok((fields, bytes, content_type))
}

/// The part's declared type, or a guess from its filename when the client
/// sent none or the generic `application/octet-stream`.
fn upload_content_type(field: &Field) -> String {
    let declared = field
        .content_type()
        .map(|m| m.essence_str().to_string())
        .filter(|ct| ct != "application/octet-stream");
    declared
        .or_else(|| {
            field
                .content_disposition()
                .get_filename()
                .and_then(|name| mime_guess::from_path(name).first())
                .map(|m| m.essence_str().to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

async fn read_field(field: &mut Field, max_bytes: usize, name: &str) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(malformed)?;
        if bytes.len() + chunk.len() > max_bytes {
            return Err(AppError::ValidationError(format!(
                "{name} exceeds the {max_bytes} byte limit"
            ))
            .into());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
