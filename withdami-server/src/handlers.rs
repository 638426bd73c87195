use anyhow::Context;
use axum::{
    extract::{Path, Query},
    Json,
};
use withdami_api::{
    Admin, Article, ArticleId, ArticleUpdate, AuthToken, ClientId, Comment, CommentId, LikeState,
    NewAdmin, NewArticle, NewComment, NewLike, NewSession, NewVideo, SearchResults, Stats, Subject,
    Video, VideoId, VideoUpdate,
};

use crate::{db, extractors::*, Error};

#[derive(serde::Deserialize)]
pub struct SubjectQuery {
    article: Option<ArticleId>,
    video: Option<VideoId>,
}

impl SubjectQuery {
    fn subject(self) -> Result<Subject, Error> {
        Ok(Subject::from_query(self.article, self.video)?)
    }
}

#[derive(serde::Deserialize)]
pub struct LikeQuery {
    article: Option<ArticleId>,
    video: Option<VideoId>,
    client: ClientId,
}

#[derive(serde::Deserialize)]
pub struct CategoryQuery {
    category: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct SearchQuery {
    q: String,
}

pub async fn admin_create_admin(
    AdminAuth: AdminAuth,
    mut conn: PgConn,
    Json(data): Json<NewAdmin>,
) -> Result<(), Error> {
    data.validate()?;
    db::create_admin(&mut *conn, data).await
}

pub async fn auth(
    mut conn: PgConn,
    Json(data): Json<NewSession>,
) -> Result<Json<AuthToken>, Error> {
    data.validate()?;
    Ok(Json(
        db::login_admin(&mut *conn, &data)
            .await
            .context("logging admin in")?
            .ok_or(Error::permission_denied())?,
    ))
}

pub async fn unauth(admin: PreAuth, mut conn: PgConn) -> Result<(), Error> {
    match db::logout_admin(&mut *conn, &admin.0).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::permission_denied()),
        Err(e) => Err(Error::Anyhow(e)),
    }
}

pub async fn whoami(Auth(admin): Auth, mut conn: PgConn) -> Result<Json<Admin>, Error> {
    Ok(Json(
        db::fetch_admin(&mut *conn, admin)
            .await
            .with_context(|| format!("fetching admin {admin:?}"))?,
    ))
}

pub async fn fetch_articles(
    Query(q): Query<CategoryQuery>,
    mut conn: PgConn,
) -> Result<Json<Vec<Article>>, Error> {
    Ok(Json(
        db::fetch_articles(&mut *conn, q.category.as_deref())
            .await
            .context("fetching article list")?,
    ))
}

pub async fn fetch_article(
    Path(id): Path<ArticleId>,
    mut conn: PgConn,
) -> Result<Json<Article>, Error> {
    Ok(Json(db::fetch_article(&mut *conn, id).await?))
}

pub async fn mark_article_viewed(
    Path(id): Path<ArticleId>,
    mut conn: PgConn,
) -> Result<Json<i64>, Error> {
    Ok(Json(db::mark_article_viewed(&mut *conn, id).await?))
}

pub async fn article_categories(mut conn: PgConn) -> Result<Json<Vec<String>>, Error> {
    Ok(Json(
        db::article_categories(&mut *conn)
            .await
            .context("fetching article categories")?,
    ))
}

pub async fn create_article(
    Auth(_): Auth,
    mut conn: PgConn,
    Json(data): Json<NewArticle>,
) -> Result<(), Error> {
    data.validate()?;
    db::create_article(&mut *conn, data).await
}

pub async fn update_article(
    Auth(_): Auth,
    Path(id): Path<ArticleId>,
    mut conn: PgConn,
    Json(data): Json<ArticleUpdate>,
) -> Result<(), Error> {
    data.validate()?;
    db::update_article(&mut *conn, id, data).await
}

pub async fn delete_article(
    Auth(_): Auth,
    Path(id): Path<ArticleId>,
    mut conn: PgConn,
) -> Result<(), Error> {
    db::delete_article(&mut *conn, id).await
}

pub async fn fetch_videos(
    Query(q): Query<CategoryQuery>,
    mut conn: PgConn,
) -> Result<Json<Vec<Video>>, Error> {
    Ok(Json(
        db::fetch_videos(&mut *conn, q.category.as_deref())
            .await
            .context("fetching video list")?,
    ))
}

pub async fn fetch_video(
    Path(id): Path<VideoId>,
    mut conn: PgConn,
) -> Result<Json<Video>, Error> {
    Ok(Json(db::fetch_video(&mut *conn, id).await?))
}

pub async fn mark_video_viewed(
    Path(id): Path<VideoId>,
    mut conn: PgConn,
) -> Result<Json<i64>, Error> {
    Ok(Json(db::mark_video_viewed(&mut *conn, id).await?))
}

pub async fn video_categories(mut conn: PgConn) -> Result<Json<Vec<String>>, Error> {
    Ok(Json(
        db::video_categories(&mut *conn)
            .await
            .context("fetching video categories")?,
    ))
}

pub async fn create_video(
    Auth(_): Auth,
    mut conn: PgConn,
    Json(data): Json<NewVideo>,
) -> Result<(), Error> {
    data.validate()?;
    db::create_video(&mut *conn, data).await
}

pub async fn update_video(
    Auth(_): Auth,
    Path(id): Path<VideoId>,
    mut conn: PgConn,
    Json(data): Json<VideoUpdate>,
) -> Result<(), Error> {
    data.validate()?;
    db::update_video(&mut *conn, id, data).await
}

pub async fn delete_video(
    Auth(_): Auth,
    Path(id): Path<VideoId>,
    mut conn: PgConn,
) -> Result<(), Error> {
    db::delete_video(&mut *conn, id).await
}

pub async fn search(
    Query(q): Query<SearchQuery>,
    mut conn: PgConn,
) -> Result<Json<SearchResults>, Error> {
    Ok(Json(
        db::search(&mut *conn, &q.q)
            .await
            .with_context(|| format!("searching for {:?}", q.q))?,
    ))
}

pub async fn stats(mut conn: PgConn) -> Result<Json<Stats>, Error> {
    Ok(Json(db::stats(&mut *conn).await.context("counting stats")?))
}

pub async fn fetch_comments(
    Query(q): Query<SubjectQuery>,
    mut conn: PgConn,
) -> Result<Json<Vec<Comment>>, Error> {
    let subject = q.subject()?;
    Ok(Json(
        db::fetch_comments_for(&mut *conn, subject, true)
            .await
            .with_context(|| format!("fetching comments for {subject:?}"))?,
    ))
}

pub async fn create_comment(
    mut conn: PgConn,
    Json(data): Json<NewComment>,
) -> Result<(), Error> {
    data.validate()?;
    db::create_comment(&mut *conn, data).await
}

pub async fn admin_fetch_comments(
    Auth(_): Auth,
    Query(q): Query<SubjectQuery>,
    mut conn: PgConn,
) -> Result<Json<Vec<Comment>>, Error> {
    let subject = q.subject()?;
    Ok(Json(
        db::fetch_comments_for(&mut *conn, subject, false)
            .await
            .with_context(|| format!("fetching all comments for {subject:?}"))?,
    ))
}

pub async fn admin_set_comment_approved(
    Auth(_): Auth,
    Path(id): Path<CommentId>,
    mut conn: PgConn,
    Json(approved): Json<bool>,
) -> Result<(), Error> {
    db::set_comment_approved(&mut *conn, id, approved).await
}

pub async fn admin_delete_comment(
    Auth(_): Auth,
    Path(id): Path<CommentId>,
    mut conn: PgConn,
) -> Result<(), Error> {
    db::delete_comment(&mut *conn, id).await
}

pub async fn like_state(
    Query(q): Query<LikeQuery>,
    mut conn: PgConn,
) -> Result<Json<LikeState>, Error> {
    let subject = Subject::from_query(q.article, q.video)?;
    Ok(Json(
        db::like_state(&mut *conn, subject, q.client)
            .await
            .with_context(|| format!("fetching like state for {subject:?}"))?,
    ))
}

pub async fn create_like(mut conn: PgConn, Json(data): Json<NewLike>) -> Result<(), Error> {
    data.validate()?;
    db::create_like(&mut *conn, data).await
}

pub async fn delete_like(Query(q): Query<LikeQuery>, mut conn: PgConn) -> Result<(), Error> {
    let subject = Subject::from_query(q.article, q.video)?;
    Ok(db::delete_like(&mut *conn, subject, q.client)
        .await
        .with_context(|| format!("deleting like on {subject:?}"))?)
}
