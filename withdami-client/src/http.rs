use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::api::{
    self, Admin, Article, ArticleId, ArticleUpdate, AuthToken, ClientId, Comment, CommentId,
    LikeState, NewAdmin, NewArticle, NewComment, NewLike, NewSession, NewVideo, SearchResults,
    Stats, Store, Subject, Video, VideoId, VideoUpdate,
};

/// Typed HTTP client for the public and admin API.
///
/// Transient transport failures are retried with exponential backoff, so
/// callers only see an error once retries are exhausted. Server-side
/// rejections parse back into [`api::Error`].
pub struct Client {
    host: String,
    http: ClientWithMiddleware,
    token: Option<AuthToken>,
}

impl Client {
    pub fn new(host: String) -> Client {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let http = reqwest_middleware::ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        Client {
            host,
            http,
            token: None,
        }
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.token
    }

    fn bearer(&self, req: reqwest_middleware::RequestBuilder) -> reqwest_middleware::RequestBuilder {
        match self.token {
            Some(token) => req.bearer_auth(token.0),
            None => req,
        }
    }

    fn get(&self, path: &str) -> reqwest_middleware::RequestBuilder {
        self.bearer(self.http.get(format!("{}/api/{}", self.host, path)))
    }

    fn post(&self, path: &str) -> reqwest_middleware::RequestBuilder {
        self.bearer(self.http.post(format!("{}/api/{}", self.host, path)))
    }

    fn put(&self, path: &str) -> reqwest_middleware::RequestBuilder {
        self.bearer(self.http.put(format!("{}/api/{}", self.host, path)))
    }

    fn delete(&self, path: &str) -> reqwest_middleware::RequestBuilder {
        self.bearer(self.http.delete(format!("{}/api/{}", self.host, path)))
    }

    async fn expect_ok(resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.bytes().await.context("reading error response body")?;
        match api::Error::parse(&body) {
            Ok(err) => Err(err.into()),
            Err(_) => Err(anyhow!("server answered with status {}", status)),
        }
    }

    async fn read_json<R>(resp: reqwest::Response) -> anyhow::Result<R>
    where
        R: serde::de::DeserializeOwned,
    {
        Self::expect_ok(resp)
            .await?
            .json()
            .await
            .context("parsing server response")
    }

    pub async fn auth(&mut self, session: NewSession) -> anyhow::Result<AuthToken> {
        let resp = self
            .post("auth")
            .json(&session)
            .send()
            .await
            .context("sending auth request")?;
        let token: AuthToken = Self::read_json(resp).await?;
        self.token = Some(token);
        Ok(token)
    }

    pub async fn unauth(&mut self) -> anyhow::Result<()> {
        let resp = self
            .post("unauth")
            .send()
            .await
            .context("sending unauth request")?;
        Self::expect_ok(resp).await?;
        self.token = None;
        Ok(())
    }

    pub async fn whoami(&self) -> anyhow::Result<Admin> {
        let resp = self
            .get("whoami")
            .send()
            .await
            .context("sending whoami request")?;
        Self::read_json(resp).await
    }

    /// Gated by the out-of-band admin token, not by a session.
    pub async fn create_admin(&self, admin: NewAdmin, admin_token: AuthToken) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(format!("{}/api/admin/create-admin", self.host))
            .bearer_auth(admin_token.0)
            .json(&admin)
            .send()
            .await
            .context("sending create-admin request")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    pub async fn fetch_articles(&self, category: Option<&str>) -> anyhow::Result<Vec<Article>> {
        let mut req = self.get("articles");
        if let Some(category) = category {
            req = req.query(&[("category", category)]);
        }
        let resp = req.send().await.context("fetching articles")?;
        Self::read_json(resp).await
    }

    pub async fn fetch_article(&self, article: ArticleId) -> anyhow::Result<Article> {
        let resp = self
            .get(&format!("articles/{}", article.0))
            .send()
            .await
            .context("fetching article")?;
        Self::read_json(resp).await
    }

    /// Bumps the view counter, returning the count after the bump.
    pub async fn mark_article_viewed(&self, article: ArticleId) -> anyhow::Result<i64> {
        let resp = self
            .post(&format!("articles/{}/viewed", article.0))
            .send()
            .await
            .context("bumping article views")?;
        Self::read_json(resp).await
    }

    /// Distinct category names, for building filter lists.
    pub async fn article_categories(&self) -> anyhow::Result<Vec<String>> {
        let resp = self
            .get("articles/categories")
            .send()
            .await
            .context("fetching article categories")?;
        Self::read_json(resp).await
    }

    pub async fn create_article(&self, article: NewArticle) -> anyhow::Result<()> {
        let resp = self
            .post("articles")
            .json(&article)
            .send()
            .await
            .context("creating article")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    pub async fn update_article(
        &self,
        article: ArticleId,
        update: ArticleUpdate,
    ) -> anyhow::Result<()> {
        let resp = self
            .put(&format!("articles/{}", article.0))
            .json(&update)
            .send()
            .await
            .context("updating article")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    pub async fn delete_article(&self, article: ArticleId) -> anyhow::Result<()> {
        let resp = self
            .delete(&format!("articles/{}", article.0))
            .send()
            .await
            .context("deleting article")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    pub async fn fetch_videos(&self, category: Option<&str>) -> anyhow::Result<Vec<Video>> {
        let mut req = self.get("videos");
        if let Some(category) = category {
            req = req.query(&[("category", category)]);
        }
        let resp = req.send().await.context("fetching videos")?;
        Self::read_json(resp).await
    }

    pub async fn fetch_video(&self, video: VideoId) -> anyhow::Result<Video> {
        let resp = self
            .get(&format!("videos/{}", video.0))
            .send()
            .await
            .context("fetching video")?;
        Self::read_json(resp).await
    }

    /// Bumps the view counter, returning the count after the bump.
    pub async fn mark_video_viewed(&self, video: VideoId) -> anyhow::Result<i64> {
        let resp = self
            .post(&format!("videos/{}/viewed", video.0))
            .send()
            .await
            .context("bumping video views")?;
        Self::read_json(resp).await
    }

    pub async fn video_categories(&self) -> anyhow::Result<Vec<String>> {
        let resp = self
            .get("videos/categories")
            .send()
            .await
            .context("fetching video categories")?;
        Self::read_json(resp).await
    }

    pub async fn create_video(&self, video: NewVideo) -> anyhow::Result<()> {
        let resp = self
            .post("videos")
            .json(&video)
            .send()
            .await
            .context("creating video")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    pub async fn update_video(&self, video: VideoId, update: VideoUpdate) -> anyhow::Result<()> {
        let resp = self
            .put(&format!("videos/{}", video.0))
            .json(&update)
            .send()
            .await
            .context("updating video")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    pub async fn delete_video(&self, video: VideoId) -> anyhow::Result<()> {
        let resp = self
            .delete(&format!("videos/{}", video.0))
            .send()
            .await
            .context("deleting video")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    pub async fn search(&self, query: &str) -> anyhow::Result<SearchResults> {
        let resp = self
            .get("search")
            .query(&[("q", query)])
            .send()
            .await
            .context("searching the catalogs")?;
        Self::read_json(resp).await
    }

    pub async fn stats(&self) -> anyhow::Result<Stats> {
        let resp = self
            .get("stats")
            .send()
            .await
            .context("fetching stats")?;
        Self::read_json(resp).await
    }
}

#[async_trait]
impl Store for Client {
    async fn fetch_approved_for(&mut self, subject: Subject) -> anyhow::Result<Vec<Comment>> {
        let (kind, id) = subject.as_query_pair();
        let resp = self
            .get("comments")
            .query(&[(kind, id)])
            .send()
            .await
            .context("fetching comments")?;
        Self::read_json(resp).await
    }

    async fn fetch_all_for(&mut self, subject: Subject) -> anyhow::Result<Vec<Comment>> {
        let (kind, id) = subject.as_query_pair();
        let resp = self
            .get("admin/comments")
            .query(&[(kind, id)])
            .send()
            .await
            .context("fetching all comments")?;
        Self::read_json(resp).await
    }

    async fn insert(&mut self, comment: NewComment) -> anyhow::Result<()> {
        let resp = self
            .post("comments")
            .json(&comment)
            .send()
            .await
            .context("inserting comment")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    async fn set_approved(&mut self, comment: CommentId, approved: bool) -> anyhow::Result<()> {
        let resp = self
            .post(&format!("admin/comments/{}/approved", comment.0))
            .json(&approved)
            .send()
            .await
            .context("setting comment approval")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    async fn delete(&mut self, comment: CommentId) -> anyhow::Result<()> {
        let resp = Client::delete(self, &format!("admin/comments/{}", comment.0))
            .send()
            .await
            .context("deleting comment")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    async fn like_state(
        &mut self,
        subject: Subject,
        client: ClientId,
    ) -> anyhow::Result<LikeState> {
        let (kind, id) = subject.as_query_pair();
        let resp = self
            .get("likes/state")
            .query(&[(kind, id), ("client", client.0)])
            .send()
            .await
            .context("fetching like state")?;
        Self::read_json(resp).await
    }

    async fn insert_like(&mut self, like: NewLike) -> anyhow::Result<()> {
        let resp = self
            .post("likes")
            .json(&like)
            .send()
            .await
            .context("inserting like")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    async fn delete_like(&mut self, subject: Subject, client: ClientId) -> anyhow::Result<()> {
        let (kind, id) = subject.as_query_pair();
        let resp = Client::delete(self, "likes")
            .query(&[(kind, id), ("client", client.0)])
            .send()
            .await
            .context("deleting like")?;
        Self::expect_ok(resp).await?;
        Ok(())
    }
}
