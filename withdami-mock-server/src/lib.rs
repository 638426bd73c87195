use std::{
    cmp,
    collections::{btree_map, BTreeMap, HashMap},
};

use async_trait::async_trait;
use chrono::Utc;
use withdami_api::{
    Admin, AdminId, Article, ArticleId, ArticleUpdate, AuthToken, ClientId, Comment, CommentId,
    Error, Like, LikeId, LikeState, NewAdmin, NewArticle, NewComment, NewLike, NewSession,
    NewVideo, SearchResults, Stats, Store, Subject, Uuid, Video, VideoId, VideoUpdate,
};

/// In-memory stand-in for the real server, with the same visible semantics.
pub struct MockServer {
    admins: BTreeMap<AdminId, DbAdmin>,
    articles: BTreeMap<ArticleId, Article>,
    videos: BTreeMap<VideoId, Video>,
    comments: BTreeMap<CommentId, Comment>,
    likes: BTreeMap<LikeId, Like>,
}

#[derive(Debug)]
struct DbAdmin {
    name: String,
    // tests (of which mock-server is a part of) don't actually use bcrypt
    pass: String,
    sessions: HashMap<AuthToken, Device>,
}

#[derive(Debug)]
struct Device(String);

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            admins: BTreeMap::new(),
            articles: BTreeMap::new(),
            videos: BTreeMap::new(),
            comments: BTreeMap::new(),
            likes: BTreeMap::new(),
        }
    }

    /// Return name & password for admin number `id`
    pub fn test_get_admin_info(&self, id: usize) -> (&str, &str) {
        let a = self
            .admins
            .values()
            .nth(id)
            .unwrap_or_else(|| panic!("getting admin {id} among {}", self.admins.len()));
        (&a.name, &a.pass)
    }

    /// Return the current number of admins
    pub fn test_num_admins(&self) -> usize {
        self.admins.len()
    }

    pub fn create_admin(&mut self, a: NewAdmin) -> Result<(), Error> {
        a.validate()?;

        if self.admins.values().any(|db| db.name == a.name) {
            return Err(Error::NameAlreadyUsed(a.name));
        }

        match self.admins.entry(a.id) {
            btree_map::Entry::Occupied(_) => Err(Error::UuidAlreadyUsed(a.id.0)),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(DbAdmin {
                    name: a.name,
                    pass: a.initial_password,
                    sessions: HashMap::new(),
                });
                Ok(())
            }
        }
    }

    pub fn auth(&mut self, s: NewSession) -> Result<AuthToken, Error> {
        s.validate()?;
        for a in self.admins.values_mut() {
            if a.name == s.user {
                if s.password != a.pass {
                    return Err(Error::PermissionDenied);
                }
                let tok = AuthToken(Uuid::new_v4());
                a.sessions.insert(tok, Device(s.device));
                return Ok(tok);
            }
        }
        Err(Error::PermissionDenied)
    }

    pub fn unauth(&mut self, tok: AuthToken) -> Result<(), Error> {
        for a in self.admins.values_mut() {
            if a.sessions.remove(&tok).is_some() {
                return Ok(());
            }
        }
        Err(Error::PermissionDenied)
    }

    pub fn whoami(&self, tok: AuthToken) -> Result<Admin, Error> {
        for (id, a) in self.admins.iter() {
            if a.sessions.contains_key(&tok) {
                return Ok(Admin {
                    id: *id,
                    name: a.name.clone(),
                });
            }
        }
        Err(Error::PermissionDenied)
    }

    fn authed(&self, tok: AuthToken) -> Result<(), Error> {
        match self.admins.values().any(|a| a.sessions.contains_key(&tok)) {
            true => Ok(()),
            false => Err(Error::PermissionDenied),
        }
    }

    pub fn fetch_articles(&self, category: Option<&str>) -> Vec<Article> {
        let mut articles = self
            .articles
            .values()
            .filter(|a| category.map_or(true, |c| a.category == c))
            .cloned()
            .collect::<Vec<_>>();
        articles.sort_unstable_by_key(|a| (cmp::Reverse((a.publish_date, a.created_at)), a.id));
        articles
    }

    pub fn fetch_article(&self, id: ArticleId) -> Result<Article, Error> {
        self.articles.get(&id).cloned().ok_or(Error::NotFound(id.0))
    }

    pub fn mark_article_viewed(&mut self, id: ArticleId) -> Result<i64, Error> {
        let a = self.articles.get_mut(&id).ok_or(Error::NotFound(id.0))?;
        a.views += 1;
        Ok(a.views)
    }

    pub fn article_categories(&self) -> Vec<String> {
        let mut cats = self
            .articles
            .values()
            .map(|a| a.category.clone())
            .collect::<Vec<_>>();
        cats.sort_unstable();
        cats.dedup();
        cats
    }

    pub fn create_article(&mut self, tok: AuthToken, a: NewArticle) -> Result<(), Error> {
        self.authed(tok)?;
        a.validate()?;
        match self.articles.entry(a.id) {
            btree_map::Entry::Occupied(_) => Err(Error::UuidAlreadyUsed(a.id.0)),
            btree_map::Entry::Vacant(entry) => {
                let now = Utc::now();
                entry.insert(Article {
                    id: a.id,
                    title: a.title,
                    excerpt: a.excerpt,
                    content: a.content,
                    category: a.category,
                    featured_image: a.featured_image,
                    tags: a.tags,
                    reading_time: a.reading_time,
                    publish_date: a.publish_date,
                    created_at: now,
                    updated_at: now,
                    views: 0,
                });
                Ok(())
            }
        }
    }

    pub fn update_article(
        &mut self,
        tok: AuthToken,
        id: ArticleId,
        u: ArticleUpdate,
    ) -> Result<(), Error> {
        self.authed(tok)?;
        u.validate()?;
        let a = self.articles.get_mut(&id).ok_or(Error::NotFound(id.0))?;
        a.title = u.title;
        a.excerpt = u.excerpt;
        a.content = u.content;
        a.category = u.category;
        a.featured_image = u.featured_image;
        a.tags = u.tags;
        a.reading_time = u.reading_time;
        a.publish_date = u.publish_date;
        a.updated_at = Utc::now();
        Ok(())
    }

    pub fn delete_article(&mut self, tok: AuthToken, id: ArticleId) -> Result<(), Error> {
        self.authed(tok)?;
        if self.articles.remove(&id).is_none() {
            return Err(Error::NotFound(id.0));
        }
        let subject = Subject::Article(id);
        self.comments.retain(|_, c| c.subject != subject);
        self.likes.retain(|_, l| l.subject != subject);
        Ok(())
    }

    pub fn fetch_videos(&self, category: Option<&str>) -> Vec<Video> {
        let mut videos = self
            .videos
            .values()
            .filter(|v| category.map_or(true, |c| v.category == c))
            .cloned()
            .collect::<Vec<_>>();
        videos.sort_unstable_by_key(|v| (cmp::Reverse((v.publish_date, v.created_at)), v.id));
        videos
    }

    pub fn fetch_video(&self, id: VideoId) -> Result<Video, Error> {
        self.videos.get(&id).cloned().ok_or(Error::NotFound(id.0))
    }

    pub fn mark_video_viewed(&mut self, id: VideoId) -> Result<i64, Error> {
        let v = self.videos.get_mut(&id).ok_or(Error::NotFound(id.0))?;
        v.views += 1;
        Ok(v.views)
    }

    pub fn video_categories(&self) -> Vec<String> {
        let mut cats = self
            .videos
            .values()
            .map(|v| v.category.clone())
            .collect::<Vec<_>>();
        cats.sort_unstable();
        cats.dedup();
        cats
    }

    pub fn create_video(&mut self, tok: AuthToken, v: NewVideo) -> Result<(), Error> {
        self.authed(tok)?;
        v.validate()?;
        match self.videos.entry(v.id) {
            btree_map::Entry::Occupied(_) => Err(Error::UuidAlreadyUsed(v.id.0)),
            btree_map::Entry::Vacant(entry) => {
                let now = Utc::now();
                let thumbnail = v.thumbnail_or_default();
                entry.insert(Video {
                    id: v.id,
                    title: v.title,
                    description: v.description,
                    youtube_id: v.youtube_id,
                    category: v.category,
                    thumbnail,
                    duration: v.duration,
                    publish_date: v.publish_date,
                    created_at: now,
                    updated_at: now,
                    views: 0,
                });
                Ok(())
            }
        }
    }

    pub fn update_video(
        &mut self,
        tok: AuthToken,
        id: VideoId,
        u: VideoUpdate,
    ) -> Result<(), Error> {
        self.authed(tok)?;
        u.validate()?;
        let v = self.videos.get_mut(&id).ok_or(Error::NotFound(id.0))?;
        v.title = u.title;
        v.description = u.description;
        v.youtube_id = u.youtube_id;
        v.category = u.category;
        v.thumbnail = u.thumbnail;
        v.duration = u.duration;
        v.publish_date = u.publish_date;
        v.updated_at = Utc::now();
        Ok(())
    }

    pub fn delete_video(&mut self, tok: AuthToken, id: VideoId) -> Result<(), Error> {
        self.authed(tok)?;
        if self.videos.remove(&id).is_none() {
            return Err(Error::NotFound(id.0));
        }
        let subject = Subject::Video(id);
        self.comments.retain(|_, c| c.subject != subject);
        self.likes.retain(|_, l| l.subject != subject);
        Ok(())
    }

    pub fn search(&self, q: &str) -> SearchResults {
        if q.trim().is_empty() {
            return SearchResults {
                articles: Vec::new(),
                videos: Vec::new(),
            };
        }
        let q = q.to_lowercase();
        let matches = |hay: &str| hay.to_lowercase().contains(&q);
        let mut articles = self
            .articles
            .values()
            .filter(|a| matches(&a.title) || matches(&a.excerpt) || matches(&a.category))
            .cloned()
            .collect::<Vec<_>>();
        articles.sort_unstable_by_key(|a| (cmp::Reverse((a.publish_date, a.created_at)), a.id));
        articles.truncate(5);
        let mut videos = self
            .videos
            .values()
            .filter(|v| matches(&v.title) || matches(&v.description) || matches(&v.category))
            .cloned()
            .collect::<Vec<_>>();
        videos.sort_unstable_by_key(|v| (cmp::Reverse((v.publish_date, v.created_at)), v.id));
        videos.truncate(5);
        SearchResults { articles, videos }
    }

    pub fn stats(&self) -> Stats {
        Stats {
            articles: self.articles.len() as i64,
            videos: self.videos.len() as i64,
            comments: self.comments.len() as i64,
            likes: self.likes.len() as i64,
        }
    }

    fn comments_for(&self, subject: Subject, approved_only: bool) -> Vec<Comment> {
        let mut comments = self
            .comments
            .values()
            .filter(|c| c.subject == subject && (!approved_only || c.approved))
            .cloned()
            .collect::<Vec<_>>();
        comments.sort_unstable_by_key(|c| (cmp::Reverse(c.created_at), c.id));
        comments
    }

    fn subject_exists(&self, subject: Subject) -> Result<(), Error> {
        let known = match subject {
            Subject::Article(a) => self.articles.contains_key(&a),
            Subject::Video(v) => self.videos.contains_key(&v),
        };
        match known {
            true => Ok(()),
            false => Err(Error::NotFound(subject.as_query_pair().1)),
        }
    }
}

#[async_trait]
impl Store for MockServer {
    async fn fetch_approved_for(&mut self, subject: Subject) -> anyhow::Result<Vec<Comment>> {
        Ok(self.comments_for(subject, true))
    }

    async fn fetch_all_for(&mut self, subject: Subject) -> anyhow::Result<Vec<Comment>> {
        Ok(self.comments_for(subject, false))
    }

    async fn insert(&mut self, comment: NewComment) -> anyhow::Result<()> {
        comment.validate()?;
        self.subject_exists(comment.subject)?;
        match self.comments.entry(comment.id) {
            btree_map::Entry::Occupied(_) => Err(Error::UuidAlreadyUsed(comment.id.0).into()),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(Comment {
                    id: comment.id,
                    author_name: comment.author_name,
                    body: comment.body,
                    subject: comment.subject,
                    parent_id: comment.parent_id,
                    approved: true,
                    created_at: comment.created_at,
                    updated_at: comment.created_at,
                });
                Ok(())
            }
        }
    }

    async fn set_approved(&mut self, comment: CommentId, approved: bool) -> anyhow::Result<()> {
        let c = self
            .comments
            .get_mut(&comment)
            .ok_or(Error::NotFound(comment.0))?;
        c.approved = approved;
        c.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&mut self, comment: CommentId) -> anyhow::Result<()> {
        // replies are kept and come back as top-level comments
        match self.comments.remove(&comment) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(comment.0).into()),
        }
    }

    async fn like_state(
        &mut self,
        subject: Subject,
        client: ClientId,
    ) -> anyhow::Result<LikeState> {
        let mut liked = false;
        let mut count = 0;
        for like in self.likes.values() {
            if like.subject == subject {
                count += 1;
                liked = liked || like.client == client;
            }
        }
        Ok(LikeState { liked, count })
    }

    async fn insert_like(&mut self, like: NewLike) -> anyhow::Result<()> {
        like.validate()?;
        self.subject_exists(like.subject)?;
        // at most one like per (client, subject), repeats are no-ops
        if self
            .likes
            .values()
            .any(|l| l.subject == like.subject && l.client == like.client)
        {
            return Ok(());
        }
        match self.likes.entry(like.id) {
            btree_map::Entry::Occupied(_) => Err(Error::UuidAlreadyUsed(like.id.0).into()),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(Like {
                    id: like.id,
                    client: like.client,
                    subject: like.subject,
                    created_at: like.created_at,
                });
                Ok(())
            }
        }
    }

    async fn delete_like(&mut self, subject: Subject, client: ClientId) -> anyhow::Result<()> {
        self.likes
            .retain(|_, l| !(l.subject == subject && l.client == client));
        Ok(())
    }
}
