use async_trait::async_trait;

use crate::{ClientId, Comment, CommentId, LikeState, NewComment, NewLike, Subject};

/// Typed access to the engagement store, implemented both by the HTTP client
/// and by the in-memory mock the tests run against.
///
/// Callers fetch flat record sets and rebuild their derived views from
/// scratch; there is no incremental-update surface here.
#[async_trait]
pub trait Store {
    /// The eligible (approved) comment set for one subject.
    async fn fetch_approved_for(&mut self, subject: Subject) -> anyhow::Result<Vec<Comment>>;

    /// Every comment for one subject, approved or not. Moderation only.
    async fn fetch_all_for(&mut self, subject: Subject) -> anyhow::Result<Vec<Comment>>;

    async fn insert(&mut self, comment: NewComment) -> anyhow::Result<()>;

    async fn set_approved(&mut self, comment: CommentId, approved: bool) -> anyhow::Result<()>;

    async fn delete(&mut self, comment: CommentId) -> anyhow::Result<()>;

    async fn like_state(&mut self, subject: Subject, client: ClientId)
        -> anyhow::Result<LikeState>;

    async fn insert_like(&mut self, like: NewLike) -> anyhow::Result<()>;

    async fn delete_like(&mut self, subject: Subject, client: ClientId) -> anyhow::Result<()>;
}
