use anyhow::Context;

use crate::{
    api::{Error, NewComment, Store, Subject},
    build_comment_tree, walk, CommentNode, Walk,
};

/// One subject's comment section: the subject and the tree built from its
/// eligible set. Any operation that changes the set reloads and rebuilds
/// the whole tree; nothing patches it in place.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentThread {
    pub subject: Subject,
    pub roots: Vec<CommentNode>,
}

impl CommentThread {
    /// Fetches the eligible set for `subject` and builds its tree.
    pub async fn load<S: Store>(store: &mut S, subject: Subject) -> anyhow::Result<CommentThread> {
        let records = store
            .fetch_approved_for(subject)
            .await
            .context("fetching eligible comment set")?;
        Ok(CommentThread {
            subject,
            roots: build_comment_tree(records),
        })
    }

    /// Validates and submits a comment or reply, then reloads the thread.
    ///
    /// On failure the current tree is left exactly as it was, so the caller
    /// can keep displaying it and surface a retryable error.
    pub async fn post<S: Store>(
        &mut self,
        store: &mut S,
        comment: NewComment,
    ) -> anyhow::Result<()> {
        if comment.subject != self.subject {
            return Err(Error::InvalidSubject.into());
        }
        comment.validate()?;
        store.insert(comment).await.context("inserting comment")?;
        *self = CommentThread::load(store, self.subject)
            .await
            .context("reloading thread after insert")?;
        Ok(())
    }

    /// Display-order traversal of the whole thread.
    pub fn walk(&self) -> Walk<'_> {
        walk(&self.roots)
    }
}
