use anyhow::Context;

use crate::api::{ClientId, LikeState, NewLike, Store, Subject};

/// What the like button shows for one subject, as seen by one client.
pub async fn like_state<S: Store>(
    store: &mut S,
    subject: Subject,
    client: ClientId,
) -> anyhow::Result<LikeState> {
    store
        .like_state(subject, client)
        .await
        .context("fetching like state")
}

/// Flips this client's like on `subject` and returns the state after the
/// flip. The client identity is whatever the caller passes in; it is never
/// read from ambient state.
pub async fn toggle_like<S: Store>(
    store: &mut S,
    subject: Subject,
    client: ClientId,
) -> anyhow::Result<LikeState> {
    let state = store
        .like_state(subject, client)
        .await
        .context("fetching like state")?;
    if state.liked {
        store
            .delete_like(subject, client)
            .await
            .context("removing like")?;
    } else {
        store
            .insert_like(NewLike::now(client, subject))
            .await
            .context("inserting like")?;
    }
    store
        .like_state(subject, client)
        .await
        .context("fetching like state after toggle")
}
