use chrono::Utc;
use uuid::Uuid;

use crate::{Error, Subject, Time, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct LikeId(pub Uuid);

impl LikeId {
    pub fn stub() -> LikeId {
        LikeId(STUB_UUID)
    }
}

/// Pseudo-anonymous identity likes are tagged with. Callers pass it in
/// explicitly on every request and persist it however they want; nothing
/// here reads ambient state.
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct ClientId(pub Uuid);

impl ClientId {
    pub fn stub() -> ClientId {
        ClientId(STUB_UUID)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Like {
    pub id: LikeId,
    pub client: ClientId,

    #[serde(flatten)]
    pub subject: Subject,
    pub created_at: Time,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewLike {
    pub id: LikeId,
    pub client: ClientId,

    #[serde(flatten)]
    pub subject: Subject,
    pub created_at: Time,
}

impl NewLike {
    pub fn now(client: ClientId, subject: Subject) -> NewLike {
        NewLike {
            id: LikeId(Uuid::new_v4()),
            client,
            subject,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_time(&self.created_at)
    }
}

/// What one client sees on a like button: the total count and whether their
/// own like is among them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub count: i64,
}
