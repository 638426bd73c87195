use chrono::Utc;
use uuid::Uuid;

use crate::{Error, Subject, Time, STUB_UUID};

pub const ANONYMOUS_LABEL: &str = "Anonymous";

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn stub() -> CommentId {
        CommentId(STUB_UUID)
    }
}

/// One comment row, as stored: flat, with threading expressed only through
/// `parent_id`.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,

    /// Missing means the comment displays as [`ANONYMOUS_LABEL`]
    pub author_name: Option<String>,
    pub body: String,

    #[serde(flatten)]
    pub subject: Subject,

    /// Missing or dangling both mean "top-level"; dangling parents come up
    /// when the parent was deleted or is not approved
    pub parent_id: Option<CommentId>,

    pub approved: bool,
    pub created_at: Time,
    pub updated_at: Time,
}

impl Comment {
    pub fn author_label(&self) -> &str {
        self.author_name.as_deref().unwrap_or(ANONYMOUS_LABEL)
    }
}

/// Comment submission payload. The id is generated by the submitting client;
/// reusing one is a conflict.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub id: CommentId,
    pub author_name: Option<String>,
    pub body: String,

    #[serde(flatten)]
    pub subject: Subject,
    pub parent_id: Option<CommentId>,
    pub created_at: Time,
}

impl NewComment {
    /// Builds a submission dated now, trimming the author name and mapping
    /// whitespace-only names to `None`.
    pub fn now(
        author_name: Option<String>,
        body: String,
        subject: Subject,
        parent_id: Option<CommentId>,
    ) -> NewComment {
        let author_name = author_name
            .map(|n| String::from(n.trim()))
            .filter(|n| !n.is_empty());
        NewComment {
            id: CommentId(Uuid::new_v4()),
            author_name,
            body,
            subject,
            parent_id,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.body.trim().is_empty() {
            return Err(Error::EmptyComment);
        }
        crate::validate_string(&self.body)?;
        if let Some(name) = &self.author_name {
            crate::validate_string(name)?;
        }
        crate::validate_time(&self.created_at)?;
        Ok(())
    }
}
