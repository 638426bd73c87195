use chrono::{Datelike, Utc};

mod admin;
mod article;
mod auth;
mod comment;
mod error;
mod like;
mod store;
mod subject;
mod video;

pub use admin::{Admin, AdminId, NewAdmin};
pub use article::{Article, ArticleId, ArticleUpdate, NewArticle};
pub use auth::{AuthToken, NewSession};
pub use comment::{Comment, CommentId, NewComment, ANONYMOUS_LABEL};
pub use error::Error;
pub use like::{ClientId, Like, LikeId, LikeState, NewLike};
pub use store::Store;
pub use subject::Subject;
pub use video::{youtube_thumbnail, NewVideo, Video, VideoId, VideoUpdate};

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

pub fn validate_string(s: &str) -> Result<(), Error> {
    // postgres cannot store null bytes in text columns
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

pub fn validate_time(t: &Time) -> Result<(), Error> {
    // postgres timestamps cannot represent years outside this range
    if t.year() < -4712 || t.year() > 294275 {
        return Err(Error::IntegerOutOfRange(t.year() as i64));
    }
    Ok(())
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SearchResults {
    pub articles: Vec<Article>,
    pub videos: Vec<Video>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Stats {
    pub articles: i64,
    pub videos: i64,
    pub comments: i64,
    pub likes: i64,
}
