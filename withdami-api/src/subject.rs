use uuid::Uuid;

use crate::{ArticleId, Error, VideoId};

/// The article or video a comment or like is attached to.
///
/// On the wire this is the pair of nullable `article_id` / `video_id`
/// columns; exactly one of the two must be set, which deserialization
/// enforces.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(try_from = "RawSubject", into = "RawSubject")]
pub enum Subject {
    Article(ArticleId),
    Video(VideoId),
}

impl Subject {
    pub fn article_uuid(&self) -> Option<Uuid> {
        match self {
            Subject::Article(ArticleId(id)) => Some(*id),
            Subject::Video(_) => None,
        }
    }

    pub fn video_uuid(&self) -> Option<Uuid> {
        match self {
            Subject::Article(_) => None,
            Subject::Video(VideoId(id)) => Some(*id),
        }
    }

    /// Key/value pair for selecting this subject in a query string, eg.
    /// `?article=<uuid>`.
    pub fn as_query_pair(&self) -> (&'static str, Uuid) {
        match self {
            Subject::Article(ArticleId(id)) => ("article", *id),
            Subject::Video(VideoId(id)) => ("video", *id),
        }
    }

    pub fn from_query(
        article: Option<ArticleId>,
        video: Option<VideoId>,
    ) -> Result<Subject, Error> {
        RawSubject {
            article_id: article,
            video_id: video,
        }
        .try_into()
    }
}

#[derive(Clone, serde::Deserialize, serde::Serialize)]
struct RawSubject {
    #[serde(default)]
    article_id: Option<ArticleId>,
    #[serde(default)]
    video_id: Option<VideoId>,
}

impl TryFrom<RawSubject> for Subject {
    type Error = Error;

    fn try_from(raw: RawSubject) -> Result<Subject, Error> {
        match (raw.article_id, raw.video_id) {
            (Some(a), None) => Ok(Subject::Article(a)),
            (None, Some(v)) => Ok(Subject::Video(v)),
            _ => Err(Error::InvalidSubject),
        }
    }
}

impl From<Subject> for RawSubject {
    fn from(s: Subject) -> RawSubject {
        RawSubject {
            article_id: match s {
                Subject::Article(a) => Some(a),
                Subject::Video(_) => None,
            },
            video_id: match s {
                Subject::Article(_) => None,
                Subject::Video(v) => Some(v),
            },
        }
    }
}
