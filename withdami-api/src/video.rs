use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Error, Time, STUB_UUID};

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
pub struct VideoId(#[generator(bolero::generator::gen_arbitrary())] pub Uuid);

impl VideoId {
    pub fn stub() -> VideoId {
        VideoId(STUB_UUID)
    }
}

/// The default thumbnail youtube serves for a video id.
pub fn youtube_thumbnail(youtube_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", youtube_id)
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    pub description: String,
    pub youtube_id: String,
    pub category: String,
    pub thumbnail: String,

    /// Display string, eg. "12:34"
    pub duration: String,
    pub publish_date: NaiveDate,

    pub created_at: Time,
    pub updated_at: Time,
    pub views: i64,
}

/// Video creation payload; a missing thumbnail falls back to the youtube
/// default for `youtube_id`.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewVideo {
    pub id: VideoId,
    pub title: String,
    pub description: String,
    pub youtube_id: String,
    pub category: String,
    pub thumbnail: Option<String>,
    pub duration: String,
    pub publish_date: NaiveDate,
}

impl NewVideo {
    pub fn thumbnail_or_default(&self) -> String {
        match &self.thumbnail {
            Some(t) => t.clone(),
            None => youtube_thumbnail(&self.youtube_id),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.title)?;
        crate::validate_string(&self.description)?;
        crate::validate_string(&self.youtube_id)?;
        crate::validate_string(&self.category)?;
        if let Some(thumbnail) = &self.thumbnail {
            crate::validate_string(thumbnail)?;
        }
        crate::validate_string(&self.duration)?;
        Ok(())
    }
}

/// Full replacement of a video's editable fields.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VideoUpdate {
    pub title: String,
    pub description: String,
    pub youtube_id: String,
    pub category: String,
    pub thumbnail: String,
    pub duration: String,
    pub publish_date: NaiveDate,
}

impl VideoUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.title)?;
        crate::validate_string(&self.description)?;
        crate::validate_string(&self.youtube_id)?;
        crate::validate_string(&self.category)?;
        crate::validate_string(&self.thumbnail)?;
        crate::validate_string(&self.duration)?;
        Ok(())
    }
}
