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
pub struct ArticleId(#[generator(bolero::generator::gen_arbitrary())] pub Uuid);

impl ArticleId {
    pub fn stub() -> ArticleId {
        ArticleId(STUB_UUID)
    }
}

/// A published article, as stored.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub featured_image: String,
    pub tags: Vec<String>,

    /// Display string, eg. "5 min read"
    pub reading_time: String,
    pub publish_date: NaiveDate,

    pub created_at: Time,
    pub updated_at: Time,
    pub views: i64,
}

/// Article creation payload. The id is generated by the submitting client;
/// reusing one is a conflict.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewArticle {
    pub id: ArticleId,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub featured_image: String,
    pub tags: Vec<String>,
    pub reading_time: String,
    pub publish_date: NaiveDate,
}

impl NewArticle {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.title)?;
        crate::validate_string(&self.excerpt)?;
        crate::validate_string(&self.content)?;
        crate::validate_string(&self.category)?;
        crate::validate_string(&self.featured_image)?;
        for tag in &self.tags {
            crate::validate_string(tag)?;
        }
        crate::validate_string(&self.reading_time)?;
        Ok(())
    }
}

/// Full replacement of an article's editable fields.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ArticleUpdate {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub featured_image: String,
    pub tags: Vec<String>,
    pub reading_time: String,
    pub publish_date: NaiveDate,
}

impl ArticleUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.title)?;
        crate::validate_string(&self.excerpt)?;
        crate::validate_string(&self.content)?;
        crate::validate_string(&self.category)?;
        crate::validate_string(&self.featured_image)?;
        for tag in &self.tags {
            crate::validate_string(tag)?;
        }
        crate::validate_string(&self.reading_time)?;
        Ok(())
    }
}
