use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;
use uuid::Uuid;

#[derive(Clone, Debug, Eq, PartialEq, bolero::generator::TypeGenerator, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not found: {0}")]
    NotFound(#[generator(bolero::generator::gen_arbitrary())] Uuid),

    #[error("Uuid already used {0}")]
    UuidAlreadyUsed(#[generator(bolero::generator::gen_arbitrary())] Uuid),

    #[error("Name already used {0}")]
    NameAlreadyUsed(String),

    #[error("Invalid character in name {0:?}")]
    InvalidName(String),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Comment body cannot be empty")]
    EmptyComment,

    #[error("Subject must be exactly one of article or video")]
    InvalidSubject,

    #[error("Integer out of the storable range: {0}")]
    IntegerOutOfRange(i64),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::UuidAlreadyUsed(_) => StatusCode::CONFLICT,
            Error::NameAlreadyUsed(_) => StatusCode::CONFLICT,
            Error::InvalidName(_) => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::EmptyComment => StatusCode::BAD_REQUEST,
            Error::InvalidSubject => StatusCode::BAD_REQUEST,
            Error::IntegerOutOfRange(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::NotFound(u) => json!({
                "message": "not found",
                "type": "not-found",
                "uuid": u,
            }),
            Error::UuidAlreadyUsed(u) => json!({
                "message": "uuid conflict",
                "type": "conflict-uuid",
                "uuid": u,
            }),
            Error::NameAlreadyUsed(n) => json!({
                "message": "name already used",
                "type": "conflict-name",
                "name": n,
            }),
            Error::InvalidName(n) => json!({
                "message": "there was an invalid character in an admin name",
                "type": "invalid-name",
                "name": n,
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::EmptyComment => json!({
                "message": "comment body cannot be empty",
                "type": "empty-comment",
            }),
            Error::InvalidSubject => json!({
                "message": "subject must be exactly one of article or video",
                "type": "invalid-subject",
            }),
            Error::IntegerOutOfRange(i) => json!({
                "message": "integer out of the storable range",
                "type": "integer-out-of-range",
                "integer": i,
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(String::from(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or(""),
                )),
                "permission-denied" => Error::PermissionDenied,
                "not-found" => Error::NotFound(
                    data.get("uuid")
                        .and_then(|uuid| uuid.as_str())
                        .and_then(|uuid| Uuid::from_str(uuid).ok())
                        .ok_or_else(|| anyhow!("not-found error without a proper uuid"))?,
                ),
                "conflict-uuid" => Error::UuidAlreadyUsed(
                    data.get("uuid")
                        .and_then(|uuid| uuid.as_str())
                        .and_then(|uuid| Uuid::from_str(uuid).ok())
                        .ok_or_else(|| anyhow!("error is a uuid conflict without a proper uuid"))?,
                ),
                "conflict-name" => Error::NameAlreadyUsed(String::from(
                    data.get("name")
                        .and_then(|n| n.as_str())
                        .ok_or_else(|| anyhow!("error is a name conflict without a name"))?,
                )),
                "invalid-name" => Error::InvalidName(String::from(
                    data.get("name").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is about an invalid name but no name was provided")
                    })?,
                )),
                "null-byte" => Error::NullByteInString(String::from(
                    data.get("string").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is a null-byte-in-string without a string")
                    })?,
                )),
                "empty-comment" => Error::EmptyComment,
                "invalid-subject" => Error::InvalidSubject,
                "integer-out-of-range" => Error::IntegerOutOfRange(
                    data.get("integer")
                        .and_then(|i| i.as_i64())
                        .ok_or_else(|| anyhow!("out-of-range error without an integer"))?,
                ),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
