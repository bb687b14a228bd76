//! Content types understood by the body normalizer and scenario responses.

use serde::{Deserialize, Serialize};

/// A supported HTTP content type.
///
/// Serialized with the upper-case names mock authors use in definitions
/// (`JSON`, `XML`, `APP_XML`, `URL_ENCODED`, `PLAIN_TEXT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Json,
    Xml,
    AppXml,
    UrlEncoded,
    PlainText,
}

impl ContentType {
    const ALL: [ContentType; 5] = [
        ContentType::Json,
        ContentType::Xml,
        ContentType::AppXml,
        ContentType::UrlEncoded,
        ContentType::PlainText,
    ];

    /// MIME type sent in the `Content-Type` response header.
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Xml => "text/xml",
            ContentType::AppXml => "application/xml",
            ContentType::UrlEncoded => "application/x-www-form-urlencoded",
            ContentType::PlainText => "text/plain",
        }
    }

    /// Map a `Content-Type` header value to a content type.
    ///
    /// Media type parameters (`; charset=utf-8`) are ignored and the
    /// comparison is case-insensitive. Unknown media types are plain text.
    pub fn from_header(value: &str) -> Self {
        let media_type = value.split(';').next().unwrap_or("").trim();
        Self::ALL
            .into_iter()
            .find(|ct| ct.mime().eq_ignore_ascii_case(media_type))
            .unwrap_or(ContentType::PlainText)
    }
}
