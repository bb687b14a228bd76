//! Request body normalization.
//!
//! Turns a raw body plus its declared content type into a generic value tree
//! (`serde_json::Value`) that scenario conditions can inspect through
//! `$body`:
//!
//! - no content type / `PLAIN_TEXT`: the raw string, untouched
//! - `JSON`: the parsed document
//! - `XML` / `APP_XML`: the element tree as nested mappings (see `xml`)
//! - `URL_ENCODED`: a mapping of type-coerced fields (see `form`)

mod content_type;
mod form;
mod xml;

pub use content_type::ContentType;

use serde_json::Value;

/// Raised when a body is structurally invalid for its declared content type.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid XML body")]
    InvalidXml,
    #[error("invalid form body: no key=value pairs found")]
    InvalidForm,
}

/// Normalize a raw request body.
pub fn normalize(raw: &str, content_type: Option<ContentType>) -> Result<Value, BodyError> {
    match content_type {
        None | Some(ContentType::PlainText) => Ok(Value::String(raw.to_string())),
        Some(ContentType::Json) => Ok(serde_json::from_str(raw)?),
        Some(ContentType::Xml | ContentType::AppXml) => xml::parse_xml(raw),
        Some(ContentType::UrlEncoded) => form::parse_form(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PLAIN_TEXT_BODY: &str = "This is a plain text body and should not be parsed";

    #[test]
    fn test_passthrough_without_content_type() {
        let value = normalize(PLAIN_TEXT_BODY, None).unwrap();
        assert_eq!(value, Value::String(PLAIN_TEXT_BODY.to_string()));

        let value = normalize(PLAIN_TEXT_BODY, Some(ContentType::PlainText)).unwrap();
        assert_eq!(value, Value::String(PLAIN_TEXT_BODY.to_string()));
    }

    #[test]
    fn test_plain_text_never_fails() {
        assert!(normalize("{not json", Some(ContentType::PlainText)).is_ok());
        assert!(normalize("", None).is_ok());
    }

    #[test]
    fn test_json_body() {
        let value = normalize(r#"{"a":1}"#, Some(ContentType::Json)).unwrap();
        assert_eq!(value, json!({"a": 1}));

        let raw = r#"{
            "userId": 123,
            "credit": 10.45,
            "married": true,
            "phones": ["(11) 2222-2222", "(22) 3333-3333"],
            "addresses": {"home": "123 Evergreen St."}
        }"#;
        let value = normalize(raw, Some(ContentType::Json)).unwrap();
        assert_eq!(value["userId"], json!(123));
        assert_eq!(value["phones"][1], json!("(22) 3333-3333"));
        assert_eq!(value["addresses"]["home"], json!("123 Evergreen St."));
    }

    #[test]
    fn test_xml_body() {
        let value = normalize("<a>1</a>", Some(ContentType::Xml)).unwrap();
        assert_eq!(value, json!({"a": "1"}));
        let value = normalize("<a>1</a>", Some(ContentType::AppXml)).unwrap();
        assert_eq!(value, json!({"a": "1"}));
    }

    #[test]
    fn test_malformed_bodies_are_rejected() {
        assert!(matches!(
            normalize("{\"a\":", Some(ContentType::Json)),
            Err(BodyError::InvalidJson(_))
        ));
        assert!(matches!(
            normalize("", Some(ContentType::Json)),
            Err(BodyError::InvalidJson(_))
        ));
        assert!(matches!(
            normalize("garbage", Some(ContentType::Xml)),
            Err(BodyError::InvalidXml)
        ));
        assert!(matches!(
            normalize("garbage", Some(ContentType::UrlEncoded)),
            Err(BodyError::InvalidForm)
        ));
    }
}
