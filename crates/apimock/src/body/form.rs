//! `application/x-www-form-urlencoded` bodies.

use super::BodyError;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::sync::OnceLock;

static INTEGER_REGEX: OnceLock<Regex> = OnceLock::new();
static FLOAT_REGEX: OnceLock<Regex> = OnceLock::new();

fn integer_regex() -> &'static Regex {
    INTEGER_REGEX.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("valid integer regex"))
}

fn float_regex() -> &'static Regex {
    FLOAT_REGEX.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid float regex"))
}

/// Parse a form body into a mapping of coerced values.
pub(super) fn parse_form(raw: &str) -> Result<Value, BodyError> {
    if !raw.contains('=') {
        return Err(BodyError::InvalidForm);
    }

    let mut fields = Map::new();
    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        fields.insert(decode(key).into_owned(), coerce(&decode(value)));
    }
    Ok(Value::Object(fields))
}

/// Coerce a form value: integer, then float, then boolean, else string.
pub(super) fn coerce(value: &str) -> Value {
    if integer_regex().is_match(value) {
        if let Ok(n) = value.parse::<i64>() {
            return Value::Number(n.into());
        }
        // Too wide for i64, keep the magnitude as a float.
        if let Some(n) = value.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }
    if float_regex().is_match(value) {
        if let Some(n) = value.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }
    if value.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(value.to_string())
}

/// Percent-decode a form component; `+` stands for a space.
/// Invalid encodings are kept verbatim.
fn decode(component: &str) -> Cow<'_, str> {
    let spaced = if component.contains('+') {
        Cow::Owned(component.replace('+', " "))
    } else {
        Cow::Borrowed(component)
    };
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Owned(spaced.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_form_coerces_values() {
        let raw = "userId=123&name=john&lastName=doe&credit=10.45&balance=-456.78&\
                   temperature=-10&observation=&cpf=111.222.333-44&married=true&hasChildren=FALSE";
        let parsed = parse_form(raw).unwrap();
        assert_eq!(
            parsed,
            json!({
                "userId": 123,
                "name": "john",
                "lastName": "doe",
                "credit": 10.45,
                "balance": -456.78,
                "temperature": -10,
                "observation": "",
                "cpf": "111.222.333-44",
                "married": true,
                "hasChildren": false
            })
        );
    }

    #[test]
    fn test_parse_form_splits_on_first_equals() {
        let parsed = parse_form("token=a=b&flag").unwrap();
        assert_eq!(parsed, json!({"token": "a=b", "flag": ""}));
    }

    #[test]
    fn test_parse_form_decodes_components() {
        let parsed = parse_form("full+name=John%20Doe&city=S%C3%A3o+Paulo").unwrap();
        assert_eq!(parsed, json!({"full name": "John Doe", "city": "São Paulo"}));
    }

    #[test]
    fn test_parse_form_without_pairs_is_rejected() {
        assert!(matches!(parse_form("just some text"), Err(BodyError::InvalidForm)));
        assert!(matches!(parse_form(""), Err(BodyError::InvalidForm)));
    }

    #[test]
    fn test_coerce_wide_integer_falls_back_to_float() {
        let value = coerce("123456789012345678901234567890");
        assert!(value.is_f64());
    }

    #[test]
    fn test_coerce_leaves_near_numbers_as_strings() {
        assert_eq!(coerce("1.2.3"), json!("1.2.3"));
        assert_eq!(coerce(".5"), json!(".5"));
        assert_eq!(coerce("12abc"), json!("12abc"));
        assert_eq!(coerce("yes"), json!("yes"));
    }
}
