//! URL template compilation.
//!
//! A template such as `/users/{id}/addr/{cep}` compiles into the pattern
//! `(/+users/+([^/]+)/+addr/+([^/]+))` plus the ordered parameter names
//! `["id", "cep"]`. The whole expression is wrapped in one outer group, so
//! the value bound to `param_names[i]` is always capture group `i + 2`.
//!
//! Slashes compile to `/+`, which keeps inbound URLs with duplicated slashes
//! matching their template.

use regex::Regex;
use std::sync::Arc;

/// Normalize a URL or template path.
///
/// Collapses runs of slashes, drops a `?query` suffix and strips one trailing
/// slash. The root path `/` sanitizes to the empty string.
pub fn sanitize(url: &str) -> String {
    let path = match url.find('?') {
        Some(pos) => &url[..pos],
        None => url,
    };

    let mut sanitized = String::with_capacity(path.len());
    let mut previous_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        sanitized.push(ch);
    }

    if sanitized.ends_with('/') {
        sanitized.pop();
    }
    sanitized
}

/// Compiled URL template: a regex pattern plus its ordered placeholder names.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: String,
    regex: Arc<Regex>,
    param_names: Vec<String>,
}

impl UrlMatcher {
    /// Compile a path template.
    pub fn compile(template: &str) -> Result<Self, regex::Error> {
        let sanitized = sanitize(template);
        let mut pattern = String::with_capacity(sanitized.len() * 2 + 2);
        let mut param_names = Vec::new();
        let mut literal = String::new();

        pattern.push('(');
        let mut rest = sanitized.as_str();
        while let Some(ch) = rest.chars().next() {
            match ch {
                '/' => {
                    flush_literal(&mut pattern, &mut literal);
                    pattern.push_str("/+");
                    rest = &rest[1..];
                }
                '{' => match placeholder_name(rest) {
                    Some(name) => {
                        flush_literal(&mut pattern, &mut literal);
                        pattern.push_str("([^/]+)");
                        param_names.push(name.to_string());
                        // name plus both braces
                        rest = &rest[name.len() + 2..];
                    }
                    None => {
                        literal.push('{');
                        rest = &rest[1..];
                    }
                },
                _ => {
                    literal.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }
        flush_literal(&mut pattern, &mut literal);
        pattern.push(')');

        let regex = Regex::new(&format!("^{pattern}$"))?;
        Ok(Self {
            pattern,
            regex: Arc::new(regex),
            param_names,
        })
    }

    /// The unanchored pattern, outer group included.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Placeholder names in left-to-right order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Check whether a sanitized path fully matches this template.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Number of capture groups, outer group included.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Build the lookup key regex for this template under an HTTP method.
    pub fn route_key(&self, method: &str) -> Result<RouteKey, regex::Error> {
        let regex = Regex::new(&format!("^{}{}$", regex::escape(method), self.pattern))?;
        Ok(RouteKey {
            regex: Arc::new(regex),
        })
    }
}

/// Lookup key of an operation: the method name followed by its compiled
/// template pattern. Operations that differ only by method never collide.
///
/// Capture group numbering is the same as in the [`UrlMatcher`] it was built
/// from, because the method prefix adds no group.
#[derive(Debug, Clone)]
pub struct RouteKey {
    regex: Arc<Regex>,
}

impl RouteKey {
    /// Check `method + sanitized_url` against the key.
    pub fn matches(&self, method: &str, sanitized_url: &str) -> bool {
        self.regex.is_match(&format!("{method}{sanitized_url}"))
    }

    /// Capture groups of `method + sanitized_url`, if it matches.
    pub fn captures(&self, method: &str, sanitized_url: &str) -> Option<Vec<Option<String>>> {
        let subject = format!("{method}{sanitized_url}");
        self.regex.captures(&subject).map(|caps| {
            caps.iter()
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect()
        })
    }
}

/// Name of the `{name}` placeholder at the start of `rest`, if well formed.
fn placeholder_name(rest: &str) -> Option<&str> {
    let body = rest.strip_prefix('{')?;
    let end = body.find('}')?;
    let name = &body[..end];
    if name.is_empty() || name.contains(['/', '{']) {
        return None;
    }
    Some(name)
}

fn flush_literal(pattern: &mut String, literal: &mut String) {
    if !literal.is_empty() {
        pattern.push_str(&regex::escape(literal));
        literal.clear();
    }
}
