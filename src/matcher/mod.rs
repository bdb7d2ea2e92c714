//! Request and response matchers.

mod path;

pub use path::{is_absolute_url, url_join, PathTemplate};

use crate::context::Payload;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Predicate over a full request or response.
pub type Predicate<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// Decides whether a transform applies to a request or response.
///
/// `S` is the subject the matcher inspects: [`RequestConfig`] for request
/// entries, [`Response`] for response entries.
///
/// [`RequestConfig`]: crate::context::RequestConfig
/// [`Response`]: crate::context::Response
pub enum Matcher<S> {
    /// Arbitrary predicate over the whole subject
    Predicate(Predicate<S>),
    /// Regular expression tested against the subject's URL
    Regex(Regex),
    /// Path template joined onto the configuration URL
    Path(String),
}

/// Kind of a matcher, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKind {
    Predicate,
    Regex,
    Path,
}

impl<S> Matcher<S> {
    /// Create a predicate matcher.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Create a regex matcher.
    pub fn regex(pattern: &str) -> Result<Self, MatcherError> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    /// Create a path template matcher.
    pub fn path(template: impl Into<String>) -> Self {
        Self::Path(template.into())
    }

    /// Classify this matcher.
    pub fn kind(&self) -> MatcherKind {
        match self {
            Self::Predicate(_) => MatcherKind::Predicate,
            Self::Regex(_) => MatcherKind::Regex,
            Self::Path(_) => MatcherKind::Path,
        }
    }
}

impl<S: Payload> Matcher<S> {
    /// Evaluate this matcher against a subject.
    ///
    /// Path templates are compiled on every call; transformers compile once
    /// through [`CompiledMatcher`] instead.
    pub fn evaluate(&self, base_url: &str, subject: &S) -> Result<MatchResult, MatcherError> {
        Ok(CompiledMatcher::compile(base_url, self)?.matches(subject))
    }
}

impl<S> Clone for Matcher<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Predicate(f) => Self::Predicate(Arc::clone(f)),
            Self::Regex(regex) => Self::Regex(regex.clone()),
            Self::Path(template) => Self::Path(template.clone()),
        }
    }
}

impl<S> fmt::Debug for Matcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            Self::Path(template) => f.debug_tuple("Path").field(template).finish(),
        }
    }
}

/// Predicates compare by identity, regexes by pattern.
impl<S> PartialEq for Matcher<S> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Predicate(a), Self::Predicate(b)) => Arc::ptr_eq(a, b),
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            (Self::Path(a), Self::Path(b)) => a == b,
            _ => false,
        }
    }
}

impl<S> From<&str> for Matcher<S> {
    fn from(template: &str) -> Self {
        Self::path(template)
    }
}

impl<S> From<String> for Matcher<S> {
    fn from(template: String) -> Self {
        Self::Path(template)
    }
}

impl<S> From<Regex> for Matcher<S> {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

/// Result of a match operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    /// Whether the match succeeded
    pub matched: bool,
    /// Path template parameters or named regex groups
    pub captures: HashMap<String, String>,
}

impl MatchResult {
    /// Create a successful match result.
    pub fn matched() -> Self {
        Self {
            matched: true,
            captures: HashMap::new(),
        }
    }

    /// Create a successful match result with captures.
    pub fn matched_with_captures(captures: HashMap<String, String>) -> Self {
        Self {
            matched: true,
            captures,
        }
    }

    /// Create a failed match result.
    pub fn not_matched() -> Self {
        Self::default()
    }
}

/// Matcher bound to a base URL, with its path template compiled.
pub enum CompiledMatcher<S> {
    /// Predicate, called as is
    Predicate(Predicate<S>),
    /// Regex tested against the subject's URL
    Regex(Regex),
    /// Template already joined onto the base URL
    Path(PathTemplate),
}

impl<S: Payload> CompiledMatcher<S> {
    /// Compile `matcher` against `base_url`.
    pub fn compile(base_url: &str, matcher: &Matcher<S>) -> Result<Self, MatcherError> {
        Ok(match matcher {
            Matcher::Predicate(f) => Self::Predicate(Arc::clone(f)),
            Matcher::Regex(regex) => Self::Regex(regex.clone()),
            Matcher::Path(template) => {
                Self::Path(PathTemplate::compile(&url_join(base_url, template))?)
            }
        })
    }

    /// Check whether the subject matches.
    ///
    /// Regex and path matchers never match a subject without a URL.
    pub fn matches(&self, subject: &S) -> MatchResult {
        match self {
            Self::Predicate(f) => {
                if f(subject) {
                    MatchResult::matched()
                } else {
                    MatchResult::not_matched()
                }
            }
            Self::Regex(regex) => match subject.effective_url() {
                Some(url) => match regex.captures(url) {
                    Some(caps) => {
                        let captures = regex
                            .capture_names()
                            .flatten()
                            .filter_map(|name| {
                                caps.name(name)
                                    .map(|m| (name.to_string(), m.as_str().to_string()))
                            })
                            .collect();
                        MatchResult::matched_with_captures(captures)
                    }
                    None => MatchResult::not_matched(),
                },
                None => MatchResult::not_matched(),
            },
            Self::Path(template) => {
                match subject
                    .effective_url()
                    .and_then(|url| template.captures(url))
                {
                    Some(captures) => MatchResult::matched_with_captures(captures),
                    None => MatchResult::not_matched(),
                }
            }
        }
    }

    /// Human readable description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Predicate(_) => "predicate".to_string(),
            Self::Regex(regex) => format!("regex {}", regex.as_str()),
            Self::Path(template) => format!("path {}", template.template()),
        }
    }
}

/// Errors that can occur during matcher compilation.
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RequestConfig, Response};
    use serde_json::json;

    fn make_response(url: &str, data: serde_json::Value) -> Response {
        Response::new(RequestConfig::new("GET", url), 200, data)
    }

    #[test]
    fn test_kind_classification() {
        let predicate: Matcher<Response> = Matcher::predicate(|_| true);
        let regex: Matcher<Response> = Matcher::regex("people$").unwrap();
        let path: Matcher<Response> = "/people/:id".into();

        assert_eq!(predicate.kind(), MatcherKind::Predicate);
        assert_eq!(regex.kind(), MatcherKind::Regex);
        assert_eq!(path.kind(), MatcherKind::Path);
    }

    #[test]
    fn test_path_match_joins_base_url() {
        let matcher: Matcher<Response> = Matcher::path("/people/:id");
        let base = "https://swapi.co/api";

        let result = matcher
            .evaluate(base, &make_response("https://swapi.co/api/people/1", json!({})))
            .unwrap();
        assert!(result.matched);
        assert_eq!(result.captures.get("id"), Some(&"1".to_string()));

        let result = matcher
            .evaluate(base, &make_response("https://swapi.co/api/planets/1", json!({})))
            .unwrap();
        assert!(!result.matched);
    }

    #[test]
    fn test_deeply_nested_path() {
        let matcher: Matcher<Response> = Matcher::path("/people/:id/starships/:id");
        let response = make_response("https://swapi.co/api/people/id/starships/id", json!({}));
        assert!(matcher.evaluate("https://swapi.co/api", &response).unwrap().matched);

        let shorter: Matcher<Response> = Matcher::path("/people/:id");
        assert!(!shorter.evaluate("https://swapi.co/api", &response).unwrap().matched);
    }

    #[test]
    fn test_regex_match_uses_request_url() {
        let matcher: Matcher<Response> =
            Matcher::regex(r"/people/(?P<id>\d+)$").unwrap();

        let result = matcher
            .evaluate("/", &make_response("https://swapi.co/api/people/42", json!({})))
            .unwrap();
        assert!(result.matched);
        assert_eq!(result.captures.get("id"), Some(&"42".to_string()));
    }

    #[test]
    fn test_missing_url_never_matches() {
        let mut request = RequestConfig::new("POST", "/people/1");
        request.url = None;

        let regex: Matcher<RequestConfig> = Matcher::regex(".*").unwrap();
        assert!(!regex.evaluate("/", &request).unwrap().matched);

        let path: Matcher<RequestConfig> = Matcher::path("/people/:id");
        assert!(!path.evaluate("/", &request).unwrap().matched);
    }

    #[test]
    fn test_predicate_sees_full_subject() {
        let matcher: Matcher<Response> =
            Matcher::predicate(|response: &Response| response.data["Operation"] == "people");

        let people = make_response("https://graphql.com/api", json!({"Operation": "people"}));
        let planets = make_response("https://graphql.com/api", json!({"Operation": "planets"}));

        assert!(matcher.evaluate("/", &people).unwrap().matched);
        assert!(!matcher.evaluate("/", &planets).unwrap().matched);
    }

    #[test]
    fn test_invalid_regex() {
        let result: Result<Matcher<Response>, _> = Matcher::regex("(unclosed");
        assert!(matches!(result, Err(MatcherError::InvalidRegex(_))));
    }

    #[test]
    fn test_matcher_equality() {
        let predicate: Matcher<Response> = Matcher::predicate(|_| true);
        assert_eq!(predicate, predicate.clone());
        assert_ne!(predicate, Matcher::<Response>::predicate(|_| true));
        assert_eq!(
            Matcher::<Response>::regex("a+").unwrap(),
            Matcher::regex("a+").unwrap()
        );
        assert_eq!(Matcher::<Response>::path("/a"), Matcher::<Response>::from("/a"));
    }
}
