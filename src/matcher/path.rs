//! Path template matching.
//!
//! Templates are literal paths where `:name` segments match any single
//! segment, e.g. `https://swapi.co/api/people/:id`. They are joined onto the
//! configuration's base URL before being compiled.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

/// Leading protocol such as `https:` or `https:///`.
static PROTOCOL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^/:]+):/*").expect("valid protocol regex"));

/// A component that is nothing but a protocol, e.g. `https://`.
static BARE_PROTOCOL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/:]+:/*$").expect("valid protocol regex"));

/// Compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    template: String,
    regex: Regex,
    /// Parameter names, in capture group order
    params: Vec<String>,
}

impl PathTemplate {
    /// Compile a template into an anchored, case-insensitive regex.
    ///
    /// A `:name` parameter must start with a letter or underscore, so ports
    /// like `localhost:8080` stay literal. A parameter directly after `/` or
    /// `.` owns that delimiter, which lets `:name?` make the whole segment
    /// optional. A trailing slash on the matched URL is always allowed.
    pub fn compile(template: &str) -> Result<Self, regex::Error> {
        let mut pattern = String::from("(?i)^");
        let mut params = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            let starts_param = c == ':'
                && chars
                    .peek()
                    .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_');
            if !starts_param {
                literal.push(c);
                continue;
            }

            let mut name = String::new();
            while let Some(&n) = chars.peek() {
                if n.is_ascii_alphanumeric() || n == '_' {
                    name.push(n);
                    chars.next();
                } else {
                    break;
                }
            }
            let optional = chars.next_if_eq(&'?').is_some();

            let prefix = match literal.chars().last() {
                Some(p @ ('/' | '.')) => {
                    literal.pop();
                    Some(p)
                }
                _ => None,
            };
            pattern.push_str(&regex::escape(&literal));
            literal.clear();

            let delimiter = regex::escape(&prefix.unwrap_or('/').to_string());
            let capture = format!("([^{delimiter}]+?)");
            let group = match prefix {
                Some(p) => format!("(?:{}{capture})", regex::escape(&p.to_string())),
                None => format!("(?:{capture})"),
            };
            pattern.push_str(&group);
            if optional {
                pattern.push('?');
            }
            params.push(name);
        }

        pattern.push_str(&regex::escape(literal.trim_end_matches('/')));
        pattern.push_str("/?$");

        Ok(Self {
            template: template.to_string(),
            regex: Regex::new(&pattern)?,
            params,
        })
    }

    /// The template this was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Check whether `url` matches the template.
    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    /// Match `url` and return its parameter values.
    ///
    /// Repeated parameter names keep the last value.
    pub fn captures(&self, url: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(url)?;
        let values = self
            .params
            .iter()
            .zip(caps.iter().skip(1))
            .filter_map(|(name, m)| m.map(|m| (name.clone(), m.as_str().to_string())))
            .collect();
        Some(values)
    }
}

/// Check whether `s` is a complete URL with a host.
pub fn is_absolute_url(s: &str) -> bool {
    Url::parse(s).is_ok_and(|url| url.has_host())
}

/// Join a base URL and a path.
///
/// Components are separated by exactly one slash and the protocol keeps its
/// `://`. An absolute `path` is returned normalized, ignoring `base`.
pub fn url_join(base: &str, path: &str) -> String {
    if is_absolute_url(path) {
        normalize(vec![path.to_string()])
    } else {
        normalize(vec![base.to_string(), path.to_string()])
    }
}

fn normalize(mut parts: Vec<String>) -> String {
    if parts.is_empty() {
        return String::new();
    }

    if parts.len() > 1 && BARE_PROTOCOL_REGEX.is_match(&parts[0]) {
        let protocol = parts.remove(0);
        parts[0] = protocol + &parts[0];
    }

    let slashes = if parts[0].starts_with("file:///") {
        "$1:///"
    } else {
        "$1://"
    };
    parts[0] = PROTOCOL_REGEX.replace(&parts[0], slashes).into_owned();

    let last = parts.len() - 1;
    let joined = parts
        .iter()
        .enumerate()
        .filter(|(_, component)| !component.is_empty())
        .map(|(i, component)| {
            let mut component = component.as_str();
            if i > 0 {
                component = component.trim_start_matches('/');
            }
            let trimmed = component.trim_end_matches('/');
            if i == last && trimmed.len() != component.len() {
                format!("{trimmed}/")
            } else {
                trimmed.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    // Drop the slash left in front of a query or fragment
    let joined = joined
        .replace("/?", "?")
        .replace("/&", "&")
        .replace("/#", "#");

    match joined.split_once('?') {
        Some((head, query)) => format!("{head}?{}", query.replace('?', "&")),
        None => joined,
    }
}
