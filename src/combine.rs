//! Merging relative configurations under one base URL.

use crate::matcher::{url_join, Matcher, MatcherKind};
use crate::model::{Configuration, ResponseEntry};
use tracing::debug;

/// Combine configurations declared with relative URLs into one rooted at
/// `base_url`.
///
/// For each configuration, in order, its response entries are appended as
/// predicates first, then path templates, then regexes, keeping the declared
/// order within each kind. Path templates are rewritten to absolute ones:
/// `base_url` + configuration URL + template without its trailing slash.
///
/// Request entries are not combined; the result never carries any.
pub fn combine(base_url: &str, configurations: &[Configuration]) -> Configuration {
    let mut root = Configuration::new(base_url);

    for configuration in configurations {
        let responses = &configuration.interceptors.responses;

        let predicates = of_kind(responses, MatcherKind::Predicate).cloned();
        let paths = of_kind(responses, MatcherKind::Path).map(|entry| ResponseEntry {
            matcher: rebase(base_url, &configuration.url, &entry.matcher),
            ..entry.clone()
        });
        let regexes = of_kind(responses, MatcherKind::Regex).cloned();

        root.interceptors
            .responses
            .extend(predicates.chain(paths).chain(regexes));

        debug!(
            base_url,
            url = %configuration.url,
            responses = responses.len(),
            skipped_requests = configuration.interceptors.requests.len(),
            "Combined configuration"
        );
    }

    root
}

fn of_kind(
    entries: &[ResponseEntry],
    kind: MatcherKind,
) -> impl Iterator<Item = &ResponseEntry> {
    entries
        .iter()
        .filter(move |entry| entry.matcher.kind() == kind)
}

fn rebase<S>(base_url: &str, url: &str, matcher: &Matcher<S>) -> Matcher<S> {
    match matcher {
        Matcher::Path(template) => {
            let template = template.strip_suffix('/').unwrap_or(template);
            Matcher::Path(url_join(base_url, &url_join(url, template)))
        }
        other => other.clone(),
    }
}
