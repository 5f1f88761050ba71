//! HTTP verbs, including the `all` wildcard.

use std::fmt;
use std::str::FromStr;

use axum::routing::MethodFilter;
use serde::Serialize;

/// An HTTP method a route answers, or `All` for every method.
///
/// Variants are declared in name order so the derived ordering matches the
/// byte order of [`Verb::as_str`]; `All` therefore sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    All,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
}

/// Returned when a declared verb name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVerb(pub String);

impl Verb {
    pub const ALL: [Verb; 8] = [
        Verb::All,
        Verb::Delete,
        Verb::Get,
        Verb::Head,
        Verb::Options,
        Verb::Patch,
        Verb::Post,
        Verb::Put,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::All => "all",
            Verb::Delete => "delete",
            Verb::Get => "get",
            Verb::Head => "head",
            Verb::Options => "options",
            Verb::Patch => "patch",
            Verb::Post => "post",
            Verb::Put => "put",
        }
    }

    /// Whether requests with this verb may carry a payload that needs parsing.
    pub fn is_body_capable(&self) -> bool {
        matches!(
            self,
            Verb::All | Verb::Delete | Verb::Patch | Verb::Post | Verb::Put
        )
    }

    /// Whether two verbs claim at least one common method.
    pub fn overlaps(&self, other: &Verb) -> bool {
        *self == Verb::All || *other == Verb::All || self == other
    }

    /// The axum filter for this verb; `None` for `All`.
    pub fn method_filter(&self) -> Option<MethodFilter> {
        match self {
            Verb::All => None,
            Verb::Delete => Some(MethodFilter::DELETE),
            Verb::Get => Some(MethodFilter::GET),
            Verb::Head => Some(MethodFilter::HEAD),
            Verb::Options => Some(MethodFilter::OPTIONS),
            Verb::Patch => Some(MethodFilter::PATCH),
            Verb::Post => Some(MethodFilter::POST),
            Verb::Put => Some(MethodFilter::PUT),
        }
    }
}

impl FromStr for Verb {
    type Err = UnknownVerb;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Verb::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownVerb(s.to_string()))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
