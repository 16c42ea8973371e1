//! Dispatch rule table
//!
//! Every request is matched against one ordered list of rules; the first rule
//! whose request class and target both match decides the outcome. GET and HEAD
//! requests ("GET-class") and all other methods share the list, so the
//! method-specific behavior lives in each rule's class filter.

use hyper::Method;

/// Informational endpoint answered for every method
pub const INFO_PATH: &str = "/api";
/// Reserved prefix; unmapped paths under it are never served as static files
pub const RESERVED_PREFIX: &str = "/api";
/// Marker for requests owned by the API layer
pub const API_V1_MARKER: &str = "/api/v1";

/// Request class used by rule filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// GET and HEAD: navigations and plain asset fetches
    GetClass,
    /// Every other method
    Other,
}

impl RequestClass {
    pub fn of(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::HEAD {
            Self::GetClass
        } else {
            Self::Other
        }
    }
}

/// Which request classes a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassFilter {
    Any,
    Only(RequestClass),
}

impl ClassFilter {
    fn accepts(self, class: RequestClass) -> bool {
        match self {
            Self::Any => true,
            Self::Only(only) => only == class,
        }
    }
}

/// What part of the request a rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Path equals the value
    Path(&'static str),
    /// Path starts with the value
    PathPrefix(&'static str),
    /// Full request target (path and query) contains the value anywhere
    UrlContains(&'static str),
    /// Matches everything
    Any,
}

impl Target {
    fn matches(self, path: &str, url: &str) -> bool {
        match self {
            Self::Path(exact) => path == exact,
            Self::PathPrefix(prefix) => path.starts_with(prefix),
            Self::UrlContains(needle) => url.contains(needle),
            Self::Any => true,
        }
    }
}

/// Behavior when static resolution finds no file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnMiss {
    /// Serve the SPA entry document
    Fallback,
    NotFound,
}

/// Action taken by a matched rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Informational,
    Delegate,
    /// Reserved path with no handler
    Reject,
    Static { on_miss: OnMiss },
}

/// One entry of the dispatch table
#[derive(Debug)]
pub struct Rule {
    pub name: &'static str,
    pub class: ClassFilter,
    pub target: Target,
    pub action: Action,
}

/// The dispatch table, in priority order
pub static RULES: [Rule; 6] = [
    Rule {
        name: "info",
        class: ClassFilter::Any,
        target: Target::Path(INFO_PATH),
        action: Action::Informational,
    },
    // GET-class delegation is prefix based: `/assets/api/v1/x.js` stays static
    Rule {
        name: "api-v1",
        class: ClassFilter::Only(RequestClass::GetClass),
        target: Target::PathPrefix("/api/v1/"),
        action: Action::Delegate,
    },
    Rule {
        name: "api-v1-any-method",
        class: ClassFilter::Only(RequestClass::Other),
        target: Target::UrlContains(API_V1_MARKER),
        action: Action::Delegate,
    },
    Rule {
        name: "api-reserved",
        class: ClassFilter::Any,
        target: Target::PathPrefix(RESERVED_PREFIX),
        action: Action::Reject,
    },
    Rule {
        name: "spa",
        class: ClassFilter::Only(RequestClass::GetClass),
        target: Target::Any,
        action: Action::Static {
            on_miss: OnMiss::Fallback,
        },
    },
    // No SPA fallback for non-GET requests
    Rule {
        name: "static",
        class: ClassFilter::Only(RequestClass::Other),
        target: Target::Any,
        action: Action::Static {
            on_miss: OnMiss::NotFound,
        },
    },
];

/// Find the first rule matching a request
///
/// `path` is the URI path as received, `url` the full request target
/// including the query string.
pub fn match_rule(class: RequestClass, path: &str, url: &str) -> Option<&'static Rule> {
    RULES
        .iter()
        .find(|rule| rule.class.accepts(class) && rule.target.matches(path, url))
}
