//! Route patterns and allow-lists.

use std::fmt;

use crate::{Role, RoleProfile};

/// Public pages of the console.
const PUBLIC_ROUTES: &[&str] = &[
    "/",
    "/products",
    "/products/:id",
    "/services",
    "/contact",
    "/about",
    "/blog",
    "/login",
    "/enquiry",
    "/enquiry/:productId",
    "/feedback/:id",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// A navigable path pattern.
///
/// Segments starting with `:` match any single segment. A trailing `/*`
/// matches the base path and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
    wildcard: bool,
}

impl RoutePattern {
    /// Parses a pattern such as `/admin/*` or `/products/:id`.
    pub fn parse(pattern: &str) -> Self {
        let mut parts = path_segments(pattern);
        let wildcard = parts.last().is_some_and(|part| part == "*");
        if wildcard {
            parts.pop();
        }

        let segments = parts
            .into_iter()
            .map(|part| {
                if part.starts_with(':') {
                    Segment::Param
                } else {
                    Segment::Literal(part)
                }
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
            wildcard,
        }
    }

    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Checks whether `path` falls under this pattern.
    ///
    /// Literal segments compare case-insensitively and dot segments are
    /// resolved first, so `/Admin/x` and `/salesman/../admin/x` both land
    /// under `/admin/*`.
    pub fn matches(&self, path: &str) -> bool {
        let parts = path_segments(path);

        let length_ok = if self.wildcard {
            parts.len() >= self.segments.len()
        } else {
            parts.len() == self.segments.len()
        };

        length_ok
            && self
                .segments
                .iter()
                .zip(parts)
                .all(|(segment, part)| match segment {
                    Segment::Literal(literal) => literal.eq_ignore_ascii_case(&part),
                    Segment::Param => true,
                })
    }

    /// Ordering key: more literal segments, then more segments, then exact
    /// before wildcard.
    fn specificity(&self) -> (usize, usize, bool) {
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        (literals, self.segments.len(), !self.wildcard)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Splits a path into non-empty segments, ignoring query and fragment.
///
/// Percent-escapes are decoded and `.`/`..` resolved. `..` at the root is
/// dropped.
fn path_segments(path: &str) -> Vec<String> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path).map_or_else(|_| path.into(), |d| d.into_owned());

    let mut segments: Vec<String> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            _ => segments.push(segment.to_string()),
        }
    }
    segments
}

/// A pattern and the roles allowed to render it.
#[derive(Debug, Clone)]
pub struct RouteRule {
    /// Path pattern.
    pub pattern: RoutePattern,
    /// Allowed roles. Empty means public.
    pub allow_list: Vec<Role>,
}

impl RouteRule {
    /// A rule anyone may render.
    pub fn public(pattern: &str) -> Self {
        Self {
            pattern: RoutePattern::parse(pattern),
            allow_list: Vec::new(),
        }
    }

    /// A rule restricted to `roles` (ADMIN is always added by the guard).
    pub fn restricted(pattern: &str, roles: &[Role]) -> Self {
        Self {
            pattern: RoutePattern::parse(pattern),
            allow_list: roles.to_vec(),
        }
    }

    /// Whether the rule carries no allow-list.
    pub fn is_public(&self) -> bool {
        self.allow_list.is_empty()
    }
}

/// Ordered collection of route rules.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Creates an empty table: every path is public.
    pub fn new() -> Self {
        Self::default()
    }

    /// The console's route table, derived from the role profiles.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for pattern in PUBLIC_ROUTES {
            table = table.with_rule(RouteRule::public(pattern));
        }

        let mut restricted: Vec<(&str, Vec<Role>)> = Vec::new();
        for profile in RoleProfile::all() {
            for pattern in profile.routes {
                match restricted.iter_mut().find(|(p, _)| p == pattern) {
                    Some((_, roles)) => roles.push(profile.role),
                    None => restricted.push((*pattern, vec![profile.role])),
                }
            }
        }

        for (pattern, roles) in restricted {
            table = table.with_rule(RouteRule::restricted(pattern, &roles));
        }
        table
    }

    /// Appends a rule.
    pub fn with_rule(mut self, rule: RouteRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// All rules in declaration order.
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Finds the most specific rule matching `path`. Ties go to the rule
    /// declared first.
    pub fn resolve(&self, path: &str) -> Option<&RouteRule> {
        let mut best: Option<&RouteRule> = None;
        for rule in self.rules.iter().filter(|r| r.pattern.matches(path)) {
            match best {
                Some(current) if current.pattern.specificity() >= rule.pattern.specificity() => {},
                _ => best = Some(rule),
            }
        }
        best
    }

    /// Allow-list for `path`. Unmatched paths have none.
    pub fn allow_list(&self, path: &str) -> &[Role] {
        self.resolve(path)
            .map(|rule| rule.allow_list.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `path` is one of the declared public pages.
    pub fn is_public_route(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(RouteRule::is_public)
    }
}
