//! Entity rule checking that collects every violation instead of stopping at the first.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// One failed rule: which entity, which field path (empty for entity-level rules), and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub entity: String,
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(entity: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Violation {
            entity: entity.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.entity, self.message)
        } else {
            write!(f, "{}: {}: {}", self.entity, self.path, self.message)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    pub fn single(v: Violation) -> Self {
        Violations(vec![v])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// True when some violation sits at `path` (exact match).
    pub fn has_path(&self, path: &str) -> bool {
        self.0.iter().any(|v| v.path == path)
    }

    /// Re-root every path under `segment`, for rules checked apart from their parent.
    pub fn under(self, segment: &str) -> Self {
        Violations(
            self.0
                .into_iter()
                .map(|mut v| {
                    v.path = if v.path.is_empty() {
                        segment.to_string()
                    } else {
                        format!("{}.{}", segment, v.path)
                    };
                    v
                })
                .collect(),
        )
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Accumulates violations while walking an entity and its children.
pub struct Report {
    entity: &'static str,
    prefix: Vec<String>,
    violations: Vec<Violation>,
}

impl Report {
    pub fn new(entity: &'static str) -> Self {
        Report {
            entity,
            prefix: Vec::new(),
            violations: Vec::new(),
        }
    }

    fn path_for(&self, field: &str) -> String {
        let mut segs: Vec<&str> = self.prefix.iter().map(String::as_str).collect();
        if !field.is_empty() {
            segs.push(field);
        }
        segs.join(".")
    }

    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        let path = self.path_for(field);
        self.violations.push(Violation::new(self.entity, path, message));
    }

    /// Entity-level rule (no single field to blame).
    pub fn fail_entity(&mut self, message: impl Into<String>) {
        self.fail("", message);
    }

    /// Check a nested entity under `segment`, reporting with the child's entity name.
    pub fn child<T: Validate>(&mut self, segment: impl Into<String>, value: &T) {
        let saved = std::mem::replace(&mut self.entity, T::ENTITY);
        self.prefix.push(segment.into());
        value.check(self);
        self.prefix.pop();
        self.entity = saved;
    }

    pub fn children<T: Validate>(&mut self, field: &str, values: &[T]) {
        for (i, v) in values.iter().enumerate() {
            self.child(format!("{}[{}]", field, i), v);
        }
    }

    /// Character-count bounds, inclusive.
    pub fn text(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            if min == 1 {
                self.fail(field, format!("{} must contain at least one character.", field));
            } else {
                self.fail(field, format!("{} must contain at least {} characters.", field, min));
            }
        }
        if len > max {
            self.fail(field, format!("{} exceeds limit of {} characters.", field, max));
        }
    }

    pub fn non_negative(&mut self, field: &str, value: i32) {
        if value < 0 {
            self.fail(field, format!("{} must be a non-negative integer.", field));
        }
    }

    pub fn positive(&mut self, field: &str, value: i32) {
        if value <= 0 {
            self.fail(field, format!("{} must be a positive integer.", field));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !is_valid_email(value) {
            self.fail(field, format!("{} must be a valid email address.", field));
        }
    }

    pub fn finish(self) -> Result<(), Violations> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(Violations(self.violations))
        }
    }
}

/// A request or response shape with invariants.
pub trait Validate: Sized {
    const ENTITY: &'static str;

    fn check(&self, report: &mut Report);

    fn validate(self) -> Result<Self, Violations> {
        let mut report = Report::new(Self::ENTITY);
        self.check(&mut report);
        report.finish().map(|_| self)
    }
}

pub fn is_valid_email(s: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").ok())
        .as_ref()
        .map(|re| re.is_match(s.trim()))
        .unwrap_or(false)
}
