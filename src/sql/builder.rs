//! Builds parameterized partial UPDATE statements from a field whitelist.

use crate::patch::{Patch, PatchSet};
use crate::validation::{Violation, Violations};
use serde_json::Value;

/// Per-field value hook applied before binding. Returning `Err` rejects the update.
pub type FieldTransform<'a> = &'a (dyn Fn(&str, Value) -> Result<Value, String> + Send + Sync);

/// Quote identifier for PostgreSQL (safe: only from code).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

pub struct PatchOptions<'a> {
    pub table_name: &'a str,
    pub id_column: &'a str,
    /// Columns that may be updated, in the order they appear in the SET clause.
    pub allowed_fields: &'a [&'a str],
    pub transform: Option<FieldTransform<'a>>,
}

impl<'a> PatchOptions<'a> {
    pub fn new(table_name: &'a str, allowed_fields: &'a [&'a str]) -> Self {
        PatchOptions {
            table_name,
            id_column: "id",
            allowed_fields,
            transform: None,
        }
    }

    pub fn id_column(mut self, id_column: &'a str) -> Self {
        self.id_column = id_column;
        self
    }

    pub fn transform(mut self, transform: FieldTransform<'a>) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// UPDATE by id: SET only allowed columns whose update is not `Unset`.
/// `Null` binds SQL NULL and skips the transform. Returns `None` when nothing qualifies.
pub fn build_patch_query(
    id: &Value,
    updates: &PatchSet,
    options: &PatchOptions<'_>,
) -> Result<Option<QueryBuf>, Violations> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    let mut rejected = Vec::new();
    for &field in options.allowed_fields {
        let value = match updates.get(field) {
            None | Some(Patch::Unset) => continue,
            Some(Patch::Null) => Value::Null,
            Some(Patch::Value(v)) => match options.transform {
                Some(f) => match f(field, v.clone()) {
                    Ok(v) => v,
                    Err(msg) => {
                        rejected.push(Violation::new(options.table_name, field, msg));
                        continue;
                    }
                },
                None => v.clone(),
            },
        };
        let param_num = q.push_param(value);
        sets.push(format!("{} = ${}", quoted(field), param_num));
    }
    if !rejected.is_empty() {
        return Err(Violations(rejected));
    }
    if sets.is_empty() {
        return Ok(None);
    }
    let id_param = q.push_param(id.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING *",
        quoted(options.table_name),
        sets.join(", "),
        quoted(options.id_column),
        id_param
    );
    Ok(Some(q))
}

/// Transform that trims surrounding whitespace from string values. A string that trims to
/// nothing is rejected.
pub fn trim_strings(field: &str, value: Value) -> Result<Value, String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(format!("{} must contain at least one character.", field));
            }
            Ok(Value::String(trimmed.to_string()))
        }
        other => Ok(other),
    }
}
