//! Three-state field for partial updates: absent, explicit null, or a value.
//!
//! Request structs mark every `Patch<T>` field with `#[serde(default)]` so a missing key
//! deserializes to [`Patch::Unset`] while `null` deserializes to [`Patch::Null`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Patch<T> {
    /// Key absent from the request: leave the column alone.
    Unset,
    /// Explicit `null`.
    Null,
    Value(T),
}

/// Candidate column updates keyed by column name, fed to the patch query builder.
pub type PatchSet = HashMap<String, Patch<Value>>;

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unset
    }
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Patch::Null)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }

    /// For NOT NULL columns: an explicit null means "no change".
    pub fn null_as_unset(self) -> Self {
        match self {
            Patch::Null => Patch::Unset,
            other => other,
        }
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Unset => Patch::Unset,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(v),
        }
    }
}

impl<T: Into<Value>> Patch<T> {
    pub fn into_json(self) -> Patch<Value> {
        match self {
            Patch::Unset => Patch::Unset,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(v.into()),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

/// `Unset` serializes as null; pair with `skip_serializing_if = "Patch::is_unset"` to omit it.
impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Value(v) => v.serialize(serializer),
            Patch::Unset | Patch::Null => serializer.serialize_none(),
        }
    }
}
