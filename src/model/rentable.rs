//! Root aggregate: a rentable item, its availability, and optionally its parts.

use crate::model::availability::{Availability, AvailabilityCreate};
use crate::model::part::{Part, PartCreate};
use crate::model::variant::check_name_and_description;
use crate::patch::{Patch, PatchSet};
use crate::validation::{Report, Validate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const RENTABLE_FIELDS: &[&str] = &["name", "description", "has_parts"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rentable {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub availability: Availability,
    pub has_parts: bool,
    pub parts: Option<Vec<Part>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentableCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub availability: Option<AvailabilityCreate>,
    pub has_parts: bool,
    #[serde(default)]
    pub parts: Option<Vec<PartCreate>>,
}

/// Partial update. `parts` are appended to the existing ones.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RentableUpdate {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub has_parts: Patch<bool>,
    #[serde(default)]
    pub parts: Patch<Vec<PartCreate>>,
}

/// `has_parts` requires a non-empty list. The reverse direction is not checked.
fn check_has_parts<T: Validate>(r: &mut Report, has_parts: bool, parts: Option<&[T]>) {
    if has_parts {
        match parts {
            None => r.fail("parts", "If has_parts, parts must exist."),
            Some([]) => r.fail("parts", "If has_parts, parts may not be empty array."),
            Some(_) => {}
        }
    }
    if let Some(ps) = parts {
        r.children("parts", ps);
    }
}

impl Validate for Rentable {
    const ENTITY: &'static str = "Rentable";

    fn check(&self, r: &mut Report) {
        check_name_and_description(r, &self.name, self.description.as_deref());
        r.child("availability", &self.availability);
        check_has_parts(r, self.has_parts, self.parts.as_deref());
    }
}

impl Validate for RentableCreate {
    const ENTITY: &'static str = "Rentable";

    fn check(&self, r: &mut Report) {
        check_name_and_description(r, &self.name, self.description.as_deref());
        if let Some(a) = &self.availability {
            r.child("availability", a);
        }
        check_has_parts(r, self.has_parts, self.parts.as_deref());
    }
}

impl Validate for RentableUpdate {
    const ENTITY: &'static str = "RentableUpdate";

    fn check(&self, r: &mut Report) {
        if let Some(n) = self.name.as_value() {
            r.text("name", n, 1, 32);
        }
        if let Some(d) = self.description.as_value() {
            r.text("description", d, 1, 255);
        }
        match self.parts.as_value() {
            Some(ps) if ps.is_empty() => {
                if self.has_parts.as_value() == Some(&true) {
                    r.fail("parts", "If has_parts, parts may not be empty array.");
                } else {
                    r.fail("parts", "parts may not be empty array.");
                }
            }
            Some(ps) => r.children("parts", ps),
            None => {
                if self.has_parts.as_value() == Some(&true) {
                    r.fail("parts", "If has_parts, parts must exist.");
                }
            }
        }
        if self.has_parts.as_value() == Some(&false) && self.parts.as_value().is_some() {
            r.fail("parts", "parts cannot be added while setting has_parts to false.");
        }
        if self.name.as_value().is_none()
            && self.description.is_unset()
            && self.has_parts.as_value().is_none()
            && self.parts.as_value().is_none()
        {
            r.fail_entity("update contains no changes, rejected.");
        }
    }
}

impl RentableUpdate {
    pub fn patch_set(&self) -> PatchSet {
        let mut set = PatchSet::new();
        set.insert("name".into(), self.name.clone().null_as_unset().into_json());
        set.insert("description".into(), self.description.clone().into_json());
        set.insert("has_parts".into(), self.has_parts.clone().null_as_unset().into_json());
        set
    }
}
