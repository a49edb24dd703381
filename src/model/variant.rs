//! Concrete realizations of an interchangeable part, each with its own stock counters.

use crate::model::availability::{Availability, AvailabilityCreate};
use crate::patch::{Patch, PatchSet};
use crate::validation::{Report, Validate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const VARIANT_FIELDS: &[&str] = &["name", "description"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartVariant {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub part_id: Uuid,
    pub availability: Availability,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartVariantCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `null` or absent provisions a zeroed availability row.
    #[serde(default)]
    pub availability: Option<AvailabilityCreate>,
}

/// `null` name means "no change"; `null` description clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PartVariantUpdate {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
}

/// Lengths are checked on the trimmed text, which is what create stores.
pub(crate) fn check_name_and_description(r: &mut Report, name: &str, description: Option<&str>) {
    r.text("name", name.trim(), 1, 32);
    if let Some(d) = description {
        r.text("description", d.trim(), 1, 255);
    }
}

impl Validate for PartVariant {
    const ENTITY: &'static str = "PartVariant";

    fn check(&self, r: &mut Report) {
        check_name_and_description(r, &self.name, self.description.as_deref());
        r.child("availability", &self.availability);
    }
}

impl Validate for PartVariantCreate {
    const ENTITY: &'static str = "PartVariant";

    fn check(&self, r: &mut Report) {
        check_name_and_description(r, &self.name, self.description.as_deref());
        if let Some(a) = &self.availability {
            r.child("availability", a);
        }
    }
}

impl Validate for PartVariantUpdate {
    const ENTITY: &'static str = "PartVariantUpdate";

    fn check(&self, r: &mut Report) {
        if let Some(n) = self.name.as_value() {
            r.text("name", n, 1, 32);
        }
        if let Some(d) = self.description.as_value() {
            r.text("description", d, 1, 255);
        }
        if self.name.as_value().is_none() && self.description.is_unset() {
            r.fail_entity("update contains no changes, rejected.");
        }
    }
}

impl PartVariantUpdate {
    pub fn patch_set(&self) -> PatchSet {
        let mut set = PatchSet::new();
        set.insert("name".into(), self.name.clone().null_as_unset().into_json());
        set.insert("description".into(), self.description.clone().into_json());
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_with_only_null_name_is_noop() {
        let u: PartVariantUpdate = serde_json::from_str(r#"{"name": null}"#).unwrap();
        let errs = u.validate().unwrap_err();
        assert_eq!(errs.0[0].message, "update contains no changes, rejected.");
    }

    #[test]
    fn clearing_description_is_a_change() {
        let u: PartVariantUpdate = serde_json::from_str(r#"{"description": null}"#).unwrap();
        let u = u.validate().unwrap();
        assert_eq!(u.patch_set().get("description"), Some(&Patch::Null));
        assert_eq!(u.patch_set().get("name"), Some(&Patch::Unset));
    }

    #[test]
    fn create_checks_nested_availability() {
        let v = PartVariantCreate {
            name: "Blue".into(),
            description: Some(String::new()),
            availability: Some(AvailabilityCreate {
                total: 1,
                maintenance: 1,
                broken: 1,
            }),
        };
        let errs = v.validate().unwrap_err();
        assert!(errs.has_path("description"));
        assert!(errs.has_path("availability"));
    }
}
