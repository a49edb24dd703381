//! Standalone stock items: a name, an optional description, and one availability row.

use crate::model::availability::Availability;
use crate::model::variant::check_name_and_description;
use crate::patch::{Patch, PatchSet};
use crate::validation::{Report, Validate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ITEM_FIELDS: &[&str] = &["name", "description"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub availability: Availability,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `null` name means "no change"; `null` description clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
}

impl Validate for Item {
    const ENTITY: &'static str = "Item";

    fn check(&self, r: &mut Report) {
        check_name_and_description(r, &self.name, self.description.as_deref());
        r.child("availability", &self.availability);
    }
}

impl Validate for ItemCreate {
    const ENTITY: &'static str = "Item";

    fn check(&self, r: &mut Report) {
        check_name_and_description(r, &self.name, self.description.as_deref());
    }
}

impl Validate for ItemUpdate {
    const ENTITY: &'static str = "ItemUpdate";

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

impl ItemUpdate {
    pub fn patch_set(&self) -> PatchSet {
        let mut set = PatchSet::new();
        set.insert("name".into(), self.name.clone().null_as_unset().into_json());
        set.insert("description".into(), self.description.clone().into_json());
        set
    }
}
