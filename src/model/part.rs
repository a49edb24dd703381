//! Components of a rentable: fixed parts carry their own availability, interchangeable parts
//! are realized through variants.

use crate::model::availability::{Availability, AvailabilityCreate, AvailabilityUpdate};
use crate::model::variant::{check_name_and_description, PartVariant, PartVariantCreate};
use crate::patch::{Patch, PatchSet};
use crate::validation::{Report, Validate, Violation, Violations};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PART_FIELDS: &[&str] = &["name", "description", "quantity", "interchangeable"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub rentable_id: Uuid,
    pub interchangeable: bool,
    pub availability: Option<Availability>,
    pub variants: Option<Vec<PartVariant>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: i32,
    /// Required for a standalone create; set by the parent when nested in a rentable.
    #[serde(default)]
    pub rentable_id: Option<Uuid>,
    #[serde(default)]
    pub interchangeable: bool,
    /// For a fixed part, `null` provisions zeroed counters.
    #[serde(default)]
    pub availability: Option<AvailabilityCreate>,
    #[serde(default)]
    pub variants: Option<Vec<PartVariantCreate>>,
}

/// Partial update. `null` on `name`, `quantity`, `interchangeable`, `availability` or
/// `variants` means "no change"; `null` on `description` clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PartUpdate {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub quantity: Patch<i32>,
    #[serde(default)]
    pub interchangeable: Patch<bool>,
    /// Counters omitted here keep their stored value; a part turning fixed starts from zero.
    #[serde(default)]
    pub availability: Patch<AvailabilityUpdate>,
    /// Replaces every existing variant.
    #[serde(default)]
    pub variants: Patch<Vec<PartVariantCreate>>,
}

fn check_variants<T: Validate>(r: &mut Report, variants: Option<&[T]>) {
    match variants {
        None => r.fail("variants", "If interchangeable, variants must exist."),
        Some([]) => r.fail("variants", "If interchangeable, variants may not be empty array."),
        Some(vs) => r.children("variants", vs),
    }
}

impl Validate for Part {
    const ENTITY: &'static str = "Part";

    fn check(&self, r: &mut Report) {
        check_name_and_description(r, &self.name, self.description.as_deref());
        r.positive("quantity", self.quantity);
        if self.interchangeable {
            if self.availability.is_some() {
                r.fail("availability", "If interchangeable, availability must be null.");
            }
            check_variants(r, self.variants.as_deref());
        } else {
            match &self.availability {
                Some(a) => r.child("availability", a),
                None => r.fail("availability", "If not interchangeable, availability must exist."),
            }
            if self.variants.is_some() {
                r.fail("variants", "If not interchangeable, variants must be null.");
            }
        }
    }
}

impl Validate for PartCreate {
    const ENTITY: &'static str = "Part";

    fn check(&self, r: &mut Report) {
        check_name_and_description(r, &self.name, self.description.as_deref());
        r.positive("quantity", self.quantity);
        if self.interchangeable {
            if self.availability.is_some() {
                r.fail("availability", "If interchangeable, availability must be null.");
            }
            check_variants(r, self.variants.as_deref());
        } else {
            if let Some(a) = &self.availability {
                r.child("availability", a);
            }
            if self.variants.is_some() {
                r.fail("variants", "If not interchangeable, variants must be null.");
            }
        }
    }
}

impl PartCreate {
    pub fn require_rentable_id(&self) -> Result<Uuid, Violations> {
        self.rentable_id.ok_or_else(|| {
            Violations::single(Violation::new(Self::ENTITY, "rentable_id", "rentable_id is required."))
        })
    }
}

impl Validate for PartUpdate {
    const ENTITY: &'static str = "PartUpdate";

    fn check(&self, r: &mut Report) {
        if let Some(n) = self.name.as_value() {
            r.text("name", n, 1, 32);
        }
        if let Some(d) = self.description.as_value() {
            r.text("description", d, 1, 255);
        }
        if let Some(q) = self.quantity.as_value() {
            r.positive("quantity", *q);
        }
        match self.interchangeable.as_value() {
            Some(true) => {
                if self.availability.as_value().is_some() {
                    r.fail("availability", "If interchangeable, availability must be null.");
                }
                check_variants(r, self.variants.as_value().map(Vec::as_slice));
            }
            Some(false) => {
                if self.variants.as_value().is_some() {
                    r.fail("variants", "If not interchangeable, variants must be null.");
                }
                if let Some(a) = self.availability.as_value() {
                    r.child("availability", a);
                }
            }
            None => {
                if let Some(a) = self.availability.as_value() {
                    r.child("availability", a);
                }
                match self.variants.as_value() {
                    Some(vs) if vs.is_empty() => r.fail("variants", "variants may not be empty array."),
                    Some(vs) => r.children("variants", vs),
                    None => {}
                }
            }
        }
        if self.is_noop() {
            r.fail_entity("update contains no changes, rejected.");
        }
    }
}

impl PartUpdate {
    fn is_noop(&self) -> bool {
        self.name.as_value().is_none()
            && self.description.is_unset()
            && self.quantity.as_value().is_none()
            && self.interchangeable.as_value().is_none()
            && self.availability.as_value().map_or(true, AvailabilityUpdate::is_empty)
            && self.variants.as_value().is_none()
    }

    /// Column updates on the part row itself.
    pub fn patch_set(&self) -> PatchSet {
        let mut set = PatchSet::new();
        set.insert("name".into(), self.name.clone().null_as_unset().into_json());
        set.insert("description".into(), self.description.clone().into_json());
        set.insert("quantity".into(), self.quantity.clone().null_as_unset().into_json());
        set.insert(
            "interchangeable".into(),
            self.interchangeable.clone().null_as_unset().into_json(),
        );
        set
    }
}
