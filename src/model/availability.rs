//! Stock counters attached one-to-one to a rentable, a fixed part, or a part variant.

use crate::patch::{Patch, PatchSet};
use crate::validation::{Report, Validate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Columns the availability PATCH may touch, in SET-clause order.
pub const AVAILABILITY_FIELDS: &[&str] = &["total", "maintenance", "broken"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Availability {
    pub id: Uuid,
    pub total: i32,
    pub maintenance: i32,
    pub broken: i32,
}

/// Client-supplied counters on create; omitted counters default to zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityCreate {
    #[serde(default)]
    pub total: i32,
    #[serde(default)]
    pub maintenance: i32,
    #[serde(default)]
    pub broken: i32,
}

/// Partial update. `null` and absent both mean "no change" for every counter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AvailabilityUpdate {
    #[serde(default)]
    pub total: Patch<i32>,
    #[serde(default)]
    pub maintenance: Patch<i32>,
    #[serde(default)]
    pub broken: Patch<i32>,
}

fn check_counters(r: &mut Report, total: i32, maintenance: i32, broken: i32) {
    r.non_negative("total", total);
    r.non_negative("maintenance", maintenance);
    r.non_negative("broken", broken);
    if i64::from(maintenance) + i64::from(broken) > i64::from(total) {
        r.fail_entity("maintenance + broken exceeds total.");
    }
}

impl Validate for Availability {
    const ENTITY: &'static str = "Availability";

    fn check(&self, r: &mut Report) {
        check_counters(r, self.total, self.maintenance, self.broken);
    }
}

impl Validate for AvailabilityCreate {
    const ENTITY: &'static str = "Availability";

    fn check(&self, r: &mut Report) {
        check_counters(r, self.total, self.maintenance, self.broken);
    }
}

impl AvailabilityCreate {
    /// All counters zero: the provisioned row already holds these values.
    pub fn is_zero(&self) -> bool {
        self.total == 0 && self.maintenance == 0 && self.broken == 0
    }

    pub fn patch_set(&self) -> PatchSet {
        [
            ("total", self.total),
            ("maintenance", self.maintenance),
            ("broken", self.broken),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Patch::Value(serde_json::Value::from(v))))
        .collect()
    }
}

impl Validate for AvailabilityUpdate {
    const ENTITY: &'static str = "AvailabilityUpdate";

    fn check(&self, r: &mut Report) {
        for (field, patch) in [
            ("total", &self.total),
            ("maintenance", &self.maintenance),
            ("broken", &self.broken),
        ] {
            if let Some(v) = patch.as_value() {
                r.non_negative(field, *v);
            }
        }
    }
}

impl AvailabilityUpdate {
    /// No counter carries a value.
    pub fn is_empty(&self) -> bool {
        self.total.as_value().is_none() && self.maintenance.as_value().is_none() && self.broken.as_value().is_none()
    }

    pub fn patch_set(&self) -> PatchSet {
        [
            ("total", &self.total),
            ("maintenance", &self.maintenance),
            ("broken", &self.broken),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone().null_as_unset().into_json()))
        .collect()
    }

    /// The row as it will look after the update.
    pub fn apply_to(&self, current: &Availability) -> Availability {
        Availability {
            id: current.id,
            total: self.total.as_value().copied().unwrap_or(current.total),
            maintenance: self.maintenance.as_value().copied().unwrap_or(current.maintenance),
            broken: self.broken.as_value().copied().unwrap_or(current.broken),
        }
    }
}
