use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

define_index_newtype!(VehicleIdx, Vehicle);

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Vehicle {
    name: String,
    capacity: f64,
}

impl Vehicle {
    pub fn new(name: impl Into<String>, capacity: f64) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upper bound of the total weight carried on one route.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn can_carry(&self, weight: f64) -> bool {
        weight <= self.capacity
    }
}
