use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

define_index_newtype!(StopIdx, Stop);

/// A delivery address and the cargo weight to drop there.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Stop {
    address: String,
    weight: f64,
}

impl Stop {
    pub fn new(address: impl Into<String>, weight: f64) -> Self {
        Self {
            address: address.into(),
            weight,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}
