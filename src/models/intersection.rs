use serde::{Deserialize, Serialize};

/// Persisted pair of fields whose facet values are cross-tabulated.
///
/// The pair is directional: `(a, b)` and `(b, a)` are distinct trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetIntersection {
    /// Store-assigned identifier (0 until persisted)
    #[serde(default)]
    pub id: u64,

    /// Identifier of the first-level field
    pub field1_id: u64,

    /// Identifier of the second-level field
    pub field2_id: u64,
}

impl FacetIntersection {
    pub fn new(field1_id: u64, field2_id: u64) -> Self {
        Self {
            id: 0,
            field1_id,
            field2_id,
        }
    }
}

/// A facet intersection resolved against the current field set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetPair {
    pub id: u64,
    pub field1: String,
    pub field2: String,
}

impl FacetPair {
    /// Name under which the engine reports the two-level tree
    pub fn pair_name(&self) -> String {
        format!("{},{}", self.field1, self.field2)
    }
}
