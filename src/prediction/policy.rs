//! Boundary handling for motion-compensated prediction.

use serde::{Deserialize, Serialize};

/// What the predictor does with blocks near the frame edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Copy a block only if both it and its displaced source lie fully
    /// inside the frame; otherwise leave the region zero.
    RejectAtEdge,
    /// Clamp the displaced source into the frame per axis and zero-pad
    /// whatever part of the source block is unavailable.
    #[default]
    ClampAndPad,
}

impl BoundaryPolicy {
    /// Every policy, in declaration order.
    pub const ALL: [BoundaryPolicy; 2] = [BoundaryPolicy::RejectAtEdge, BoundaryPolicy::ClampAndPad];
}

impl std::fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryPolicy::RejectAtEdge => f.write_str("reject_at_edge"),
            BoundaryPolicy::ClampAndPad => f.write_str("clamp_and_pad"),
        }
    }
}

impl std::str::FromStr for BoundaryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject_at_edge" | "reject" => Ok(BoundaryPolicy::RejectAtEdge),
            "clamp_and_pad" | "clamp" => Ok(BoundaryPolicy::ClampAndPad),
            other => Err(format!("unknown boundary policy: {}", other)),
        }
    }
}
