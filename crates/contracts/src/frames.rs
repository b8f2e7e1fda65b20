//! TransformTree - reference-frame chain published alongside sensor data
//!
//! Receivers need the world → body → sensor-mount chain to place each
//! payload geometrically.

use serde::{Deserialize, Serialize};

use crate::Pose;

/// World frame name
pub const WORLD_FRAME: &str = "world";

/// Body frame name
pub const BODY_FRAME: &str = "body";

/// One parent → child edge in the frame tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformEdge {
    /// Parent frame
    pub parent: String,

    /// Child frame
    pub child: String,

    /// Child pose expressed in the parent frame
    pub transform: Pose,

    /// Static edges (sensor mounts) never change after setup;
    /// kinematic edges (world → body) update per publication
    pub is_static: bool,
}

/// The full frame chain for one publication
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformTree {
    pub edges: Vec<TransformEdge>,
}

impl TransformTree {
    /// Look up an edge by child frame
    pub fn edge_to(&self, child: &str) -> Option<&TransformEdge> {
        self.edges.iter().find(|e| e.child == child)
    }
}
