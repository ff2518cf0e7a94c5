//! Stage catalog - the fixed workflow every line item passes through
//!
//! Stages advance strictly in catalog order; `Completed` is terminal and has
//! no outgoing transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow stage of a line item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Stage {
    Material,
    Manufacturing,
    Packaging,
    Dispatch,
    Completed,
}

impl Stage {
    /// Catalog order, first to terminal
    pub const ALL: [Stage; 5] = [
        Stage::Material,
        Stage::Manufacturing,
        Stage::Packaging,
        Stage::Dispatch,
        Stage::Completed,
    ];

    /// The stage every item starts in
    pub fn first() -> Stage {
        Stage::Material
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Material => "Material",
            Stage::Manufacturing => "Manufacturing",
            Stage::Packaging => "Packaging",
            Stage::Dispatch => "Dispatch",
            Stage::Completed => "Completed",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Stage> {
        match s.to_lowercase().as_str() {
            "material" => Some(Stage::Material),
            "manufacturing" => Some(Stage::Manufacturing),
            "packaging" => Some(Stage::Packaging),
            "dispatch" => Some(Stage::Dispatch),
            "completed" => Some(Stage::Completed),
            _ => None,
        }
    }

    /// Next stage in the catalog, or `None` from the terminal stage
    pub fn successor(&self) -> Option<Stage> {
        match self {
            Stage::Material => Some(Stage::Manufacturing),
            Stage::Manufacturing => Some(Stage::Packaging),
            Stage::Packaging => Some(Stage::Dispatch),
            Stage::Dispatch => Some(Stage::Completed),
            Stage::Completed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
