//! Shared value types for orbitview crates.

mod types;

pub use types::{Color, NodeId, Transform};

pub fn crate_info() -> &'static str {
    "orbitview-common v0.1.0"
}
