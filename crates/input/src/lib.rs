//! Controls: host pointer and wheel events mapped to an orbiting camera goal.
//!
//! # Invariants
//! - Input only moves the goal; the render loop owns camera motion.
//! - The damping factor stays within `[0, 1)`.
//! - The polar angle never reaches a pole.

pub mod event;
pub mod orbit;

pub use event::{PointerButton, PointerEvent};
pub use orbit::{ControlsError, ControlsState, OrbitControls, Spherical};

pub fn crate_info() -> &'static str {
    "orbitview-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
