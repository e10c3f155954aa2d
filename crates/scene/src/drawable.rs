//! Drawable payloads attached to scene nodes.
//!
//! All constructors validate their parameters so a bad capsule or light is
//! rejected while the scene is being built, not on the first frame.

use glam::Vec3;
use orbitview_common::Color;
use serde::{Deserialize, Serialize};

/// Errors from drawable construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DrawableError {
    #[error("capsule radius must be finite and > 0, got {0}")]
    InvalidRadius(f32),
    #[error("capsule length must be finite and >= 0, got {0}")]
    InvalidLength(f32),
    #[error("capsule needs at least 1 cap segment and 3 radial segments, got {cap}/{radial}")]
    TooFewSegments { cap: u32, radial: u32 },
    #[error("cuboid half extents must be finite and > 0, got {0:?}")]
    InvalidExtents([f32; 3]),
    #[error("material {name} must be within [0, 1], got {value}")]
    MaterialOutOfRange { name: &'static str, value: f32 },
    #[error("light {name} must be finite and >= 0, got {value}")]
    InvalidLight { name: &'static str, value: f32 },
}

/// A capsule aligned with the Y axis: a cylinder of `length` capped by two
/// hemispheres of `radius`. Total height is `length + 2 * radius`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapsuleGeometry {
    radius: f32,
    length: f32,
    cap_segments: u32,
    radial_segments: u32,
}

impl CapsuleGeometry {
    pub fn new(
        radius: f32,
        length: f32,
        cap_segments: u32,
        radial_segments: u32,
    ) -> Result<Self, DrawableError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(DrawableError::InvalidRadius(radius));
        }
        if !length.is_finite() || length < 0.0 {
            return Err(DrawableError::InvalidLength(length));
        }
        if cap_segments < 1 || radial_segments < 3 {
            return Err(DrawableError::TooFewSegments {
                cap: cap_segments,
                radial: radial_segments,
            });
        }
        Ok(Self {
            radius,
            length,
            cap_segments,
            radial_segments,
        })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn cap_segments(&self) -> u32 {
        self.cap_segments
    }

    pub fn radial_segments(&self) -> u32 {
        self.radial_segments
    }

    /// Half of the total height along Y.
    pub fn half_height(&self) -> f32 {
        self.length * 0.5 + self.radius
    }
}

impl Default for CapsuleGeometry {
    fn default() -> Self {
        Self {
            radius: 1.0,
            length: 2.0,
            cap_segments: 20,
            radial_segments: 30,
        }
    }
}

/// Mesh geometry descriptors. Tessellation belongs to the renderer backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Capsule(CapsuleGeometry),
    Cuboid { half_extents: Vec3 },
}

impl Geometry {
    pub fn cuboid(half_extents: Vec3) -> Result<Self, DrawableError> {
        if !half_extents.is_finite() || half_extents.min_element() <= 0.0 {
            return Err(DrawableError::InvalidExtents(half_extents.to_array()));
        }
        Ok(Self::Cuboid { half_extents })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Capsule(_) => "capsule",
            Self::Cuboid { .. } => "cuboid",
        }
    }
}

/// Physically based surface description (metal/rough workflow).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardMaterial {
    pub color: Color,
    roughness: f32,
    metalness: f32,
}

impl StandardMaterial {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn with_roughness(mut self, roughness: f32) -> Result<Self, DrawableError> {
        self.roughness = unit_interval("roughness", roughness)?;
        Ok(self)
    }

    pub fn with_metalness(mut self, metalness: f32) -> Result<Self, DrawableError> {
        self.metalness = unit_interval("metalness", metalness)?;
        Ok(self)
    }

    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    pub fn metalness(&self) -> f32 {
        self.metalness
    }
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            roughness: 1.0,
            metalness: 0.0,
        }
    }
}

fn unit_interval(name: &'static str, value: f32) -> Result<f32, DrawableError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DrawableError::MaterialOutOfRange { name, value })
    }
}

/// Omnidirectional light emitted from the owning node's world position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub color: Color,
    intensity: f32,
    /// Cutoff range; 0 means unlimited.
    distance: f32,
    decay: f32,
}

impl PointLight {
    pub fn new(color: Color, intensity: f32) -> Result<Self, DrawableError> {
        Ok(Self {
            color,
            intensity: non_negative("intensity", intensity)?,
            ..Self::default()
        })
    }

    pub fn with_range(mut self, distance: f32, decay: f32) -> Result<Self, DrawableError> {
        self.distance = non_negative("distance", distance)?;
        self.decay = non_negative("decay", decay)?;
        Ok(self)
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            distance: 0.0,
            decay: 2.0,
        }
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<f32, DrawableError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DrawableError::InvalidLight { name, value })
    }
}

/// What a node contributes to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Drawable {
    /// Pure transform node (grouping).
    #[default]
    Empty,
    Mesh {
        geometry: Geometry,
        material: StandardMaterial,
    },
    PointLight(PointLight),
}

impl Drawable {
    pub fn mesh(geometry: Geometry, material: StandardMaterial) -> Self {
        Self::Mesh { geometry, material }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self, Self::Mesh { .. })
    }

    pub fn as_light(&self) -> Option<&PointLight> {
        match self {
            Self::PointLight(light) => Some(light),
            _ => None,
        }
    }
}
