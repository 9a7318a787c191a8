//! Listener transform for 3D positioning
//!
//! A single global listener pose pushed into the backend, which derives the
//! ear positions used by spatial voices. Attenuation itself happens inside
//! the middleware.

use crate::foundation::math::{normalize_or, Vec3};

/// Distance between the listener's virtual ears, in world units
pub const EAR_SPACING: f32 = 0.4;

/// Listener pose: position plus orientation basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerPose {
    /// Listener position in world space
    pub position: Vec3,
    /// Forward direction (normalized)
    pub forward: Vec3,
    /// Up direction (normalized)
    pub up: Vec3,
}

impl Default for ListenerPose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            forward: -Vec3::z(),
            up: Vec3::y(),
        }
    }
}

impl ListenerPose {
    /// Create a pose from raw vectors, normalizing the orientation
    pub fn new(position: Vec3, forward: Vec3, up: Vec3) -> Self {
        Self {
            position,
            forward: normalize_or(forward, -Vec3::z()),
            up: normalize_or(up, Vec3::y()),
        }
    }

    /// The listener's right-hand direction
    pub fn right(&self) -> Vec3 {
        normalize_or(self.forward.cross(&self.up), Vec3::x())
    }

    /// World-space positions of the left and right ears
    pub fn ear_positions(&self) -> (Vec3, Vec3) {
        let offset = self.right() * (EAR_SPACING * 0.5);
        (self.position - offset, self.position + offset)
    }
}
