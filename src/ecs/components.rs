//! Common ECS components

use glam::{Mat3, Quat, Vec3};

/// Transform component: position and orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
}

impl Transform {
    /// Create a new transform at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create a transform at `position` oriented so that `forward()` and
    /// `up()` match the given directions.
    ///
    /// `up` is re-orthogonalized against `forward`.
    pub fn from_position_forward_up(position: Vec3, forward: Vec3, up: Vec3) -> Self {
        let forward = forward.normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);
        let rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward));
        Self::from_position_rotation(position, rotation)
    }

    /// Get the forward direction (negative Z in local space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the right direction (positive X in local space)
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the up direction (positive Y in local space)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Translate by a delta
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Marks the entity whose transform acts as the audio listener.
///
/// Only one listener is active at a time; see `Engine::activate_listener`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioListener;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transform_axes() {
        let t = Transform::new();
        assert!(t.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(t.up().abs_diff_eq(Vec3::Y, 1e-6));
        assert!(t.right().abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn test_from_position_forward_up() {
        let t = Transform::from_position_forward_up(Vec3::new(1.0, 2.0, 3.0), Vec3::Z, Vec3::Y);
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
        assert!(t.forward().abs_diff_eq(Vec3::Z, 1e-5), "{:?}", t.forward());
        assert!(t.up().abs_diff_eq(Vec3::Y, 1e-5), "{:?}", t.up());
    }

    #[test]
    fn test_from_position_forward_up_orthogonalizes() {
        let t = Transform::from_position_forward_up(Vec3::ZERO, Vec3::X, Vec3::new(0.2, 1.0, 0.0));
        assert!(t.forward().abs_diff_eq(Vec3::X, 1e-5));
        assert!(t.up().abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn test_translate() {
        let mut t = Transform::from_position(Vec3::ONE);
        t.translate(Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(t.position, Vec3::new(2.0, 1.0, 0.0));
    }
}
