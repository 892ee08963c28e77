//! Math utilities and types
//!
//! Provides the fundamental math types for the scene graph. All matrix
//! values have plain value semantics: operations return new matrices and
//! never mutate their inputs, so a node's initial transform can be reused
//! every frame without defensive copying at call sites.

pub use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Extension trait for Mat4 with the constructors the scene graph needs
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a combined Euler rotation, applied in x, then y, then z order
    fn rotation_xyz(x: f32, y: f32, z: f32) -> Mat4;

    /// Create a translation matrix
    fn translation(x: f32, y: f32, z: f32) -> Mat4;

    /// Create a non-uniform scaling matrix
    fn scaling(x: f32, y: f32, z: f32) -> Mat4;

    /// Create a perspective projection matrix
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Left-multiply composition: returns `other * self`
    ///
    /// This is the local-then-parent composition used throughout the
    /// scene graph: `world = model.left_multiplied(&parent)` applies the
    /// model transform first, then the parent's.
    fn left_multiplied(&self, other: &Mat4) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn rotation_xyz(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::rotation_x(x) * Mat4::rotation_y(y) * Mat4::rotation_z(z)
    }

    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    fn scaling(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_nonuniform_scaling(&Vec3::new(x, y, z))
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn left_multiplied(&self, other: &Mat4) -> Mat4 {
        other * self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_rotation_xyz_order() {
        // The combined rotation must equal Rx * Ry * Rz, i.e. z applied
        // to vectors first, then y, then x.
        let (x, y, z) = (0.3, -0.7, 1.1);
        let combined = Mat4::rotation_xyz(x, y, z);
        let sequential = Mat4::rotation_x(x) * Mat4::rotation_y(y) * Mat4::rotation_z(z);

        assert_relative_eq!(combined, sequential, epsilon = EPSILON);
    }

    #[test]
    fn test_left_multiplied_matches_operator() {
        let a = Mat4::translation(1.0, 2.0, 3.0);
        let b = Mat4::rotation_y(0.5);

        assert_relative_eq!(a.left_multiplied(&b), b * a, epsilon = EPSILON);
    }

    #[test]
    fn test_translation_moves_points() {
        let m = Mat4::translation(1.0, -2.0, 4.0);
        let p = m.transform_point(&nalgebra::Point3::origin());

        assert_relative_eq!(p.x, 1.0, epsilon = EPSILON);
        assert_relative_eq!(p.y, -2.0, epsilon = EPSILON);
        assert_relative_eq!(p.z, 4.0, epsilon = EPSILON);
    }

    #[test]
    fn test_perspective_is_finite() {
        let proj = Mat4::perspective(utils::deg_to_rad(85.0), 4.0 / 3.0, 0.1, 1000.0);
        assert!(proj.iter().all(|v| v.is_finite()));
        // Perspective divide must be armed
        assert_relative_eq!(proj[(3, 2)], -1.0, epsilon = EPSILON);
    }
}
