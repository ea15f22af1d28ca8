//! Core shared types: math re-exports and node transforms.

pub use glam::{Mat4, Quat, Vec3, vec3};

pub mod transform;

pub use transform::Transform;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_reads_as_xyzw() {
        // glTF stores quaternions as [x, y, z, w]; this is +90 degrees about Y.
        let half = std::f32::consts::FRAC_1_SQRT_2;
        let json = format!("[0.0, {half}, 0.0, {half}]");
        let rotation: Quat = serde_json::from_str(&json).unwrap();
        assert!((rotation.w - half).abs() < 1e-6);
        assert!((rotation * Vec3::X).abs_diff_eq(vec3(0.0, 0.0, -1.0), 1e-5));
    }

    #[test]
    fn matrix_reads_column_major() {
        // Translation lives in elements 12..15 of the glTF array.
        let json = "[2,0,0,0, 0,2,0,0, 0,0,2,0, 5,6,7,1]";
        let matrix: Mat4 = serde_json::from_str(json).unwrap();
        let t = Transform::from_matrix(matrix);
        assert!(t.translation.abs_diff_eq(vec3(5.0, 6.0, 7.0), 1e-6));
        assert!(t.scale.abs_diff_eq(Vec3::splat(2.0), 1e-6));
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn matrix_round_trips_through_trs() {
        let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let source = Transform::from_trs(vec3(4.0, 0.5, -1.0), rotation, vec3(1.0, 3.0, 1.0));
        let decomposed = Transform::from_matrix(source.matrix());
        assert!(decomposed.translation.abs_diff_eq(source.translation, 1e-5));
        assert!(decomposed.scale.abs_diff_eq(source.scale, 1e-5));
        // q and -q encode the same rotation; compare their effect instead.
        let axis = Vec3::new(1.0, 2.0, 3.0);
        assert!((decomposed.rotation * axis).abs_diff_eq(source.rotation * axis, 1e-4));
    }
}
