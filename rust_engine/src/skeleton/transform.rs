//! 刚体 + 均匀缩放变换

use std::fmt;

use glam::{Quat, Vec3};

/// 本地空间变换（平移 + 旋转 + 均匀缩放）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: 1.0,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: f32) -> Self {
        Self { translation, rotation, scale }
    }

    /// 合成 `self * child`：把 child 表达到 self 的父空间
    ///
    /// - 平移 = self.translation + rotate(self.rotation, child.translation) * self.scale
    /// - 旋转 = self.rotation * child.rotation（合成后重新归一化）
    /// - 缩放 = self.scale * child.scale
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.translation + (self.rotation * child.translation) * self.scale,
            rotation: (self.rotation * child.rotation).normalize(),
            scale: self.scale * child.scale,
        }
    }

    /// 逆变换，满足 `t.compose(&t.inverse()) ≈ IDENTITY`
    ///
    /// 缩放为 0 时结果无意义，由调用方保证。
    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.conjugate();
        Transform {
            translation: -(rotation * self.translation) / self.scale,
            rotation,
            scale: 1.0 / self.scale,
        }
    }

    /// 是否精确等于单位变换（无容差）
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// 容差比较
    pub fn abs_diff_eq(&self, other: &Transform, max_abs_diff: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, max_abs_diff)
            && self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
            && (self.scale - other.scale).abs() <= max_abs_diff
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Translation: {:.6} {:.6} {:.6}",
            self.translation.x, self.translation.y, self.translation.z
        )?;
        writeln!(
            f,
            "Rotation: {:.6} {:.6} {:.6} {:.6}",
            self.rotation.w, self.rotation.x, self.rotation.y, self.rotation.z
        )?;
        write!(f, "Scale: {:.6}", self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn sample() -> Transform {
        Transform::new(
            Vec3::new(1.0, -2.0, 0.5),
            Quat::from_axis_angle(Vec3::new(0.0, 0.6, 0.8), 0.7),
            1.5,
        )
    }

    #[test]
    fn test_identity_is_neutral() {
        let t = sample();
        assert!(Transform::IDENTITY.compose(&t).abs_diff_eq(&t, 1e-6));
        assert!(t.compose(&Transform::IDENTITY).abs_diff_eq(&t, 1e-6));
    }

    #[test]
    fn test_compose_formula() {
        let parent = Transform::new(Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_z(FRAC_PI_2), 2.0);
        let child = Transform::new(Vec3::X, Quat::IDENTITY, 1.0);
        let world = parent.compose(&child);
        // X 轴绕 Z 旋转 90 度变为 Y，再乘以父缩放 2
        assert!(world.translation.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-6));
        assert_eq!(world.scale, 2.0);
    }

    #[test]
    fn test_compose_is_not_commutative() {
        let a = Transform::new(Vec3::X, Quat::from_rotation_y(0.5), 1.0);
        let b = Transform::new(Vec3::Z, Quat::from_rotation_x(0.3), 1.0);
        assert!(!a.compose(&b).abs_diff_eq(&b.compose(&a), 1e-4));
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = sample();
        assert!(t.compose(&t.inverse()).abs_diff_eq(&Transform::IDENTITY, 1e-5));
        assert!(t.inverse().compose(&t).abs_diff_eq(&Transform::IDENTITY, 1e-5));
    }

    #[test]
    fn test_is_identity_is_exact() {
        assert!(Transform::IDENTITY.is_identity());
        let mut t = Transform::IDENTITY;
        t.translation.x = 1e-7;
        assert!(!t.is_identity());
    }

    #[test]
    fn test_display_dump() {
        let text = Transform::IDENTITY.to_string();
        assert!(text.starts_with("Translation: 0.000000 0.000000 0.000000"));
        assert!(text.contains("Rotation: 1.000000 0.000000 0.000000 0.000000"));
        assert!(text.ends_with("Scale: 1.000000"));
    }
}
