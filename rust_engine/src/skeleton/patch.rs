//! 骨骼编辑补丁
//!
//! 补丁分两个通道：
//! - `ordinary`：普通的本地空间增量，按一般公式与姿势合成
//! - `root_axis`：根运动 / 中心轴编辑，非零时按特殊规则短路合成
//!
//! 合成规则（`lhs * rhs`，按顺序匹配第一条）：
//! 1. lhs 轴平移非零：保留 lhs，轴平移累加 rhs 的轴平移
//! 2. rhs 轴平移非零：平移 = lhs 平移 + rhs 轴平移，旋转 = lhs 旋转 * rhs 旋转
//! 3. lhs 轴旋转非单位且 rhs 轴旋转为单位：以 lhs 轴旋转变换 rhs 的平移和旋转
//! 4. rhs 轴旋转非单位且 lhs 轴旋转为单位：以 rhs 轴旋转变换 lhs 的平移和旋转
//! 5. 其余情况：一般合成公式
//!
//! 规则 2~5 的结果轴通道归零。缩放总是相乘。

use glam::{Quat, Vec3};

use super::Transform;

/// 根运动轴通道
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootAxis {
    pub rotation: Quat,
    pub translation: Vec3,
}

impl Default for RootAxis {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RootAxis {
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// 骨骼补丁（编辑增量）
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BonePatch {
    pub ordinary: Transform,
    pub root_axis: RootAxis,
}

impl BonePatch {
    pub const IDENTITY: Self = Self {
        ordinary: Transform::IDENTITY,
        root_axis: RootAxis::IDENTITY,
    };

    /// 仅包含普通通道的补丁
    pub fn from_transform(ordinary: Transform) -> Self {
        Self {
            ordinary,
            root_axis: RootAxis::IDENTITY,
        }
    }

    /// 是否精确等于单位补丁
    pub fn is_identity(&self) -> bool {
        self.ordinary.is_identity() && self.root_axis.is_identity()
    }

    /// 按模块文档中的短路规则合成两个补丁
    pub fn combine(&self, rhs: &BonePatch) -> BonePatch {
        let lhs = self;

        if lhs.root_axis.translation != Vec3::ZERO {
            let mut result = *lhs;
            result.root_axis.translation += rhs.root_axis.translation;
            return result;
        }

        let scale = lhs.ordinary.scale * rhs.ordinary.scale;

        if rhs.root_axis.translation != Vec3::ZERO {
            return BonePatch::from_transform(Transform {
                translation: lhs.ordinary.translation + rhs.root_axis.translation,
                rotation: (lhs.ordinary.rotation * rhs.ordinary.rotation).normalize(),
                scale,
            });
        }

        let lhs_axis = lhs.root_axis.rotation != Quat::IDENTITY;
        let rhs_axis = rhs.root_axis.rotation != Quat::IDENTITY;

        if lhs_axis && !rhs_axis {
            let axis = lhs.root_axis.rotation;
            return BonePatch::from_transform(Transform {
                translation: axis * rhs.ordinary.translation,
                rotation: (axis * rhs.ordinary.rotation).normalize(),
                scale,
            });
        }

        if rhs_axis && !lhs_axis {
            let axis = rhs.root_axis.rotation;
            return BonePatch::from_transform(Transform {
                translation: axis * lhs.ordinary.translation,
                rotation: (axis * lhs.ordinary.rotation).normalize(),
                scale,
            });
        }

        BonePatch::from_transform(lhs.ordinary.compose(&rhs.ordinary))
    }
}

impl Transform {
    /// 把补丁烘焙到当前变换上（`self * patch`）
    pub fn apply_patch(&self, patch: &BonePatch) -> Transform {
        BonePatch::from_transform(*self).combine(patch).ordinary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn pose() -> Transform {
        Transform::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_x(0.4), 1.0)
    }

    #[test]
    fn test_identity_patch_is_neutral() {
        let t = pose();
        assert!(t.apply_patch(&BonePatch::IDENTITY).abs_diff_eq(&t, 1e-6));
        assert!(BonePatch::IDENTITY.is_identity());
    }

    #[test]
    fn test_ordinary_patch_uses_general_formula() {
        let t = pose();
        let delta = Transform::new(Vec3::Y, Quat::from_rotation_z(0.2), 1.0);
        let patched = t.apply_patch(&BonePatch::from_transform(delta));
        assert!(patched.abs_diff_eq(&t.compose(&delta), 1e-6));
    }

    #[test]
    fn test_axis_translation_adds_in_parent_space() {
        let t = pose();
        let mut patch = BonePatch::IDENTITY;
        // 普通通道的平移在此规则下被忽略
        patch.ordinary.translation = Vec3::new(100.0, 0.0, 0.0);
        patch.ordinary.rotation = Quat::from_rotation_y(0.3);
        patch.root_axis.translation = Vec3::new(0.0, 0.0, 5.0);

        let patched = t.apply_patch(&patch);
        assert_eq!(patched.translation, Vec3::new(1.0, 2.0, 8.0));
        assert!(patched
            .rotation
            .abs_diff_eq(t.rotation * Quat::from_rotation_y(0.3), 1e-6));
    }

    #[test]
    fn test_axis_rotation_rotates_whole_pose() {
        let t = Transform::new(Vec3::X, Quat::IDENTITY, 1.0);
        let mut patch = BonePatch::IDENTITY;
        patch.root_axis.rotation = Quat::from_rotation_z(FRAC_PI_2);

        let patched = t.apply_patch(&patch);
        assert!(patched.translation.abs_diff_eq(Vec3::Y, 1e-6));
        assert!(patched.rotation.abs_diff_eq(Quat::from_rotation_z(FRAC_PI_2), 1e-6));
    }

    #[test]
    fn test_lhs_axis_translation_accumulates() {
        let mut lhs = BonePatch::IDENTITY;
        lhs.root_axis.translation = Vec3::X;
        lhs.ordinary.translation = Vec3::Y;
        let mut rhs = BonePatch::IDENTITY;
        rhs.root_axis.translation = Vec3::Z;

        let combined = lhs.combine(&rhs);
        assert_eq!(combined.root_axis.translation, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(combined.ordinary.translation, Vec3::Y);
    }

    #[test]
    fn test_both_axis_rotations_fall_back_to_general() {
        let mut lhs = BonePatch::from_transform(pose());
        lhs.root_axis.rotation = Quat::from_rotation_x(0.1);
        let mut rhs = BonePatch::from_transform(Transform::new(Vec3::Z, Quat::IDENTITY, 1.0));
        rhs.root_axis.rotation = Quat::from_rotation_y(0.1);

        let combined = lhs.combine(&rhs);
        assert!(combined.root_axis.is_identity());
        assert!(combined
            .ordinary
            .abs_diff_eq(&lhs.ordinary.compose(&rhs.ordinary), 1e-6));
    }
}
