//! 编辑命令与撤销/重做
//!
//! 拖拽过程中直接修改骨骼补丁，开始和结束时各取一次快照，
//! 两次快照不同才生成命令。

mod manager;

pub use manager::CommandManager;

use glam::{Quat, Vec3};

use crate::skeleton::Skeleton;

/// 可撤销的编辑操作
pub trait Command: std::fmt::Debug {
    /// 恢复到操作前的状态
    fn undo(&self, skeleton: &mut Skeleton);
    /// 恢复到操作后的状态
    fn redo(&self, skeleton: &mut Skeleton);
}

/// 补丁中可编辑的四个分量
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneAttr {
    pub rotation: Quat,
    pub translation: Vec3,
    pub axis_rotation: Quat,
    pub axis_translation: Vec3,
}

impl BoneAttr {
    /// 读取骨骼当前补丁，骨骼不存在时返回 `None`
    pub fn capture(skeleton: &Skeleton, bone_index: usize) -> Option<Self> {
        skeleton.get_bone(bone_index).map(|bone| Self {
            rotation: bone.patch.ordinary.rotation,
            translation: bone.patch.ordinary.translation,
            axis_rotation: bone.patch.root_axis.rotation,
            axis_translation: bone.patch.root_axis.translation,
        })
    }

    /// 写回骨骼补丁（缩放不变）
    pub fn restore(&self, skeleton: &mut Skeleton, bone_index: usize) {
        if let Some(bone) = skeleton.get_bone_mut(bone_index) {
            bone.patch.ordinary.rotation = self.rotation;
            bone.patch.ordinary.translation = self.translation;
            bone.patch.root_axis.rotation = self.axis_rotation;
            bone.patch.root_axis.translation = self.axis_translation;
        }
    }

    /// `epsilon` 为 0 时精确比较
    pub fn approx_eq(&self, other: &BoneAttr, epsilon: f32) -> bool {
        if epsilon <= 0.0 {
            return self == other;
        }
        self.rotation.abs_diff_eq(other.rotation, epsilon)
            && self.translation.abs_diff_eq(other.translation, epsilon)
            && self.axis_rotation.abs_diff_eq(other.axis_rotation, epsilon)
            && self.axis_translation.abs_diff_eq(other.axis_translation, epsilon)
    }
}

/// 进行中的骨骼编辑
#[derive(Clone, Debug)]
pub struct PendingEdit {
    bone_index: usize,
    old_attr: BoneAttr,
}

impl PendingEdit {
    /// 开始编辑，记录当前补丁
    pub fn begin(skeleton: &Skeleton, bone_index: usize) -> Option<Self> {
        BoneAttr::capture(skeleton, bone_index).map(|old_attr| Self { bone_index, old_attr })
    }

    pub fn bone_index(&self) -> usize {
        self.bone_index
    }

    /// 结束编辑，补丁没有变化时返回 `None`
    pub fn finish(self, skeleton: &Skeleton, epsilon: f32) -> Option<BoneCommand> {
        let new_attr = BoneAttr::capture(skeleton, self.bone_index)?;
        if self.old_attr.approx_eq(&new_attr, epsilon) {
            return None;
        }
        Some(BoneCommand {
            bone_index: self.bone_index,
            old_attr: self.old_attr,
            new_attr,
        })
    }
}

/// 单个骨骼的补丁变更
#[derive(Clone, Debug, PartialEq)]
pub struct BoneCommand {
    pub bone_index: usize,
    pub old_attr: BoneAttr,
    pub new_attr: BoneAttr,
}

impl Command for BoneCommand {
    fn undo(&self, skeleton: &mut Skeleton) {
        self.old_attr.restore(skeleton, self.bone_index);
    }

    fn redo(&self, skeleton: &mut Skeleton) {
        self.new_attr.restore(skeleton, self.bone_index);
    }
}

/// 多个骨骼同时变更（导入姿势），作为一步撤销
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseCommand {
    pub commands: Vec<BoneCommand>,
}

impl PoseCommand {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for PoseCommand {
    fn undo(&self, skeleton: &mut Skeleton) {
        for command in self.commands.iter().rev() {
            command.undo(skeleton);
        }
    }

    fn redo(&self, skeleton: &mut Skeleton) {
        for command in &self.commands {
            command.redo(skeleton);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Transform;

    fn skeleton() -> Skeleton {
        Skeleton::new(
            "s".to_string(),
            vec!["root".into(), "spine".into()],
            vec![-1, 0],
            vec![Transform::IDENTITY; 2],
        )
        .unwrap()
    }

    #[test]
    fn test_unchanged_edit_yields_no_command() {
        let skeleton = skeleton();
        let edit = PendingEdit::begin(&skeleton, 1).unwrap();
        assert!(edit.finish(&skeleton, 0.0).is_none());
    }

    #[test]
    fn test_missing_bone_cannot_begin() {
        assert!(PendingEdit::begin(&skeleton(), 7).is_none());
    }

    #[test]
    fn test_bone_command_undo_redo() {
        let mut skeleton = skeleton();
        let edit = PendingEdit::begin(&skeleton, 1).unwrap();
        skeleton.get_bone_mut(1).unwrap().patch.ordinary.translation = Vec3::new(0.0, 0.5, 0.0);
        skeleton.get_bone_mut(1).unwrap().patch.root_axis.rotation = Quat::from_rotation_z(0.1);
        let command = edit.finish(&skeleton, 0.0).unwrap();

        command.undo(&mut skeleton);
        assert!(skeleton.get_bone(1).unwrap().patch.is_identity());

        command.redo(&mut skeleton);
        let patch = skeleton.get_bone(1).unwrap().patch;
        assert_eq!(patch.ordinary.translation, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(patch.root_axis.rotation, Quat::from_rotation_z(0.1));
    }

    #[test]
    fn test_epsilon_ignores_tiny_drift() {
        let mut skeleton = skeleton();
        let edit = PendingEdit::begin(&skeleton, 1).unwrap();
        skeleton.get_bone_mut(1).unwrap().patch.ordinary.translation = Vec3::new(1e-7, 0.0, 0.0);
        assert!(edit.clone().finish(&skeleton, 1e-5).is_none());
        assert!(edit.finish(&skeleton, 0.0).is_some());
    }

    #[test]
    fn test_pose_command_restores_all_bones() {
        let mut skeleton = skeleton();
        let edits: Vec<_> = (0..2)
            .map(|i| PendingEdit::begin(&skeleton, i).unwrap())
            .collect();
        for i in 0..2 {
            skeleton.get_bone_mut(i).unwrap().patch.ordinary.translation = Vec3::X * (i + 1) as f32;
        }
        let command = PoseCommand {
            commands: edits
                .into_iter()
                .filter_map(|edit| edit.finish(&skeleton, 0.0))
                .collect(),
        };
        assert_eq!(command.commands.len(), 2);

        command.undo(&mut skeleton);
        assert!(!skeleton.has_patches());
        command.redo(&mut skeleton);
        assert_eq!(skeleton.get_bone(1).unwrap().patch.ordinary.translation, Vec3::X * 2.0);
    }
}
