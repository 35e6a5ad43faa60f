//! 姿势编辑器
//!
//! 持有骨骼、动画和命令历史，对外提供与界面层对接的编辑操作：
//! 选择骨骼、拖拽修改补丁、撤销/重做、烘焙以及帧区间编辑。
//! 所有操作同步执行。

mod frames;

use std::path::Path;

use glam::{Quat, Vec3};

use crate::animation::Animation;
use crate::command::{CommandManager, PendingEdit};
use crate::config::{self, EditorConfig};
use crate::skeleton::{Bone, Skeleton, Transform};
use crate::{HkaError, Result};

/// 姿势编辑器
#[derive(Debug)]
pub struct PoseEditor {
    config: EditorConfig,
    skeleton: Skeleton,
    animation: Option<Animation>,
    commands: CommandManager,
    selected_bone: Option<usize>,
    pending_edit: Option<PendingEdit>,
    current_frame: usize,
    start_frame: usize,
}

impl PoseEditor {
    /// 使用全局配置创建编辑器
    pub fn new(skeleton: Skeleton) -> Self {
        Self::with_config(skeleton, config::get_config())
    }

    pub fn with_config(skeleton: Skeleton, config: EditorConfig) -> Self {
        Self {
            config,
            skeleton,
            animation: None,
            commands: CommandManager::new(),
            selected_bone: None,
            pending_edit: None,
            current_frame: 0,
            start_frame: 0,
        }
    }

    /// 从 skeleton.bin 创建编辑器
    pub fn open<P: AsRef<Path>>(skeleton_path: P) -> Result<Self> {
        Ok(Self::new(Skeleton::load(skeleton_path)?))
    }

    // ========== 加载 ==========

    /// 加载骨骼，失败时保持原骨骼不变
    pub fn load_skeleton<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let skeleton = Skeleton::load(path)?;
        self.set_skeleton(skeleton);
        Ok(())
    }

    /// 替换骨骼，清除选择和历史
    pub fn set_skeleton(&mut self, skeleton: Skeleton) {
        self.skeleton = skeleton;
        self.selected_bone = None;
        self.pending_edit = None;
        self.commands.clear_commands();
        self.check_track_count();
        self.assign_current_pose();
    }

    /// 加载动画，失败时保持原动画不变
    pub fn load_animation<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let animation = Animation::load(path)?;
        self.set_animation(animation);
        Ok(())
    }

    /// 替换动画，清除补丁和历史并显示第 0 帧
    pub fn set_animation(&mut self, animation: Animation) {
        self.animation = Some(animation);
        self.pending_edit = None;
        self.skeleton.clear_patches();
        self.commands.clear_commands();
        self.current_frame = 0;
        self.start_frame = 0;
        self.check_track_count();
        self.assign_current_pose();
    }

    fn check_track_count(&self) {
        if let Some(animation) = &self.animation {
            if animation.num_transforms() != self.skeleton.bone_count() {
                log::warn!(
                    "动画骨骼轨道数 {} 与骨骼数 {} 不一致，只使用前 {} 个",
                    animation.num_transforms(),
                    self.skeleton.bone_count(),
                    animation.num_transforms().min(self.skeleton.bone_count())
                );
            }
        }
    }

    // ========== 访问 ==========

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn commands(&self) -> &CommandManager {
        &self.commands
    }

    pub fn num_frames(&self) -> usize {
        self.animation.as_ref().map_or(0, Animation::num_frames)
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn start_frame(&self) -> usize {
        self.start_frame
    }

    fn animation_ref(&self) -> Result<&Animation> {
        self.animation.as_ref().ok_or_else(no_animation)
    }

    // ========== 姿势 ==========

    /// 显示指定帧，返回实际显示的帧
    ///
    /// 多于 1 帧时按 `numFrames - 1` 取模：循环动画的最后一帧与第一帧相同。
    pub fn set_current_pose(&mut self, index: usize) -> Result<usize> {
        let num_frames = self.animation_ref()?.num_frames();
        self.current_frame = if num_frames > 1 {
            index % (num_frames - 1)
        } else {
            0
        };
        self.assign_current_pose();
        Ok(self.current_frame)
    }

    /// 把当前帧写入骨骼本地变换
    fn assign_current_pose(&mut self) {
        if let Some(pose) = self
            .animation
            .as_ref()
            .and_then(|animation| animation.pose(self.current_frame))
        {
            self.skeleton.assign_pose(pose);
        }
    }

    /// 清除所有骨骼的补丁
    pub fn clear_patch(&mut self) {
        self.skeleton.clear_patches();
    }

    // ========== 选择 ==========

    /// 选择骨骼，隐藏或不存在的骨骼不能选择
    pub fn select_bone(&mut self, index: usize) -> bool {
        match self.skeleton.get_bone(index) {
            Some(bone) if !bone.hidden => {
                log::info!("选择骨骼: {}", bone.name);
                self.selected_bone = Some(index);
                true
            }
            _ => false,
        }
    }

    pub fn select_bone_by_name(&mut self, name: &str) -> bool {
        match self.skeleton.find_bone_by_name(name) {
            Some(index) => self.select_bone(index),
            None => false,
        }
    }

    pub fn deselect_bone(&mut self) {
        self.selected_bone = None;
    }

    pub fn selected_bone(&self) -> Option<&Bone> {
        self.selected_bone.and_then(|i| self.skeleton.get_bone(i))
    }

    /// 选中骨骼的世界变换（相机中心）
    pub fn selected_world_transform(&self) -> Option<Transform> {
        self.selected_bone.map(|i| self.skeleton.world_transform(i))
    }

    fn selected_bone_mut(&mut self) -> Option<&mut Bone> {
        let index = self.selected_bone?;
        self.skeleton.get_bone_mut(index)
    }

    // ========== 编辑命令 ==========

    /// 开始编辑选中骨骼，没有选中骨骼时什么也不做
    pub fn begin_bone_command(&mut self) {
        if let Some(index) = self.selected_bone {
            self.pending_edit = PendingEdit::begin(&self.skeleton, index);
        }
    }

    pub fn has_bone_command(&self) -> bool {
        self.pending_edit.is_some()
    }

    /// 结束编辑，补丁有变化时记录命令，返回是否记录
    pub fn end_bone_command(&mut self) -> bool {
        let Some(edit) = self.pending_edit.take() else {
            return false;
        };
        match edit.finish(&self.skeleton, self.config.change_epsilon) {
            Some(command) => {
                self.commands.push(Box::new(command));
                true
            }
            None => false,
        }
    }

    /// 沿骨骼当前朝向下的轴平移（`axis` 须为非零单位向量）
    pub fn translate_axis(&mut self, dx: i32, axis: Vec3) {
        if dx == 0 {
            return;
        }
        let len = dx as f32 * self.config.translate_step;
        if let Some(bone) = self.selected_bone_mut() {
            let axis = (bone.local.rotation * bone.patch.ordinary.rotation) * axis;
            bone.patch.ordinary.translation += axis * len;
        }
    }

    /// 绕轴旋转（`axis` 须为非零单位向量）
    pub fn rotate_axis(&mut self, dx: i32, axis: Vec3) {
        if dx == 0 {
            return;
        }
        let angle = dx as f32 * self.config.rotate_step;
        if let Some(bone) = self.selected_bone_mut() {
            let rotation = bone.patch.ordinary.rotation * Quat::from_axis_angle(axis, angle);
            bone.patch.ordinary.rotation = rotation.normalize();
        }
    }

    /// 在父空间中沿轴平移（根运动通道）
    pub fn translate_root_axis(&mut self, dx: i32, axis: Vec3) {
        if dx == 0 {
            return;
        }
        let len = dx as f32 * self.config.translate_step;
        if let Some(bone) = self.selected_bone_mut() {
            bone.patch.root_axis.translation += axis * len;
        }
    }

    /// 绕中心轴旋转整个姿势（根运动通道）
    pub fn rotate_center_axis(&mut self, dx: i32, axis: Vec3) {
        if dx == 0 {
            return;
        }
        let angle = dx as f32 * self.config.rotate_step;
        if let Some(bone) = self.selected_bone_mut() {
            let rotation = bone.patch.root_axis.rotation * Quat::from_axis_angle(axis, angle);
            bone.patch.root_axis.rotation = rotation.normalize();
        }
    }

    // ========== 撤销/重做 ==========

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn undo(&mut self) -> bool {
        self.commands.undo(&mut self.skeleton)
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    pub fn redo(&mut self) -> bool {
        self.commands.redo(&mut self.skeleton)
    }
}

fn no_animation() -> HkaError {
    HkaError::Validation("No animation loaded".to_string())
}
