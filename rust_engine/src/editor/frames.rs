//! 烘焙、帧区间编辑和临时文件导入导出

use std::path::{Path, PathBuf};

use crate::animation::{self, Interpolation};
use crate::command::{PendingEdit, PoseCommand};
use crate::hkdump::{read_pose_file, read_range_file, write_pose_file, write_range_file, PoseRange};
use crate::skeleton::BonePatch;
use crate::{HkaError, Result};

use super::{no_animation, PoseEditor};

impl PoseEditor {
    // ========== 烘焙 ==========

    /// 把补丁均匀烘焙到所有帧，然后清除补丁和历史
    pub fn apply_patch_to_animation(&mut self) -> Result<usize> {
        let patches = self.skeleton.patches();
        self.log_patches();
        let animation = self.animation.as_mut().ok_or_else(no_animation)?;
        let baked = animation::apply_patch_to_animation(animation, &patches);
        self.finish_bake();
        Ok(baked)
    }

    /// 设置区间烘焙和帧删除的起始帧
    pub fn set_start_frame(&mut self, frame: usize) -> Result<()> {
        self.animation_ref()?.check_frame(frame)?;
        self.start_frame = frame;
        log::info!("起始帧: {}", frame);
        Ok(())
    }

    /// 从起始帧插值到 `to_frame` 并烘焙之后的帧
    ///
    /// 补丁应当是在预览 `to_frame` 时调出来的。失败时动画和补丁都不变。
    pub fn make_to_animation(&mut self, to_frame: usize, interpolation: Interpolation) -> Result<usize> {
        let patches = self.skeleton.patches();
        self.log_patches();
        let animation = self.animation.as_mut().ok_or_else(no_animation)?;
        let baked = animation::make_to_animation(
            animation,
            &patches,
            self.start_frame,
            to_frame,
            interpolation,
        )?;
        self.finish_bake();
        Ok(baked)
    }

    fn finish_bake(&mut self) {
        self.skeleton.clear_patches();
        self.commands.clear_commands();
        self.pending_edit = None;
        self.assign_current_pose();
    }

    fn log_patches(&self) {
        if !self.config.debug_log {
            return;
        }
        for bone in self.skeleton.bones().iter().filter(|bone| bone.is_patched()) {
            log::debug!("补丁 {}:\n{}", bone.name, bone.patch.ordinary);
        }
    }

    // ========== 帧区间 ==========

    /// 删除起始帧到 `to_frame`（含）的帧，然后显示第 0 帧
    pub fn delete_animation_frame(&mut self, to_frame: usize) -> Result<()> {
        let animation = self.animation.as_mut().ok_or_else(no_animation)?;
        animation.delete_frames(self.start_frame, to_frame)?;
        if self.start_frame >= animation.num_frames() {
            self.start_frame = 0;
        }
        self.current_frame = 0;
        self.assign_current_pose();
        Ok(())
    }

    // ========== 姿势导入导出 ==========

    /// 导出一帧（叠加当前补丁），返回写入的文件
    pub fn export_pose<P: AsRef<Path>>(&self, dir: P, frame: usize) -> Result<PathBuf> {
        let animation = self.animation_ref()?;
        animation.check_frame(frame)?;
        let pose = animation
            .pose(frame)
            .ok_or_else(no_animation)?
            .with_patches(&self.skeleton.patches());

        let path = dir.as_ref().join(&self.config.pose_scratch_file);
        write_pose_file(&path, &pose)?;
        Ok(path)
    }

    /// 导入姿势，换算成相对当前帧的补丁
    ///
    /// 根骨骼和重心骨骼不参与计算。作为一步可撤销的操作记录，
    /// 没有任何补丁变化时不记录，返回 `false`。
    pub fn import_pose<P: AsRef<Path>>(&mut self, dir: P) -> Result<bool> {
        let path = dir.as_ref().join(&self.config.pose_scratch_file);
        let pose = read_pose_file(&path)?;

        let count = pose.transforms.len().min(self.skeleton.bone_count());
        let mut command = PoseCommand::default();

        for (i, imported) in pose.transforms.iter().enumerate().take(count) {
            let Some(bone) = self.skeleton.get_bone(i) else {
                continue;
            };
            if self.config.pass_through_bones.contains(&bone.name) {
                continue;
            }

            let mut delta = bone.local.inverse().compose(imported);
            delta.scale = 1.0;

            let Some(edit) = PendingEdit::begin(&self.skeleton, i) else {
                continue;
            };
            if let Some(bone) = self.skeleton.get_bone_mut(i) {
                bone.patch = BonePatch::from_transform(delta);
            }
            if let Some(bone_command) = edit.finish(&self.skeleton, self.config.change_epsilon) {
                command.commands.push(bone_command);
            }
        }

        if command.is_empty() {
            log::info!("导入姿势: 没有变化");
            return Ok(false);
        }
        log::info!("导入姿势: {} 个骨骼", command.commands.len());
        self.commands.push(Box::new(command));
        Ok(true)
    }

    /// 用导入的姿势直接覆盖一帧
    ///
    /// 骨骼轨道覆盖两者中较少的数量，浮点轨道数量一致时才覆盖。
    pub fn import_pose_frame<P: AsRef<Path>>(&mut self, dir: P, frame: usize) -> Result<()> {
        let path = dir.as_ref().join(&self.config.pose_scratch_file);
        let pose = read_pose_file(&path)?;

        let animation = self.animation.as_mut().ok_or_else(no_animation)?;
        animation.check_frame(frame)?;
        let target = animation.pose_mut(frame).ok_or_else(no_animation)?;

        let count = target.transforms.len().min(pose.transforms.len());
        target.transforms[..count].copy_from_slice(&pose.transforms[..count]);
        if target.floats.len() == pose.floats.len() {
            target.floats.copy_from_slice(&pose.floats);
        } else {
            log::warn!(
                "浮点轨道数不一致 ({} / {})，未覆盖浮点值",
                pose.floats.len(),
                target.floats.len()
            );
        }

        if frame == self.current_frame {
            self.assign_current_pose();
        }
        log::info!("导入姿势到帧 {}: {} 条骨骼轨道", frame, count);
        Ok(())
    }

    /// 导出 `[start_frame, to_frame]` 的帧
    pub fn export_animation<P: AsRef<Path>>(
        &self,
        dir: P,
        start_frame: usize,
        to_frame: usize,
    ) -> Result<PathBuf> {
        let animation = self.animation_ref()?;
        let poses = animation.frames(start_frame, to_frame)?;
        let range = PoseRange {
            duration: animation.range_duration(poses.len()),
            num_transforms: animation.num_transforms(),
            num_floats: animation.num_floats(),
            poses,
        };

        let path = dir.as_ref().join(&self.config.animation_scratch_file);
        write_range_file(&path, &range)?;
        Ok(path)
    }

    /// 在 `after_frame` 之后插入导出的帧，返回插入的帧数
    ///
    /// 空动画从第 0 帧开始填充，并沿用区间文件的时长。
    pub fn import_animation<P: AsRef<Path>>(&mut self, dir: P, after_frame: usize) -> Result<usize> {
        let path = dir.as_ref().join(&self.config.animation_scratch_file);
        let range = read_range_file(&path)?;

        let animation = self.animation.as_mut().ok_or_else(no_animation)?;
        if range.num_transforms != animation.num_transforms() || range.num_floats != animation.num_floats() {
            return Err(HkaError::Validation(format!(
                "Imported frames have {} / {} tracks, animation has {} / {}",
                range.num_transforms,
                range.num_floats,
                animation.num_transforms(),
                animation.num_floats()
            )));
        }

        let was_empty = animation.num_frames() == 0;
        let inserted = range.poses.len();
        animation.insert_frames(after_frame, range.poses)?;
        if was_empty {
            animation.duration = range.duration;
        }
        self.assign_current_pose();
        Ok(inserted)
    }

    // ========== 保存 ==========

    /// 烘焙补丁后序列化动画
    pub fn save_animation_bytes(&mut self) -> Result<Vec<u8>> {
        self.apply_patch_to_animation()?;
        self.animation_ref()?.to_bytes()
    }

    /// 烘焙补丁后保存动画
    pub fn save_animation<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.apply_patch_to_animation()?;
        self.animation_ref()?.save(path)
    }
}
