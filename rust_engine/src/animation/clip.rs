//! 动画片段

use glam::Vec4;

use crate::{HkaError, Result};

use super::{Annotation, Pose};

/// 提取出的根运动数据
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultMotion {
    pub up: Vec4,
    pub forward: Vec4,
    pub duration: f32,
    pub reference_frame_samples: Vec<Vec4>,
}

/// 动画块末尾的根运动标记
#[derive(Clone, Debug, Default, PartialEq)]
pub enum MotionTrailer {
    /// 文件在注释轨道后直接结束
    #[default]
    Missing,
    /// 标记字节为 0
    None,
    /// 标记字节为 1，后跟根运动数据
    Extracted(DefaultMotion),
}

/// 动画片段
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    /// 动画时长（秒）
    pub duration: f32,
    num_transforms: usize,
    num_floats: usize,
    /// 逐帧姿势，长度即原始帧数
    pub(crate) poses: Vec<Pose>,
    /// 第一条注释轨道
    pub annotations: Vec<Annotation>,
    /// 文件声明的注释轨道数（原样写回）
    pub annotation_track_count: usize,
    pub motion: MotionTrailer,
}

impl Animation {
    /// 创建动画，所有姿势的轨道数必须与声明一致
    pub fn new(
        duration: f32,
        num_transforms: usize,
        num_floats: usize,
        poses: Vec<Pose>,
    ) -> Result<Self> {
        check_tracks(&poses, num_transforms, num_floats)?;
        Ok(Self {
            duration,
            num_transforms,
            num_floats,
            poses,
            annotations: Vec::new(),
            annotation_track_count: 0,
            motion: MotionTrailer::Missing,
        })
    }

    /// 原始帧数
    pub fn num_frames(&self) -> usize {
        self.poses.len()
    }

    /// 骨骼轨道数
    pub fn num_transforms(&self) -> usize {
        self.num_transforms
    }

    /// 浮点轨道数
    pub fn num_floats(&self) -> usize {
        self.num_floats
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn pose(&self, frame: usize) -> Option<&Pose> {
        self.poses.get(frame)
    }

    /// 可变姿势引用，调用方不得改变轨道数
    pub(crate) fn pose_mut(&mut self, frame: usize) -> Option<&mut Pose> {
        self.poses.get_mut(frame)
    }

    /// 替换一帧，轨道数必须与动画一致
    pub fn set_pose(&mut self, frame: usize, pose: Pose) -> Result<()> {
        self.check_frame(frame)?;
        self.check_tracks(std::slice::from_ref(&pose))?;
        self.poses[frame] = pose;
        Ok(())
    }

    /// 检查帧索引
    pub fn check_frame(&self, frame: usize) -> Result<()> {
        if frame >= self.poses.len() {
            return Err(HkaError::Validation(format!(
                "Frame {} out of range (animation has {} frames)",
                frame,
                self.poses.len()
            )));
        }
        Ok(())
    }

    /// 检查一组姿势是否与本动画的轨道数一致
    pub fn check_tracks(&self, poses: &[Pose]) -> Result<()> {
        check_tracks(poses, self.num_transforms, self.num_floats)
    }
}

fn check_tracks(poses: &[Pose], num_transforms: usize, num_floats: usize) -> Result<()> {
    for (i, pose) in poses.iter().enumerate() {
        if pose.transforms.len() != num_transforms || pose.floats.len() != num_floats {
            return Err(HkaError::Validation(format!(
                "Pose {} has {} transforms / {} floats, expected {} / {}",
                i,
                pose.transforms.len(),
                pose.floats.len(),
                num_transforms,
                num_floats
            )));
        }
    }
    Ok(())
}
