//! 动画帧数据

use crate::skeleton::{BonePatch, Transform};

/// 单帧姿势
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    /// 采样时间（原样保存，不参与播放）
    pub time: f32,
    /// 每条骨骼轨道一个变换
    pub transforms: Vec<Transform>,
    /// 浮点轨道值
    pub floats: Vec<f32>,
}

impl Pose {
    pub fn new(time: f32, transforms: Vec<Transform>, floats: Vec<f32>) -> Self {
        Self { time, transforms, floats }
    }

    /// 返回叠加了补丁的副本（补丁按骨骼索引对应轨道）
    pub fn with_patches(&self, patches: &[BonePatch]) -> Pose {
        let mut pose = self.clone();
        for (transform, patch) in pose.transforms.iter_mut().zip(patches) {
            if !patch.is_identity() {
                *transform = transform.apply_patch(patch);
            }
        }
        pose
    }
}

/// 注释
#[derive(Clone, Debug)]
pub struct Annotation {
    pub time: f32,
    pub text: String,
    /// 文件中的原始字节，保存时 `text` 未改动则原样写回
    pub(crate) raw_text: Vec<u8>,
}

impl Annotation {
    pub fn new(time: f32, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
            raw_text: Vec::new(),
        }
    }

    pub(crate) fn with_raw_text(time: f32, text: String, raw_text: Vec<u8>) -> Self {
        Self { time, text, raw_text }
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.text == other.text
    }
}
