//! 动画系统
//!
//! 提供逐帧姿势数据、补丁烘焙（整段 / 区间插值）和帧区间编辑。

mod bake;
mod clip;
mod easing;
mod frames;
mod pose;

pub use bake::{apply_patch_to_animation, make_to_animation};
pub use clip::{Animation, DefaultMotion, MotionTrailer};
pub use easing::Interpolation;
pub use pose::{Annotation, Pose};
