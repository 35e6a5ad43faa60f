//! 骨骼系统：变换代数、补丁和骨骼层级

mod bone;
mod hierarchy;
mod patch;
mod transform;

pub use bone::Bone;
pub use hierarchy::Skeleton;
pub use patch::{BonePatch, RootAxis};
pub use transform::Transform;
