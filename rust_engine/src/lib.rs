//! HKA Engine - hkdump 骨骼/动画姿势编辑核心
//!
//! 不含渲染和界面，只包含编辑逻辑：
//! - hkdump 二进制骨骼 / 动画文件的读写（逐字节往返）
//! - 变换合成代数和骨骼层级的世界坐标计算
//! - 骨骼补丁（patch）编辑与撤销/重做
//! - 补丁烘焙到动画帧，支持线性 / 平滑插值
//! - 帧删除、插入，以及姿势 / 帧区间的导入导出

pub mod animation;
pub mod command;
pub mod config;
pub mod editor;
pub mod hkdump;
pub mod skeleton;

pub use animation::{Animation, Annotation, DefaultMotion, Interpolation, MotionTrailer, Pose};
pub use command::{BoneAttr, BoneCommand, Command, CommandManager, PendingEdit, PoseCommand};
pub use config::EditorConfig;
pub use editor::PoseEditor;
pub use skeleton::{Bone, BonePatch, RootAxis, Skeleton, Transform};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HkaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("hkdump format error: {0}")]
    Format(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, HkaError>;
