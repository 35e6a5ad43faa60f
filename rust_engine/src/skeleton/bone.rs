//! 骨骼节点

use super::{BonePatch, Transform};

/// 骨骼节点
///
/// 父子关系以索引保存，骨骼本身由 `Skeleton` 统一持有。
#[derive(Clone, Debug)]
pub struct Bone {
    pub name: String,
    /// 文件中的原始名称字节
    pub(crate) name_bytes: Vec<u8>,
    pub index: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,

    /// 不可选中（根骨骼、无父骨骼的相机 / 挂点骨骼）
    pub hidden: bool,

    /// 当前姿势的本地变换（切换帧时被覆盖）
    pub local: Transform,
    /// 未烘焙的编辑增量，烘焙后重置
    pub patch: BonePatch,
}

impl Bone {
    pub fn new(name: String, index: usize) -> Self {
        Self {
            name,
            name_bytes: Vec::new(),
            index,
            parent: None,
            children: Vec::new(),
            hidden: false,
            local: Transform::IDENTITY,
            patch: BonePatch::IDENTITY,
        }
    }

    /// 本地变换叠加补丁后的结果
    pub fn patched_local(&self) -> Transform {
        self.local.apply_patch(&self.patch)
    }

    /// 清除补丁
    pub fn reset_patch(&mut self) {
        self.patch = BonePatch::IDENTITY;
    }

    pub fn is_patched(&self) -> bool {
        !self.patch.is_identity()
    }
}
