//! 骨骼层级

use std::collections::HashMap;

use crate::animation::Pose;
use crate::{HkaError, Result};

use super::{Bone, BonePatch, Transform};

/// 骨骼
///
/// 以扁平数组保存所有骨骼，父子关系使用索引。
#[derive(Clone, Debug)]
pub struct Skeleton {
    pub name: String,
    pub(crate) name_bytes: Vec<u8>,
    bones: Vec<Bone>,
    parent_indices: Vec<i16>,
    reference_pose: Vec<Transform>,
    pub reference_floats: Vec<f32>,
    pub float_slots: Vec<String>,
    pub(crate) float_slot_bytes: Vec<Vec<u8>>,
    name_to_index: HashMap<String, usize>,
}

impl Skeleton {
    /// 构建骨骼层级
    ///
    /// 骨骼名、父索引和参考姿势数量必须一致，父索引必须为 -1 或合法且无环。
    pub fn new(
        name: String,
        bone_names: Vec<String>,
        parent_indices: Vec<i16>,
        reference_pose: Vec<Transform>,
    ) -> Result<Self> {
        let bone_count = bone_names.len();
        if parent_indices.len() != bone_count || reference_pose.len() != bone_count {
            return Err(HkaError::Format(format!(
                "Bone count mismatch: {} bones, {} parent indices, {} reference transforms",
                bone_count,
                parent_indices.len(),
                reference_pose.len()
            )));
        }

        validate_parents(&parent_indices)?;

        let mut bones: Vec<Bone> = bone_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Bone::new(name, i))
            .collect();

        for i in 0..bone_count {
            let parent_idx = parent_indices[i];
            if parent_idx >= 0 {
                let parent_idx = parent_idx as usize;
                bones[i].parent = Some(parent_idx);
                bones[parent_idx].children.push(i);
            } else if i != 0 {
                // 根以外没有父骨骼的是相机 / 挂点骨骼
                bones[i].hidden = true;
            }
            bones[i].local = reference_pose[i];
            bones[i].patch = BonePatch::IDENTITY;
        }

        // NPC Root 不显示
        if let Some(root) = bones.first_mut() {
            root.hidden = true;
        }

        let name_to_index = bones
            .iter()
            .map(|bone| (bone.name.clone(), bone.index))
            .collect();

        Ok(Self {
            name,
            name_bytes: Vec::new(),
            bones,
            parent_indices,
            reference_pose,
            reference_floats: Vec::new(),
            float_slots: Vec::new(),
            float_slot_bytes: Vec::new(),
            name_to_index,
        })
    }

    /// 获取骨骼数量
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// 获取骨骼
    pub fn get_bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// 获取可变骨骼引用
    pub fn get_bone_mut(&mut self, index: usize) -> Option<&mut Bone> {
        self.bones.get_mut(index)
    }

    /// 通过名称查找骨骼
    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn parent_indices(&self) -> &[i16] {
        &self.parent_indices
    }

    pub fn reference_pose(&self) -> &[Transform] {
        &self.reference_pose
    }

    pub fn children_of(&self, index: usize) -> &[usize] {
        self.bones
            .get(index)
            .map(|bone| bone.children.as_slice())
            .unwrap_or(&[])
    }

    /// 没有父骨骼的骨骼索引
    pub fn root_indices(&self) -> Vec<usize> {
        self.bones
            .iter()
            .filter(|bone| bone.parent.is_none())
            .map(|bone| bone.index)
            .collect()
    }

    /// 计算世界变换（包含未烘焙的补丁）
    ///
    /// 从骨骼自身沿父骨骼向上合成 `local * patch`，每次调用都重新计算。
    pub fn world_transform(&self, index: usize) -> Transform {
        let mut world = Transform::IDENTITY;
        let mut current = self.bones.get(index);
        while let Some(bone) = current {
            world = bone.patched_local().compose(&world);
            current = bone.parent.and_then(|p| self.bones.get(p));
        }
        world
    }

    /// 把姿势写入各骨骼的本地变换
    pub fn assign_pose(&mut self, pose: &Pose) {
        for (bone, transform) in self.bones.iter_mut().zip(&pose.transforms) {
            bone.local = *transform;
        }
    }

    /// 恢复参考姿势
    pub fn reset_to_reference_pose(&mut self) {
        for (bone, transform) in self.bones.iter_mut().zip(&self.reference_pose) {
            bone.local = *transform;
        }
    }

    /// 清除所有补丁
    pub fn clear_patches(&mut self) {
        for bone in &mut self.bones {
            bone.reset_patch();
        }
    }

    /// 是否存在未烘焙的补丁
    pub fn has_patches(&self) -> bool {
        self.bones.iter().any(Bone::is_patched)
    }

    /// 各骨骼补丁的快照（按骨骼索引）
    pub fn patches(&self) -> Vec<BonePatch> {
        self.bones.iter().map(|bone| bone.patch).collect()
    }
}

/// 检查父索引范围并确保不存在环
fn validate_parents(parent_indices: &[i16]) -> Result<()> {
    let count = parent_indices.len();
    for (i, &parent) in parent_indices.iter().enumerate() {
        if parent < -1 || (parent >= 0 && parent as usize >= count) {
            return Err(HkaError::Format(format!(
                "Bone {} has invalid parent index {}",
                i, parent
            )));
        }
    }

    for start in 0..count {
        let mut current = parent_indices[start];
        let mut steps = 0;
        while current >= 0 {
            steps += 1;
            if steps > count {
                return Err(HkaError::Format(format!(
                    "Parent chain of bone {} contains a cycle",
                    start
                )));
            }
            current = parent_indices[current as usize];
        }
    }

    Ok(())
}
