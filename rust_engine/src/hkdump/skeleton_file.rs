//! 骨骼文件（skeleton.bin）

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::skeleton::Skeleton;
use crate::{HkaError, Result};

use super::codec::{truncated, with_capacity, ReadHkdumpExt, WriteHkdumpExt};
use super::{read_file_header, write_file_header};

impl Skeleton {
    /// 从文件加载骨骼
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        Self::load_from_reader(&mut reader)
    }

    /// 从字节切片加载骨骼
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(bytes);
        Self::load_from_reader(&mut reader)
    }

    /// 从 Reader 加载骨骼
    ///
    /// 使用第一个骨骼块，多余的骨骼块解析后丢弃。
    pub fn load_from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let skeleton_count = read_file_header(reader)?;
        if skeleton_count == 0 {
            return Err(HkaError::Format("File contains no skeleton".to_string()));
        }

        let skeleton = read_skeleton_block(reader)?;
        for _ in 1..skeleton_count {
            let extra = read_skeleton_block(reader)?;
            log::warn!("忽略多余的骨骼块: {}", extra.name);
        }

        let animation_count = reader.read_count("animation count")?;
        if animation_count != 0 {
            log::warn!("骨骼文件包含 {} 个动画块，已忽略", animation_count);
        }

        log::info!(
            "骨骼加载完成: {} ({} 个骨骼, {} 个浮点槽)",
            skeleton.name,
            skeleton.bone_count(),
            skeleton.float_slots.len()
        );
        Ok(skeleton)
    }

    /// 序列化为 skeleton.bin（1 个骨骼块，0 个动画块）
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_file_header(writer, 1)?;
        write_skeleton_block(writer, self)?;
        writer.write_count(0)
    }
}

fn read_skeleton_block<R: Read>(reader: &mut R) -> Result<Skeleton> {
    let (name, name_bytes) = reader.read_legacy_cstring("skeleton name")?;

    let parent_count = reader.read_count("parent index count")?;
    let mut parent_indices = with_capacity(parent_count);
    for _ in 0..parent_count {
        parent_indices.push(
            reader
                .read_i16::<LittleEndian>()
                .map_err(truncated("parent index"))?,
        );
    }

    let bone_count = reader.read_count("bone count")?;
    let mut bone_names = with_capacity(bone_count);
    let mut bone_name_bytes = with_capacity(bone_count);
    for _ in 0..bone_count {
        let (bone_name, raw) = reader.read_legacy_cstring("bone name")?;
        bone_names.push(bone_name);
        bone_name_bytes.push(raw);
    }

    let pose_count = reader.read_count("reference pose count")?;
    let mut reference_pose = with_capacity(pose_count);
    for _ in 0..pose_count {
        reference_pose.push(reader.read_transform()?);
    }

    let float_count = reader.read_count("reference float count")?;
    let mut reference_floats = with_capacity(float_count);
    for _ in 0..float_count {
        reference_floats.push(reader.read_f32_le("reference float")?);
    }

    let slot_count = reader.read_count("float slot count")?;
    let mut float_slots = with_capacity(slot_count);
    let mut float_slot_bytes = with_capacity(slot_count);
    for _ in 0..slot_count {
        let (slot, raw) = reader.read_legacy_cstring("float slot name")?;
        float_slots.push(slot);
        float_slot_bytes.push(raw);
    }

    let mut skeleton = Skeleton::new(name, bone_names, parent_indices, reference_pose)?;
    skeleton.name_bytes = name_bytes;
    for (index, raw) in bone_name_bytes.into_iter().enumerate() {
        if let Some(bone) = skeleton.get_bone_mut(index) {
            bone.name_bytes = raw;
        }
    }
    skeleton.reference_floats = reference_floats;
    skeleton.float_slots = float_slots;
    skeleton.float_slot_bytes = float_slot_bytes;
    Ok(skeleton)
}

fn write_skeleton_block<W: Write>(writer: &mut W, skeleton: &Skeleton) -> Result<()> {
    writer.write_legacy_cstring(&skeleton.name, &skeleton.name_bytes)?;

    writer.write_count(skeleton.parent_indices().len())?;
    for &parent in skeleton.parent_indices() {
        writer.write_i16::<LittleEndian>(parent)?;
    }

    writer.write_count(skeleton.bone_count())?;
    for bone in skeleton.bones() {
        writer.write_legacy_cstring(&bone.name, &bone.name_bytes)?;
    }

    writer.write_count(skeleton.reference_pose().len())?;
    for transform in skeleton.reference_pose() {
        writer.write_transform(transform)?;
    }

    writer.write_count(skeleton.reference_floats.len())?;
    for &value in &skeleton.reference_floats {
        writer.write_f32::<LittleEndian>(value)?;
    }

    writer.write_count(skeleton.float_slots.len())?;
    for (i, slot) in skeleton.float_slots.iter().enumerate() {
        let raw = skeleton.float_slot_bytes.get(i).map_or(&[][..], Vec::as_slice);
        writer.write_legacy_cstring(slot, raw)?;
    }
    Ok(())
}
