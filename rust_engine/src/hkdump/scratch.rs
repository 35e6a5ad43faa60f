//! 姿势 / 帧区间临时文件
//!
//! 用于在不同动画之间复制姿势，没有文件头：
//! - 姿势文件：int32 骨骼轨道数、int32 浮点轨道数、1 个姿势块
//! - 区间文件：int32 帧数、float32 时长、int32 骨骼轨道数、int32 浮点轨道数、各姿势块

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::animation::Pose;
use crate::{HkaError, Result};

use super::codec::{with_capacity, ReadHkdumpExt, WriteHkdumpExt};

/// 导出的帧区间
#[derive(Clone, Debug, PartialEq)]
pub struct PoseRange {
    /// 区间在原动画时长中所占的份额
    pub duration: f32,
    pub num_transforms: usize,
    pub num_floats: usize,
    pub poses: Vec<Pose>,
}

/// 写入单个姿势
pub fn write_pose_file<P: AsRef<Path>>(path: P, pose: &Pose) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_pose_block(&mut writer, pose)?;
    writer.flush()?;
    log::info!("姿势已导出: {}", path.as_ref().display());
    Ok(())
}

/// 读取单个姿势
pub fn read_pose_file<P: AsRef<Path>>(path: P) -> Result<Pose> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    read_pose_block(&mut reader)
}

/// 写入帧区间
///
/// 轨道数不一致时返回 `Validation`，不创建也不截断文件。
pub fn write_range_file<P: AsRef<Path>>(path: P, range: &PoseRange) -> Result<()> {
    check_range(range)?;
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_range_block(&mut writer, range)?;
    writer.flush()?;
    log::info!(
        "帧区间已导出: {} ({} 帧)",
        path.as_ref().display(),
        range.poses.len()
    );
    Ok(())
}

/// 读取帧区间
pub fn read_range_file<P: AsRef<Path>>(path: P) -> Result<PoseRange> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    read_range_block(&mut reader)
}

fn write_pose_block<W: Write>(writer: &mut W, pose: &Pose) -> Result<()> {
    writer.write_count(pose.transforms.len())?;
    writer.write_count(pose.floats.len())?;
    writer.write_pose(pose)
}

fn read_pose_block<R: Read>(reader: &mut R) -> Result<Pose> {
    let num_transforms = reader.read_count("transform track count")?;
    let num_floats = reader.read_count("float track count")?;
    reader.read_pose(num_transforms, num_floats)
}

fn check_range(range: &PoseRange) -> Result<()> {
    for pose in &range.poses {
        if pose.transforms.len() != range.num_transforms || pose.floats.len() != range.num_floats {
            return Err(HkaError::Validation(format!(
                "Pose has {} transforms / {} floats, range declares {} / {}",
                pose.transforms.len(),
                pose.floats.len(),
                range.num_transforms,
                range.num_floats
            )));
        }
    }
    Ok(())
}

fn write_range_block<W: Write>(writer: &mut W, range: &PoseRange) -> Result<()> {
    check_range(range)?;
    writer.write_count(range.poses.len())?;
    writer.write_f32::<LittleEndian>(range.duration)?;
    writer.write_count(range.num_transforms)?;
    writer.write_count(range.num_floats)?;
    for pose in &range.poses {
        writer.write_pose(pose)?;
    }
    Ok(())
}

fn read_range_block<R: Read>(reader: &mut R) -> Result<PoseRange> {
    let frame_count = reader.read_count("frame count")?;
    let duration = reader.read_f32_le("duration")?;
    let num_transforms = reader.read_count("transform track count")?;
    let num_floats = reader.read_count("float track count")?;

    let mut poses = with_capacity(frame_count);
    for _ in 0..frame_count {
        poses.push(reader.read_pose(num_transforms, num_floats)?);
    }

    Ok(PoseRange {
        duration,
        num_transforms,
        num_floats,
        poses,
    })
}
