//! 动画文件（anim.bin）

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, ErrorKind, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::animation::{Animation, Annotation, DefaultMotion, MotionTrailer};
use crate::{HkaError, Result};

use super::codec::{truncated, with_capacity, ReadHkdumpExt, WriteHkdumpExt};
use super::{read_file_header, write_file_header};

/// 根运动数据的帧类型
const FRAME_TYPE_DEFAULT: i32 = 1;

impl Animation {
    /// 从文件加载动画
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        Self::load_from_reader(&mut reader)
    }

    /// 从字节切片加载动画
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(bytes);
        Self::load_from_reader(&mut reader)
    }

    /// 从 Reader 加载动画，要求 0 个骨骼块和 1 个动画块
    pub fn load_from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let skeleton_count = read_file_header(reader)?;
        if skeleton_count != 0 {
            return Err(HkaError::Format(format!(
                "#skeletons should be 0 but {}",
                skeleton_count
            )));
        }

        let animation_count = reader.read_count("animation count")?;
        if animation_count != 1 {
            return Err(HkaError::Format(format!(
                "#animations should be 1 but {}",
                animation_count
            )));
        }

        let animation = read_animation_block(reader)?;
        log::info!(
            "动画加载完成: {} 帧, {:.3} 秒, {} 条骨骼轨道, {} 条浮点轨道",
            animation.num_frames(),
            animation.duration,
            animation.num_transforms(),
            animation.num_floats()
        );
        Ok(animation)
    }

    /// 序列化为 anim.bin
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
        log::info!("动画已保存: {}", path.as_ref().display());
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.check_tracks(self.poses())?;
        write_file_header(writer, 0)?;
        writer.write_count(1)?;
        write_animation_block(writer, self)
    }
}

fn read_animation_block<R: Read>(reader: &mut R) -> Result<Animation> {
    let num_frames = reader.read_count("frame count")?;
    let duration = reader.read_f32_le("duration")?;
    let num_transforms = reader.read_count("transform track count")?;
    let num_floats = reader.read_count("float track count")?;

    let mut poses = with_capacity(num_frames);
    for _ in 0..num_frames {
        poses.push(reader.read_pose(num_transforms, num_floats)?);
    }

    let mut animation = Animation::new(duration, num_transforms, num_floats, poses)?;

    let track_count = reader.read_count("annotation track count")?;
    for track in 0..track_count {
        let annotations = read_annotations(reader)?;
        if track == 0 {
            animation.annotations = annotations;
        } else if !annotations.is_empty() {
            log::warn!(
                "注释轨道 {} 含 {} 条注释，只保留第一条轨道",
                track,
                annotations.len()
            );
        }
    }
    animation.annotation_track_count = track_count;
    animation.motion = read_motion_trailer(reader)?;

    Ok(animation)
}

fn read_annotations<R: Read>(reader: &mut R) -> Result<Vec<Annotation>> {
    let count = reader.read_count("annotation count")?;
    let mut annotations = with_capacity(count);
    for _ in 0..count {
        let time = reader.read_f32_le("annotation time")?;
        let (text, raw_text) = reader.read_legacy_cstring("annotation text")?;
        annotations.push(Annotation::with_raw_text(time, text, raw_text));
    }
    Ok(annotations)
}

fn read_motion_trailer<R: Read>(reader: &mut R) -> Result<MotionTrailer> {
    let flag = match reader.read_u8() {
        Ok(flag) => flag,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(MotionTrailer::Missing),
        Err(e) => return Err(truncated("extracted motion flag")(e)),
    };

    match flag {
        0 => Ok(MotionTrailer::None),
        1 => Ok(MotionTrailer::Extracted(read_default_motion(reader)?)),
        other => Err(HkaError::Format(format!(
            "Invalid extracted motion flag: {}",
            other
        ))),
    }
}

fn read_default_motion<R: Read>(reader: &mut R) -> Result<DefaultMotion> {
    let frame_type = reader
        .read_i32::<LittleEndian>()
        .map_err(truncated("motion frame type"))?;
    if frame_type != FRAME_TYPE_DEFAULT {
        return Err(HkaError::Format(format!(
            "Unsupported motion frame type: {}",
            frame_type
        )));
    }

    let up = reader.read_vec4("motion up")?;
    let forward = reader.read_vec4("motion forward")?;
    let duration = reader.read_f32_le("motion duration")?;

    let count = reader.read_count("reference frame sample count")?;
    let mut reference_frame_samples = with_capacity(count);
    for _ in 0..count {
        reference_frame_samples.push(reader.read_vec4("reference frame sample")?);
    }

    Ok(DefaultMotion {
        up,
        forward,
        duration,
        reference_frame_samples,
    })
}

fn write_animation_block<W: Write>(writer: &mut W, animation: &Animation) -> Result<()> {
    writer.write_count(animation.num_frames())?;
    writer.write_f32::<LittleEndian>(animation.duration)?;
    writer.write_count(animation.num_transforms())?;
    writer.write_count(animation.num_floats())?;

    for pose in animation.poses() {
        writer.write_pose(pose)?;
    }

    // 有注释但声明的轨道数为 0 时至少写一条轨道
    let track_count = if animation.annotations.is_empty() {
        animation.annotation_track_count
    } else {
        animation.annotation_track_count.max(1)
    };
    writer.write_count(track_count)?;
    for track in 0..track_count {
        if track == 0 {
            writer.write_count(animation.annotations.len())?;
            for annotation in &animation.annotations {
                writer.write_f32::<LittleEndian>(annotation.time)?;
                writer.write_legacy_cstring(&annotation.text, &annotation.raw_text)?;
            }
        } else {
            writer.write_count(0)?;
        }
    }

    match &animation.motion {
        MotionTrailer::Missing => {}
        MotionTrailer::None => writer.write_u8(0)?,
        MotionTrailer::Extracted(motion) => {
            writer.write_u8(1)?;
            writer.write_i32::<LittleEndian>(FRAME_TYPE_DEFAULT)?;
            writer.write_vec4(motion.up)?;
            writer.write_vec4(motion.forward)?;
            writer.write_f32::<LittleEndian>(motion.duration)?;
            writer.write_count(motion.reference_frame_samples.len())?;
            for &sample in &motion.reference_frame_samples {
                writer.write_vec4(sample)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Pose;
    use crate::skeleton::Transform;
    use glam::{Quat, Vec3, Vec4};

    fn header(skeletons: i32, animations: i32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"hkdump File Format, Version 1.0.2.0\n");
        bytes.extend_from_slice(&0x0100_0200u32.to_le_bytes());
        bytes.extend_from_slice(&skeletons.to_le_bytes());
        bytes.extend_from_slice(&animations.to_le_bytes());
        bytes
    }

    /// 1 帧、1 条骨骼轨道、0 条浮点轨道、0 条注释的最小动画
    fn minimal_bytes() -> Vec<u8> {
        let mut bytes = header(0, 1);
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&(1.0f32 / 30.0).to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
        for v in [0.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes
    }

    #[test]
    fn test_minimal_round_trip() {
        let bytes = minimal_bytes();
        let animation = Animation::from_bytes(&bytes).unwrap();
        assert_eq!(animation.num_frames(), 1);
        assert_eq!(animation.num_transforms(), 1);
        assert_eq!(animation.num_floats(), 0);
        assert!(animation.annotations.is_empty());
        assert_eq!(animation.motion, MotionTrailer::Missing);
        assert_eq!(animation.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_round_trip_with_annotations_and_motion() {
        let poses = (0..3)
            .map(|f| {
                Pose::new(
                    f as f32 * 0.5,
                    vec![
                        Transform::new(Vec3::new(f as f32, 1.0, 2.0), Quat::from_rotation_y(0.2), 1.0),
                        Transform::IDENTITY,
                    ],
                    vec![0.25 * f as f32],
                )
            })
            .collect();
        let mut animation = Animation::new(1.5, 2, 1, poses).unwrap();
        animation.annotations = vec![Annotation::new(0.5, "SoundPlay.NPCFootstep")];
        animation.annotation_track_count = 2;
        animation.motion = MotionTrailer::Extracted(DefaultMotion {
            up: Vec4::new(0.0, 0.0, 1.0, 0.0),
            forward: Vec4::new(0.0, 1.0, 0.0, 0.0),
            duration: 1.5,
            reference_frame_samples: vec![Vec4::ZERO, Vec4::new(0.0, 10.0, 0.0, 0.0)],
        });

        let bytes = animation.to_bytes().unwrap();
        let loaded = Animation::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, animation);
        assert_eq!(loaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_non_shift_jis_annotation_round_trip() {
        let mut bytes = minimal_bytes();
        bytes.truncate(bytes.len() - 4);
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
        bytes.extend_from_slice(b"caf\xe9\0");

        let animation = Animation::from_bytes(&bytes).unwrap();
        assert_eq!(animation.annotations.len(), 1);
        let out = animation.to_bytes().unwrap();
        assert!(out.ends_with(&[99, 97, 102, 233, 0]));
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_broken_track_count_is_not_written() {
        let mut animation = Animation::from_bytes(&minimal_bytes()).unwrap();
        animation.pose_mut(0).unwrap().transforms.clear();
        assert!(matches!(animation.to_bytes(), Err(HkaError::Validation(_))));
    }

    #[test]
    fn test_motion_flag_zero_is_preserved() {
        let mut bytes = minimal_bytes();
        bytes.push(0);
        let animation = Animation::from_bytes(&bytes).unwrap();
        assert_eq!(animation.motion, MotionTrailer::None);
        assert_eq!(animation.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_pose_time_is_kept_verbatim() {
        let mut bytes = minimal_bytes();
        let time_offset = header(0, 1).len() + 16;
        bytes[time_offset..time_offset + 4].copy_from_slice(&42.5f32.to_le_bytes());
        let animation = Animation::from_bytes(&bytes).unwrap();
        assert_eq!(animation.pose(0).unwrap().time, 42.5);
        assert_eq!(animation.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_block_counts_are_checked() {
        let mut bytes = minimal_bytes();
        bytes[header(0, 1).len() - 8..header(0, 1).len() - 4].copy_from_slice(&1i32.to_le_bytes());
        assert!(matches!(Animation::from_bytes(&bytes), Err(HkaError::Format(_))));

        let mut bytes = minimal_bytes();
        bytes[header(0, 1).len() - 4..header(0, 1).len()].copy_from_slice(&2i32.to_le_bytes());
        assert!(matches!(Animation::from_bytes(&bytes), Err(HkaError::Format(_))));
    }

    #[test]
    fn test_truncated_pose_is_rejected() {
        let bytes = minimal_bytes();
        let result = Animation::from_bytes(&bytes[..bytes.len() - 10]);
        assert!(matches!(result, Err(HkaError::Format(_))));
    }
}
