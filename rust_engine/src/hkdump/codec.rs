//! hkdump 基本数据块的读写

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use encoding_rs::SHIFT_JIS;
use glam::{Quat, Vec3, Vec4};

use crate::animation::Pose;
use crate::skeleton::Transform;
use crate::{HkaError, Result};

/// 字符串最大长度，防止损坏文件导致无限读取
const MAX_STRING_LEN: usize = 1 << 16;

/// 预分配上限，数量字段损坏时避免一次性申请巨大内存
const MAX_PREALLOC: usize = 4096;

/// 读取失败统一转换为格式错误
pub(crate) fn truncated(what: &'static str) -> impl FnOnce(io::Error) -> HkaError {
    move |e| HkaError::Format(format!("Failed to read {}: {}", what, e))
}

pub(crate) fn with_capacity<T>(count: usize) -> Vec<T> {
    Vec::with_capacity(count.min(MAX_PREALLOC))
}

/// hkdump 读取扩展
pub(crate) trait ReadHkdumpExt: Read {
    /// 读取 int32 数量字段，负数视为格式错误
    fn read_count(&mut self, what: &'static str) -> Result<usize> {
        let count = self.read_i32::<LittleEndian>().map_err(truncated(what))?;
        if count < 0 {
            return Err(HkaError::Format(format!("Negative {}: {}", what, count)));
        }
        Ok(count as usize)
    }

    /// 读取以 `terminator` 结尾的字符串
    fn read_terminated(&mut self, terminator: u8, what: &'static str) -> Result<String> {
        let bytes = self.read_terminated_bytes(terminator, what)?;
        Ok(decode_string(&bytes))
    }

    /// 读取以 `terminator` 结尾的原始字节（不含结束符）
    fn read_terminated_bytes(&mut self, terminator: u8, what: &'static str) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            let b = self.read_u8().map_err(truncated(what))?;
            if b == terminator {
                break;
            }
            if bytes.len() >= MAX_STRING_LEN {
                return Err(HkaError::Format(format!("Unterminated {}", what)));
            }
            bytes.push(b);
        }
        Ok(bytes)
    }

    /// 读取 C 字符串，同时返回解码后的文本和原始字节
    fn read_legacy_cstring(&mut self, what: &'static str) -> Result<(String, Vec<u8>)> {
        let bytes = self.read_terminated_bytes(0, what)?;
        Ok((decode_string(&bytes), bytes))
    }

    fn read_f32_le(&mut self, what: &'static str) -> Result<f32> {
        self.read_f32::<LittleEndian>().map_err(truncated(what))
    }

    fn read_vec4(&mut self, what: &'static str) -> Result<Vec4> {
        let x = self.read_f32_le(what)?;
        let y = self.read_f32_le(what)?;
        let z = self.read_f32_le(what)?;
        let w = self.read_f32_le(what)?;
        Ok(Vec4::new(x, y, z, w))
    }

    fn read_quat(&mut self, what: &'static str) -> Result<Quat> {
        let v = self.read_vec4(what)?;
        Ok(Quat::from_xyzw(v.x, v.y, v.z, v.w))
    }

    /// 变换块：平移 vec4 + 四元数 + 缩放 vec4（取 z 分量）
    fn read_transform(&mut self) -> Result<Transform> {
        let translation = self.read_vec4("transform translation")?;
        let rotation = self.read_quat("transform rotation")?;
        let scale = self.read_vec4("transform scale")?;
        Ok(Transform::new(
            Vec3::new(translation.x, translation.y, translation.z),
            rotation,
            scale.z,
        ))
    }

    /// 姿势块：float32 时间 + 变换 + 浮点值
    fn read_pose(&mut self, num_transforms: usize, num_floats: usize) -> Result<Pose> {
        let time = self.read_f32_le("pose time")?;

        let mut transforms = with_capacity(num_transforms);
        for _ in 0..num_transforms {
            transforms.push(self.read_transform()?);
        }

        let mut floats = with_capacity(num_floats);
        for _ in 0..num_floats {
            floats.push(self.read_f32_le("pose float")?);
        }

        Ok(Pose::new(time, transforms, floats))
    }
}

impl<R: Read + ?Sized> ReadHkdumpExt for R {}

/// hkdump 写入扩展
pub(crate) trait WriteHkdumpExt: Write {
    fn write_count(&mut self, count: usize) -> Result<()> {
        let count = i32::try_from(count)
            .map_err(|_| HkaError::Validation(format!("Count {} does not fit in int32", count)))?;
        self.write_i32::<LittleEndian>(count)?;
        Ok(())
    }

    fn write_terminated(&mut self, s: &str, terminator: u8) -> Result<()> {
        self.write_all(&encode_string(s))?;
        self.write_u8(terminator)?;
        Ok(())
    }

    fn write_cstring(&mut self, s: &str) -> Result<()> {
        self.write_terminated(s, 0)
    }

    /// 写入 C 字符串
    ///
    /// `raw` 解码后仍等于 `text` 时原样写回读入的字节，
    /// 否则（新建或改过名的文本）重新编码。
    fn write_legacy_cstring(&mut self, text: &str, raw: &[u8]) -> Result<()> {
        if !raw.is_empty() && decode_string(raw) == text {
            self.write_all(raw)?;
            self.write_u8(0)?;
            Ok(())
        } else {
            self.write_cstring(text)
        }
    }

    fn write_vec4(&mut self, v: Vec4) -> Result<()> {
        self.write_f32::<LittleEndian>(v.x)?;
        self.write_f32::<LittleEndian>(v.y)?;
        self.write_f32::<LittleEndian>(v.z)?;
        self.write_f32::<LittleEndian>(v.w)?;
        Ok(())
    }

    fn write_quat(&mut self, q: Quat) -> Result<()> {
        self.write_vec4(Vec4::new(q.x, q.y, q.z, q.w))
    }

    fn write_transform(&mut self, t: &Transform) -> Result<()> {
        self.write_vec4(t.translation.extend(0.0))?;
        self.write_quat(t.rotation)?;
        self.write_vec4(Vec4::new(t.scale, t.scale, t.scale, 0.0))
    }

    fn write_pose(&mut self, pose: &Pose) -> Result<()> {
        self.write_f32::<LittleEndian>(pose.time)?;
        for transform in &pose.transforms {
            self.write_transform(transform)?;
        }
        for &value in &pose.floats {
            self.write_f32::<LittleEndian>(value)?;
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> WriteHkdumpExt for W {}

/// 解码旧代码页（Shift-JIS）字符串
fn decode_string(bytes: &[u8]) -> String {
    let (decoded, _, _) = SHIFT_JIS.decode(bytes);
    decoded.into_owned()
}

fn encode_string(s: &str) -> Vec<u8> {
    let (encoded, _, _) = SHIFT_JIS.encode(s);
    encoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_transform_block_is_48_bytes() {
        let t = Transform::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.5), 0.75);
        let mut bytes = Vec::new();
        bytes.write_transform(&t).unwrap();
        assert_eq!(bytes.len(), 48);

        let read = Cursor::new(&bytes).read_transform().unwrap();
        assert_eq!(read, t);
        // 缩放广播为 (s, s, s, 0)
        assert_eq!(&bytes[44..48], &0.0f32.to_le_bytes());
        assert_eq!(&bytes[40..44], &0.75f32.to_le_bytes());
    }

    #[test]
    fn test_scale_is_read_from_z_lane() {
        let mut bytes = Vec::new();
        bytes.write_vec4(Vec4::ZERO).unwrap();
        bytes.write_quat(Quat::IDENTITY).unwrap();
        bytes.write_vec4(Vec4::new(9.0, 9.0, 2.0, 9.0)).unwrap();
        let read = Cursor::new(&bytes).read_transform().unwrap();
        assert_eq!(read.scale, 2.0);
    }

    #[test]
    fn test_cstring_round_trip() {
        let mut bytes = Vec::new();
        bytes.write_cstring("NPC COM [COM ]").unwrap();
        assert_eq!(*bytes.last().unwrap(), 0);
        let (s, raw) = Cursor::new(&bytes).read_legacy_cstring("name").unwrap();
        assert_eq!(s, "NPC COM [COM ]");
        assert_eq!(raw, b"NPC COM [COM ]");
    }

    #[test]
    fn test_invalid_shift_jis_bytes_are_written_back() {
        let (text, raw) = Cursor::new(&b"caf\xe9\0"[..])
            .read_legacy_cstring("annotation")
            .unwrap();
        assert_eq!(raw, b"caf\xe9");
        assert!(text.starts_with("caf"));

        let mut bytes = Vec::new();
        bytes.write_legacy_cstring(&text, &raw).unwrap();
        assert_eq!(bytes, b"caf\xe9\0");
    }

    #[test]
    fn test_renamed_text_is_reencoded() {
        let mut bytes = Vec::new();
        bytes.write_legacy_cstring("NPC Head [Head]", b"caf\xe9").unwrap();
        assert_eq!(bytes, b"NPC Head [Head]\0");
    }

    #[test]
    fn test_negative_count_is_format_error() {
        let bytes = (-1i32).to_le_bytes();
        let result = Cursor::new(&bytes[..]).read_count("bones");
        assert!(matches!(result, Err(HkaError::Format(_))));
    }

    #[test]
    fn test_truncated_string_is_format_error() {
        let result = Cursor::new(&b"abc"[..]).read_legacy_cstring("name");
        assert!(matches!(result, Err(HkaError::Format(_))));
    }
}
