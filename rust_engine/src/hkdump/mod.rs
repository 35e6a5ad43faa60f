//! hkdump 二进制格式
//!
//! 骨骼文件（skeleton.bin）和动画文件（anim.bin）共用同一个头部：
//! 以换行结尾的 ASCII 头字符串、uint32 版本号、int32 骨骼块数量，
//! 然后是各骨骼块、int32 动画块数量和各动画块。全部小端序。

mod animation_file;
mod codec;
mod scratch;
mod skeleton_file;

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{HkaError, Result};
use codec::{truncated, ReadHkdumpExt, WriteHkdumpExt};

pub use scratch::{read_pose_file, read_range_file, write_pose_file, write_range_file, PoseRange};

/// 文件头字符串
pub const HEADER: &str = "hkdump File Format, Version 1.0.2.0";
/// 格式版本
pub const VERSION: u32 = 0x0100_0200;

/// 读取并校验文件头和版本，返回骨骼块数量
fn read_file_header<R: Read>(reader: &mut R) -> Result<usize> {
    let head = reader.read_terminated(b'\n', "header")?;
    if head != HEADER {
        return Err(HkaError::Format(format!("Invalid hkdump header: {:?}", head)));
    }

    let version = reader
        .read_u32::<LittleEndian>()
        .map_err(truncated("version"))?;
    if version != VERSION {
        return Err(HkaError::Format(format!(
            "Version mismatch: expected {:#010x}, found {:#010x}",
            VERSION, version
        )));
    }

    reader.read_count("skeleton count")
}

fn write_file_header<W: Write>(writer: &mut W, skeleton_count: usize) -> Result<()> {
    writer.write_terminated(HEADER, b'\n')?;
    writer.write_u32::<LittleEndian>(VERSION)?;
    writer.write_count(skeleton_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_round_trip() {
        let mut bytes = Vec::new();
        write_file_header(&mut bytes, 1).unwrap();
        assert!(bytes.starts_with(b"hkdump File Format, Version 1.0.2.0\n"));
        assert_eq!(read_file_header(&mut Cursor::new(&bytes)).unwrap(), 1);
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let mut bytes = b"not an hkdump file\n".to_vec();
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        let result = read_file_header(&mut Cursor::new(&bytes));
        assert!(matches!(result, Err(HkaError::Format(_))));
    }

    #[test]
    fn test_bad_version_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(HEADER.as_bytes());
        bytes.push(b'\n');
        bytes.extend_from_slice(&0x0100_0100u32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        let result = read_file_header(&mut Cursor::new(&bytes));
        assert!(matches!(result, Err(HkaError::Format(_))));
    }
}
