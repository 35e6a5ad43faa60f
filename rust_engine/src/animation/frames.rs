//! 帧区间编辑

use crate::{HkaError, Result};

use super::{Animation, Pose};

impl Animation {
    /// 删除闭区间 `[start_frame, to_frame]` 内的帧，时长按帧数比例缩放
    ///
    /// 要求 `start_frame < to_frame`、`to_frame` 不越界且至少保留 1 帧，
    /// 否则返回 `Validation` 错误，不修改动画。
    pub fn delete_frames(&mut self, start_frame: usize, to_frame: usize) -> Result<()> {
        if start_frame >= to_frame {
            return Err(HkaError::Validation(format!(
                "Start frame {} must be before target frame {}",
                start_frame, to_frame
            )));
        }
        self.check_frame(to_frame)?;

        let old_len = self.poses.len();
        let removed = to_frame - start_frame + 1;
        if old_len - removed < 1 {
            return Err(HkaError::Validation(format!(
                "Deleting frames {}..={} would leave an empty animation",
                start_frame, to_frame
            )));
        }

        self.poses.drain(start_frame..=to_frame);
        self.rescale_duration(old_len);

        log::info!(
            "删除帧 {}..={}: {} -> {} 帧",
            start_frame,
            to_frame,
            old_len,
            self.poses.len()
        );
        Ok(())
    }

    /// 在 `after_frame` 之后插入姿势，时长按帧数比例缩放
    ///
    /// 空动画忽略 `after_frame`，从第 0 帧开始填充，时长保持不变。
    pub fn insert_frames(&mut self, after_frame: usize, poses: Vec<Pose>) -> Result<()> {
        let at = if self.poses.is_empty() {
            0
        } else {
            self.check_frame(after_frame)?;
            after_frame + 1
        };
        self.check_tracks(&poses)?;

        let old_len = self.poses.len();
        let inserted = poses.len();
        self.poses.splice(at..at, poses);
        self.rescale_duration(old_len);

        log::info!("在帧 {} 之后插入 {} 帧", after_frame, inserted);
        Ok(())
    }

    /// 复制闭区间 `[start_frame, to_frame]` 内的帧
    pub fn frames(&self, start_frame: usize, to_frame: usize) -> Result<Vec<Pose>> {
        if start_frame > to_frame {
            return Err(HkaError::Validation(format!(
                "Start frame {} is after end frame {}",
                start_frame, to_frame
            )));
        }
        self.check_frame(to_frame)?;
        Ok(self.poses[start_frame..=to_frame].to_vec())
    }

    /// 区间在总时长中所占的份额
    pub fn range_duration(&self, frame_count: usize) -> f32 {
        if self.poses.is_empty() {
            return 0.0;
        }
        self.duration * frame_count as f32 / self.poses.len() as f32
    }

    fn rescale_duration(&mut self, old_len: usize) {
        if old_len > 0 {
            self.duration = self.duration * self.poses.len() as f32 / old_len as f32;
        }
    }
}
