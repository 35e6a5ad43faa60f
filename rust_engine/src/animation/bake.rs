//! 补丁烘焙
//!
//! 把骨骼上累积的补丁写入动画帧。补丁按骨骼索引对应骨骼轨道，
//! 超出 `min(骨骼数, 轨道数)` 的部分忽略。

use crate::skeleton::{BonePatch, Transform};
use crate::{HkaError, Result};

use super::{Animation, Interpolation};

/// 把补丁均匀烘焙到所有帧（`pose * patch`）
///
/// 返回被烘焙的骨骼数。精确为单位的补丁不参与计算。
pub fn apply_patch_to_animation(animation: &mut Animation, patches: &[BonePatch]) -> usize {
    let count = patches.len().min(animation.num_transforms());
    let mut baked = 0;

    for (i, patch) in patches.iter().enumerate().take(count) {
        if patch.is_identity() {
            continue;
        }
        for pose in &mut animation.poses {
            if let Some(transform) = pose.transforms.get_mut(i) {
                *transform = transform.apply_patch(patch);
            }
        }
        baked += 1;
    }

    log::info!(
        "补丁烘焙完成: {} 个骨骼, {} 帧",
        baked,
        animation.num_frames()
    );
    baked
}

/// 区间插值烘焙
///
/// 补丁是在预览 `to_frame` 时调出来的：
/// - `start_frame` 及之前的帧不变
/// - `(start_frame, to_frame)` 之间的帧从未打补丁的起始姿势插值到打过补丁的目标姿势，
///   旋转球面插值，平移线性插值，缩放固定为 1
/// - `to_frame` 及之后的帧均匀烘焙补丁
///
/// `start_frame >= to_frame` 或帧越界时返回 `Validation` 错误，不修改动画。
pub fn make_to_animation(
    animation: &mut Animation,
    patches: &[BonePatch],
    start_frame: usize,
    to_frame: usize,
    interpolation: Interpolation,
) -> Result<usize> {
    if start_frame >= to_frame {
        return Err(HkaError::Validation(format!(
            "Start frame {} must be before target frame {}",
            start_frame, to_frame
        )));
    }
    animation.check_frame(to_frame)?;

    let count = patches.len().min(animation.num_transforms());
    let span = (to_frame - start_frame) as f32;
    let mut baked = 0;

    for (i, patch) in patches.iter().enumerate().take(count) {
        if patch.is_identity() {
            continue;
        }

        let endpoints = animation.poses[start_frame]
            .transforms
            .get(i)
            .zip(animation.poses[to_frame].transforms.get(i));
        let Some((&from, to)) = endpoints else {
            log::warn!("骨骼 {} 缺少起始帧或目标帧的轨道，跳过", i);
            continue;
        };
        let target = to.apply_patch(patch);

        for frame in (start_frame + 1)..to_frame {
            let ratio = interpolation.ease((frame - start_frame) as f32 / span);
            if let Some(transform) = animation.poses[frame].transforms.get_mut(i) {
                *transform = Transform {
                    translation: from.translation.lerp(target.translation, ratio),
                    rotation: from.rotation.slerp(target.rotation, ratio),
                    scale: 1.0,
                };
            }
        }

        for pose in &mut animation.poses[to_frame..] {
            if let Some(transform) = pose.transforms.get_mut(i) {
                *transform = transform.apply_patch(patch);
            }
        }

        log::debug!("骨骼 {} 区间烘焙: {} -> {}", i, start_frame, to_frame);
        baked += 1;
    }

    log::info!(
        "区间烘焙完成 ({:?}): {} 个骨骼, 帧 {} -> {}",
        interpolation,
        baked,
        start_frame,
        to_frame
    );
    Ok(baked)
}
