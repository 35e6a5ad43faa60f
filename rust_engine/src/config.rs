//! 编辑器配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;
use std::sync::{PoisonError, RwLock};

/// 编辑器配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct EditorConfig {
    // ========== 拖拽步长 ==========
    /// 平移步长（每像素移动的单位），默认 0.0125
    pub translate_step: f32,
    /// 旋转步长（每像素旋转的弧度），默认 0.005
    pub rotate_step: f32,

    // ========== 临时文件 ==========
    /// 单个姿势导入导出使用的文件名，默认 "pose.bin"
    pub pose_scratch_file: String,
    /// 帧区间导入导出使用的文件名，默认 "anim.bin"
    pub animation_scratch_file: String,

    // ========== 姿势导入 ==========
    /// 导入姿势时不计算补丁的骨骼（根骨骼和重心骨骼）
    pub pass_through_bones: Vec<String>,

    // ========== 编辑检测 ==========
    /// 判断补丁是否被修改的容差
    /// 0.0 = 精确比较（与原工具一致），>0 时使用容差比较
    pub change_epsilon: f32,

    // ========== 调试 ==========
    /// 是否输出逐骨骼的烘焙日志，默认 false
    pub debug_log: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            // 鼠标每移动 1 像素，骨骼沿轴移动 0.0125 个单位
            translate_step: 0.0125,
            // 鼠标每移动 1 像素，骨骼绕轴旋转 0.005 弧度（约 0.29 度）
            rotate_step: 0.005,

            pose_scratch_file: "pose.bin".to_string(),
            animation_scratch_file: "anim.bin".to_string(),

            pass_through_bones: vec![
                "NPC Root [Root]".to_string(),
                "NPC COM [COM ]".to_string(),
            ],

            change_epsilon: 0.0,

            debug_log: false,
        }
    }
}

/// 全局配置实例
static EDITOR_CONFIG: Lazy<RwLock<EditorConfig>> = Lazy::new(|| {
    RwLock::new(EditorConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> EditorConfig {
    EDITOR_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// 手动设置配置
pub fn set_config(config: EditorConfig) {
    *EDITOR_CONFIG.write().unwrap_or_else(PoisonError::into_inner) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(EditorConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_drag_steps() {
        let config = EditorConfig::default();
        assert_eq!(config.translate_step, 0.0125);
        assert_eq!(config.rotate_step, 0.005);
        assert_eq!(config.change_epsilon, 0.0);
        assert!(config.pass_through_bones.iter().any(|n| n == "NPC COM [COM ]"));
    }
}
