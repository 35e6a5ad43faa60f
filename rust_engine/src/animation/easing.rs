//! 区间插值的缓动函数

/// 区间烘焙的插值方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    /// 线性
    Linear,
    /// 平滑（smoothstep：`r² (3 - 2r)`，两端斜率为 0）
    ///
    /// 沿用编辑器菜单里的叫法，并不是三次贝塞尔曲线。
    Bezier,
}

impl Interpolation {
    /// 把 [0, 1] 上的线性比例映射为缓动后的比例
    pub fn ease(self, ratio: f32) -> f32 {
        match self {
            Interpolation::Linear => ratio,
            Interpolation::Bezier => ratio * ratio * (3.0 - 2.0 * ratio),
        }
    }
}
