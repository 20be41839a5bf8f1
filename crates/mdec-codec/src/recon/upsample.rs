//! 色度上采样.
//!
//! 色度平面分辨率为亮度的一半, RGB 输出前需放大一倍. 浮点重建
//! 引擎支持按名称选择重采样核; 整数引擎固定使用最近邻.
//!
//! 采样坐标约定: 目标坐标 d 对应源坐标 (d + 0.5) / 2 - 0.5,
//! 卷积核权重做归一化, 越界采样取边缘值.

use std::str::FromStr;

use mdec_core::MdecError;

/// 色度上采样核
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChromaUpsample {
    /// 最近邻 (硬件行为)
    #[default]
    NearestNeighbor,
    /// 双线性 (3/4, 1/4 权重)
    Bilinear,
    /// Bell 核, 半径 1.5
    Bell,
    /// 三次 B 样条, 半径 2
    BSpline,
    /// Hermite 核, 半径 1
    Hermite,
    /// Mitchell 核 (B = C = 1/3), 半径 2
    Mitchell,
    /// Lanczos 核, 半径 3
    Lanczos3,
}

impl FromStr for ChromaUpsample {
    type Err = MdecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(ChromaUpsample::NearestNeighbor),
            "bilinear" => Ok(ChromaUpsample::Bilinear),
            "bell" => Ok(ChromaUpsample::Bell),
            "bspline" => Ok(ChromaUpsample::BSpline),
            "hermite" => Ok(ChromaUpsample::Hermite),
            "mitchell" => Ok(ChromaUpsample::Mitchell),
            "lanczos3" => Ok(ChromaUpsample::Lanczos3),
            other => Err(MdecError::InvalidArgument(format!(
                "未知的上采样核: {}",
                other,
            ))),
        }
    }
}

impl ChromaUpsample {
    /// 卷积核半径 (最近邻与双线性走专用路径)
    fn radius(self) -> f64 {
        match self {
            ChromaUpsample::NearestNeighbor => 0.0,
            ChromaUpsample::Bilinear => 1.0,
            ChromaUpsample::Bell => 1.5,
            ChromaUpsample::BSpline => 2.0,
            ChromaUpsample::Hermite => 1.0,
            ChromaUpsample::Mitchell => 2.0,
            ChromaUpsample::Lanczos3 => 3.0,
        }
    }

    /// 核函数取值
    fn weight(self, x: f64) -> f64 {
        let x = x.abs();
        match self {
            ChromaUpsample::NearestNeighbor | ChromaUpsample::Bilinear => {
                unreachable!("专用路径不经过核函数")
            }
            ChromaUpsample::Bell => {
                if x < 0.5 {
                    0.75 - x * x
                } else if x < 1.5 {
                    0.5 * (x - 1.5) * (x - 1.5)
                } else {
                    0.0
                }
            }
            ChromaUpsample::BSpline => {
                if x < 1.0 {
                    0.5 * x * x * x - x * x + 2.0 / 3.0
                } else if x < 2.0 {
                    let t = 2.0 - x;
                    t * t * t / 6.0
                } else {
                    0.0
                }
            }
            ChromaUpsample::Hermite => {
                if x < 1.0 {
                    2.0 * x * x * x - 3.0 * x * x + 1.0
                } else {
                    0.0
                }
            }
            ChromaUpsample::Mitchell => {
                const B: f64 = 1.0 / 3.0;
                const C: f64 = 1.0 / 3.0;
                if x < 1.0 {
                    ((12.0 - 9.0 * B - 6.0 * C) * x * x * x
                        + (-18.0 + 12.0 * B + 6.0 * C) * x * x
                        + (6.0 - 2.0 * B))
                        / 6.0
                } else if x < 2.0 {
                    ((-B - 6.0 * C) * x * x * x
                        + (6.0 * B + 30.0 * C) * x * x
                        + (-12.0 * B - 48.0 * C) * x
                        + (8.0 * B + 24.0 * C))
                        / 6.0
                } else {
                    0.0
                }
            }
            ChromaUpsample::Lanczos3 => {
                if x < 1e-9 {
                    1.0
                } else if x < 3.0 {
                    let a = std::f64::consts::PI * x;
                    let b = a / 3.0;
                    3.0 * a.sin() * b.sin() / (a * a)
                } else {
                    0.0
                }
            }
        }
    }

    /// 把 `sw x sh` 的平面放大到 `2sw x 2sh`
    pub(crate) fn upsample(self, src: &[f64], sw: usize, sh: usize) -> Vec<f64> {
        debug_assert_eq!(src.len(), sw * sh);
        match self {
            ChromaUpsample::NearestNeighbor => {
                let mut dst = vec![0.0; sw * sh * 4];
                for y in 0..sh * 2 {
                    for x in 0..sw * 2 {
                        dst[y * sw * 2 + x] = src[(y / 2) * sw + x / 2];
                    }
                }
                dst
            }
            ChromaUpsample::Bilinear => {
                // 水平后垂直两趟, 3/4-1/4 闭式权重, 边缘取值
                let tmp = bilinear_axis(src, sw, sh, true);
                bilinear_axis(&tmp, sw * 2, sh, false)
            }
            _ => {
                let tmp = convolve_axis(self, src, sw, sh, true);
                convolve_axis(self, &tmp, sw * 2, sh, false)
            }
        }
    }
}

/// 双线性单轴放大
///
/// 偶数目标点: 3/4 近样本 + 1/4 前一样本; 奇数目标点对称.
fn bilinear_axis(src: &[f64], w: usize, h: usize, horizontal: bool) -> Vec<f64> {
    let (dw, dh) = if horizontal { (w * 2, h) } else { (w, h * 2) };
    let mut dst = vec![0.0; dw * dh];
    let n = if horizontal { w } else { h };

    for dy in 0..dh {
        for dx in 0..dw {
            let d = if horizontal { dx } else { dy };
            let k = d / 2;
            let other = if d % 2 == 0 {
                k.saturating_sub(1)
            } else {
                (k + 1).min(n - 1)
            };
            let fetch = |i: usize| {
                if horizontal {
                    src[dy * w + i]
                } else {
                    src[i * w + dx]
                }
            };
            dst[dy * dw + dx] = 0.75 * fetch(k) + 0.25 * fetch(other);
        }
    }
    dst
}

/// 通用卷积核单轴放大
fn convolve_axis(
    kernel: ChromaUpsample,
    src: &[f64],
    w: usize,
    h: usize,
    horizontal: bool,
) -> Vec<f64> {
    let (dw, dh) = if horizontal { (w * 2, h) } else { (w, h * 2) };
    let mut dst = vec![0.0; dw * dh];
    let n = if horizontal { w } else { h } as isize;
    let radius = kernel.radius();

    for dy in 0..dh {
        for dx in 0..dw {
            let d = if horizontal { dx } else { dy };
            let center = (d as f64 + 0.5) / 2.0 - 0.5;
            let lo = (center - radius).ceil() as isize;
            let hi = (center + radius).floor() as isize;

            let mut acc = 0.0;
            let mut total = 0.0;
            for j in lo..=hi {
                let weight = kernel.weight(center - j as f64);
                if weight == 0.0 {
                    continue;
                }
                let clamped = j.clamp(0, n - 1) as usize;
                let sample = if horizontal {
                    src[dy * w + clamped]
                } else {
                    src[clamped * w + dx]
                };
                acc += weight * sample;
                total += weight;
            }
            dst[dy * dw + dx] = if total != 0.0 { acc / total } else { 0.0 };
        }
    }
    dst
}
