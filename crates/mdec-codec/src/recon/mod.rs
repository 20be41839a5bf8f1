//! 图像重建引擎.
//!
//! 把系数码字序列重建为像素平面, 并提供 RGB 与平面 YUV 输出.
//! 两套数值策略: [`MdecDecoderInt`] 为定点/整数路径 (贴近硬件),
//! [`MdecDecoderDouble`] 为 f64 浮点路径 (参考精度, 可选上采样核).

mod float;
mod idct;
mod int;
mod tables;
mod upsample;

pub use float::MdecDecoderDouble;
pub use int::MdecDecoderInt;
pub use tables::PSX_QUANT_MATRIX;
pub use upsample::ChromaUpsample;

use mdec_core::{MdecError, MdecResult};

use crate::context::BlockRole;
use crate::source::MdecCodeSource;

/// 重建引擎公共接口
///
/// 引擎按固定帧尺寸构造, 平面缓冲区一次分配, 每次 `decode` 覆写.
/// 解码中途出错时, 未完成的块保持零值, 错误原样返回.
pub trait MdecDecoder {
    /// 帧宽 (像素, 裁剪后)
    fn width(&self) -> u32;

    /// 帧高 (像素, 裁剪后)
    fn height(&self) -> u32;

    /// 替换量化矩阵 (行主序, 拷贝存储)
    fn set_quant_table(&mut self, table: &[u8; 64]);

    /// 解码一帧码字到内部平面
    fn decode(&mut self, src: &mut dyn MdecCodeSource) -> MdecResult<()>;

    /// 读出交错 RGB24
    ///
    /// `dst_offset` 与 `dst_stride` 以像素计, 支持写入更大的画布.
    fn read_rgb(&self, dst: &mut [u8], dst_offset: usize, dst_stride: usize) -> MdecResult<()>;

    /// 读出控制台色彩空间的平面 YUV 4:2:0 (样本 +128)
    ///
    /// 布局: Y 平面, Cb 半分辨率平面, Cr 半分辨率平面.
    /// 要求帧宽高均为偶数.
    fn read_psx_yuv420(&self, dst: &mut [u8]) -> MdecResult<()>;

    /// 读出 Rec.601 限定范围的平面 YUV 4:2:0
    fn read_rec601_yuv420(&self, dst: &mut [u8]) -> MdecResult<()>;
}

/// 帧几何: 裁剪尺寸与宏块网格
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub mbs_wide: usize,
    pub mbs_high: usize,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32) -> MdecResult<Self> {
        if width == 0 || height == 0 {
            return Err(MdecError::InvalidArgument(format!(
                "帧尺寸 {}x{} 无效",
                width, height,
            )));
        }
        Ok(Self {
            width,
            height,
            mbs_wide: width.div_ceil(16) as usize,
            mbs_high: height.div_ceil(16) as usize,
        })
    }

    pub fn macroblock_count(&self) -> usize {
        self.mbs_wide * self.mbs_high
    }

    /// 亮度平面宽度 (取整到宏块)
    pub fn luma_width(&self) -> usize {
        self.mbs_wide * 16
    }

    pub fn luma_height(&self) -> usize {
        self.mbs_high * 16
    }

    pub fn chroma_width(&self) -> usize {
        self.mbs_wide * 8
    }

    pub fn chroma_height(&self) -> usize {
        self.mbs_high * 8
    }

    /// 宏块左上角像素坐标 (列主序)
    pub fn macroblock_origin(&self, mb: usize) -> (usize, usize) {
        let x = (mb / self.mbs_high) * 16;
        let y = (mb % self.mbs_high) * 16;
        (x, y)
    }

    /// 块在所属平面内的起始偏移与步长
    pub fn block_origin(&self, mb: usize, role: BlockRole) -> (usize, usize) {
        let (mx, my) = self.macroblock_origin(mb);
        match role {
            BlockRole::Cr | BlockRole::Cb => {
                ((my / 2) * self.chroma_width() + mx / 2, self.chroma_width())
            }
            BlockRole::Y1 => (my * self.luma_width() + mx, self.luma_width()),
            BlockRole::Y2 => (my * self.luma_width() + mx + 8, self.luma_width()),
            BlockRole::Y3 => ((my + 8) * self.luma_width() + mx, self.luma_width()),
            BlockRole::Y4 => ((my + 8) * self.luma_width() + mx + 8, self.luma_width()),
        }
    }
}

/// 校验 RGB 输出缓冲区
pub(crate) fn check_rgb_dst(
    dst_len: usize,
    width: u32,
    height: u32,
    dst_offset: usize,
    dst_stride: usize,
) -> MdecResult<()> {
    let (w, h) = (width as usize, height as usize);
    if dst_stride < w {
        return Err(MdecError::InvalidArgument(format!(
            "RGB 步长 {} 小于帧宽 {}",
            dst_stride, w,
        )));
    }
    let last = dst_offset + (h - 1) * dst_stride + w;
    if last * 3 > dst_len {
        return Err(MdecError::InvalidArgument(format!(
            "RGB 缓冲区不足: 需要 {} 字节, 实际 {} 字节",
            last * 3,
            dst_len,
        )));
    }
    Ok(())
}

/// 校验平面 YUV 输出缓冲区与尺寸约束
pub(crate) fn check_planar_dst(dst_len: usize, width: u32, height: u32) -> MdecResult<()> {
    if width % 2 != 0 || height % 2 != 0 {
        return Err(MdecError::InvalidArgument(format!(
            "平面输出要求偶数尺寸, 实际 {}x{}",
            width, height,
        )));
    }
    let needed = (width as usize * height as usize) * 3 / 2;
    if dst_len < needed {
        return Err(MdecError::InvalidArgument(format!(
            "YUV 缓冲区不足: 需要 {} 字节, 实际 {} 字节",
            needed, dst_len,
        )));
    }
    Ok(())
}

/// 反量化前的一个块: 量化比例与 (矩阵下标, 原始电平) 列表
#[derive(Debug)]
pub(crate) struct RawBlock {
    pub qscale: u8,
    pub coeffs: Vec<(usize, i32)>,
}

/// 从码字来源读完一个块 (DC 码字到 EOD)
///
/// 负责 zig-zag 位置推进与越界检查; 零电平码字照常推进位置但
/// 不产生系数.
pub(crate) fn read_raw_block(
    src: &mut dyn MdecCodeSource,
    mb: usize,
    origin: (usize, usize),
    role: BlockRole,
) -> MdecResult<RawBlock> {
    use crate::code::MdecCode;

    let mut code = MdecCode::default();
    src.next_code(&mut code)?;
    let qscale = code.top6();
    let mut block = RawBlock {
        qscale,
        coeffs: Vec::with_capacity(16),
    };
    if code.bottom10() != 0 {
        block.coeffs.push((0, i32::from(code.bottom10())));
    }

    let mut pos = 0usize;
    loop {
        if src.next_code(&mut code)? {
            return Ok(block);
        }
        pos += usize::from(code.top6()) + 1;
        if pos > 63 {
            return Err(MdecError::ReadCorruption(format!(
                "宏块 {} (像素 {},{}) 块 {}: 系数位置 {} 超出 63",
                mb, origin.0, origin.1, role, pos,
            )));
        }
        if code.bottom10() != 0 {
            block
                .coeffs
                .push((tables::ZIGZAG_TO_MATRIX[pos], i32::from(code.bottom10())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_rounds_up() {
        let geo = FrameGeometry::new(24, 17).unwrap();
        assert_eq!(geo.mbs_wide, 2);
        assert_eq!(geo.mbs_high, 2);
        assert_eq!(geo.macroblock_count(), 4);
        assert_eq!(geo.luma_width(), 32);
        assert_eq!(geo.chroma_width(), 16);
    }

    #[test]
    fn test_block_origin_column_major() {
        let geo = FrameGeometry::new(32, 32).unwrap();
        // 宏块 1 在第一列第二行 (0, 16)
        let (off, stride) = geo.block_origin(1, BlockRole::Y1);
        assert_eq!(stride, 32);
        assert_eq!(off, 16 * 32);
        // 宏块 2 在第二列第一行 (16, 0)
        let (off, _) = geo.block_origin(2, BlockRole::Y1);
        assert_eq!(off, 16);
        let (off, stride) = geo.block_origin(2, BlockRole::Cr);
        assert_eq!(stride, 16);
        assert_eq!(off, 8);
        // Y4 在宏块内偏移 (8, 8)
        let (off, _) = geo.block_origin(0, BlockRole::Y4);
        assert_eq!(off, 8 * 32 + 8);
    }

    #[test]
    fn test_rgb_dst_checks() {
        assert!(check_rgb_dst(16 * 16 * 3, 16, 16, 0, 16).is_ok());
        assert!(check_rgb_dst(16 * 16 * 3 - 1, 16, 16, 0, 16).is_err());
        assert!(check_rgb_dst(1 << 20, 16, 16, 0, 8).is_err(), "步长过小");
    }

    #[test]
    fn test_planar_dst_checks() {
        assert!(check_planar_dst(16 * 16 * 3 / 2, 16, 16).is_ok());
        assert!(check_planar_dst(1 << 20, 15, 16).is_err(), "奇数宽度");
    }

    #[test]
    fn test_raw_block_overflow_reports_pixel_position() {
        use crate::code::MdecCode;
        use crate::source::CodeListSource;

        // 32x16 帧的宏块 1 位于 (16, 0); 两个 (63, 1) 必然越界
        let geo = FrameGeometry::new(32, 16).unwrap();
        let mut src = CodeListSource::new(vec![
            MdecCode::new(1, 0).unwrap(),
            MdecCode::new(63, 1).unwrap(),
            MdecCode::new(63, 1).unwrap(),
            MdecCode::end_of_data(),
        ]);
        let err = read_raw_block(&mut src, 1, geo.macroblock_origin(1), BlockRole::Y1)
            .unwrap_err();
        assert!(matches!(err, MdecError::ReadCorruption(_)));
        assert!(
            err.to_string().contains("像素 16,0"),
            "错误应携带像素坐标: {}",
            err,
        );
    }
}
