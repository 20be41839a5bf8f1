//! 整数重建引擎.
//!
//! 定点运算路径, 数值行为贴近控制台硬件: 反量化舍入为
//! `(p + 4) >> 3`, 定点 simple-IDCT, 最近邻色度上采样,
//! 16.16 定点色彩转换.

use mdec_core::MdecResult;

use crate::context::BlockRole;
use crate::source::MdecCodeSource;

use super::tables::PSX_QUANT_MATRIX;
use super::{
    check_planar_dst, check_rgb_dst, idct, read_raw_block, FrameGeometry, MdecDecoder,
};

/// 16.16 定点色彩矩阵系数
const CR_TO_R: i64 = 91881; // 1.402
const CB_TO_G: i64 = 22525; // 0.3437
const CR_TO_G: i64 = 46812; // 0.7143
const CB_TO_B: i64 = 116130; // 1.772

/// 整数重建引擎
pub struct MdecDecoderInt {
    geo: FrameGeometry,
    quant: [u8; 64],
    luma: Vec<i32>,
    cr: Vec<i32>,
    cb: Vec<i32>,
}

impl MdecDecoderInt {
    /// 按帧尺寸创建引擎, 平面缓冲区一次分配
    pub fn new(width: u32, height: u32) -> MdecResult<Self> {
        let geo = FrameGeometry::new(width, height)?;
        let luma = vec![0; geo.luma_width() * geo.luma_height()];
        let chroma = geo.chroma_width() * geo.chroma_height();
        Ok(Self {
            geo,
            quant: PSX_QUANT_MATRIX,
            luma,
            cr: vec![0; chroma],
            cb: vec![0; chroma],
        })
    }

    /// 亮度平面 (取整到宏块的分辨率)
    pub fn luma(&self) -> &[i32] {
        &self.luma
    }

    /// Cr 平面 (半分辨率)
    pub fn cr(&self) -> &[i32] {
        &self.cr
    }

    /// Cb 平面 (半分辨率)
    pub fn cb(&self) -> &[i32] {
        &self.cb
    }

    /// 解码一个块并写入所属平面
    fn decode_block(
        &mut self,
        src: &mut dyn MdecCodeSource,
        mb: usize,
        role: BlockRole,
    ) -> MdecResult<()> {
        let raw = read_raw_block(src, mb, self.geo.macroblock_origin(mb), role)?;

        // 全零块: 平面已预先清零
        if raw.coeffs.is_empty() {
            return Ok(());
        }

        let qscale = i32::from(raw.qscale);
        let mut block = [0i32; 64];
        for &(idx, level) in &raw.coeffs {
            block[idx] = (level * i32::from(self.quant[idx]) * qscale + 4) >> 3;
        }

        let (offset, stride) = self.geo.block_origin(mb, role);
        let plane = match role {
            BlockRole::Cr => &mut self.cr,
            BlockRole::Cb => &mut self.cb,
            _ => &mut self.luma,
        };

        if raw.coeffs.len() == 1 && raw.coeffs[0].0 == 0 {
            // 仅 DC: 直接按 (v + 4) >> 3 填充
            let val = (block[0] + 4) >> 3;
            for y in 0..8 {
                plane[offset + y * stride..offset + y * stride + 8].fill(val);
            }
            return Ok(());
        }

        idct::idct_8x8(&mut block);
        for y in 0..8 {
            plane[offset + y * stride..offset + y * stride + 8]
                .copy_from_slice(&block[y * 8..y * 8 + 8]);
        }
        Ok(())
    }

    /// 定点色彩转换, 输出 0-255
    fn to_rgb(y: i32, cb: i32, cr: i32) -> (u8, u8, u8) {
        let y = i64::from(y);
        let cb = i64::from(cb);
        let cr = i64::from(cr);
        let r = y + ((CR_TO_R * cr + 0x8000) >> 16);
        let g = y - ((CB_TO_G * cb + CR_TO_G * cr + 0x8000) >> 16);
        let b = y + ((CB_TO_B * cb + 0x8000) >> 16);
        (
            (r.clamp(-128, 127) + 128) as u8,
            (g.clamp(-128, 127) + 128) as u8,
            (b.clamp(-128, 127) + 128) as u8,
        )
    }
}

impl MdecDecoder for MdecDecoderInt {
    fn width(&self) -> u32 {
        self.geo.width
    }

    fn height(&self) -> u32 {
        self.geo.height
    }

    fn set_quant_table(&mut self, table: &[u8; 64]) {
        self.quant = *table;
    }

    fn decode(&mut self, src: &mut dyn MdecCodeSource) -> MdecResult<()> {
        self.luma.fill(0);
        self.cr.fill(0);
        self.cb.fill(0);

        for mb in 0..self.geo.macroblock_count() {
            for role in BlockRole::ORDER {
                self.decode_block(src, mb, role)?;
            }
        }
        Ok(())
    }

    fn read_rgb(&self, dst: &mut [u8], dst_offset: usize, dst_stride: usize) -> MdecResult<()> {
        check_rgb_dst(
            dst.len(),
            self.geo.width,
            self.geo.height,
            dst_offset,
            dst_stride,
        )?;

        let lw = self.geo.luma_width();
        let cw = self.geo.chroma_width();
        for y in 0..self.geo.height as usize {
            for x in 0..self.geo.width as usize {
                let luma = self.luma[y * lw + x];
                // 最近邻上采样
                let cr = self.cr[(y / 2) * cw + x / 2];
                let cb = self.cb[(y / 2) * cw + x / 2];
                let (r, g, b) = Self::to_rgb(luma, cb, cr);
                let at = (dst_offset + y * dst_stride + x) * 3;
                dst[at] = r;
                dst[at + 1] = g;
                dst[at + 2] = b;
            }
        }
        Ok(())
    }

    fn read_psx_yuv420(&self, dst: &mut [u8]) -> MdecResult<()> {
        check_planar_dst(dst.len(), self.geo.width, self.geo.height)?;

        let (w, h) = (self.geo.width as usize, self.geo.height as usize);
        let lw = self.geo.luma_width();
        let cw = self.geo.chroma_width();

        let mut at = 0;
        for y in 0..h {
            for x in 0..w {
                dst[at] = (self.luma[y * lw + x].clamp(-128, 127) + 128) as u8;
                at += 1;
            }
        }
        for plane in [&self.cb, &self.cr] {
            for y in 0..h / 2 {
                for x in 0..w / 2 {
                    dst[at] = (plane[y * cw + x].clamp(-128, 127) + 128) as u8;
                    at += 1;
                }
            }
        }
        Ok(())
    }

    fn read_rec601_yuv420(&self, dst: &mut [u8]) -> MdecResult<()> {
        check_planar_dst(dst.len(), self.geo.width, self.geo.height)?;

        let (w, h) = (self.geo.width as usize, self.geo.height as usize);
        let lw = self.geo.luma_width();
        let cw = self.geo.chroma_width();

        // 限定范围映射: 全幅 [0, 255] 压缩到 Y [16, 235] / C [16, 240]
        let to_y = |s: i32| -> u8 {
            let v = s.clamp(-128, 127) + 128;
            (16 + (219 * v + 128) / 255) as u8
        };
        let to_c = |s: i32| -> u8 {
            let v = s.clamp(-128, 127) + 128;
            (16 + (224 * v + 128) / 255) as u8
        };

        let mut at = 0;
        for y in 0..h {
            for x in 0..w {
                dst[at] = to_y(self.luma[y * lw + x]);
                at += 1;
            }
        }
        for plane in [&self.cb, &self.cr] {
            for y in 0..h / 2 {
                for x in 0..w / 2 {
                    dst[at] = to_c(plane[y * cw + x]);
                    at += 1;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::MdecCode;
    use crate::source::CodeListSource;
    use mdec_core::MdecError;

    /// 一个宏块: 6 个块, 每块一个 DC + EOD
    fn flat_macroblock(qscale: u8, dc: i16) -> Vec<MdecCode> {
        let mut codes = Vec::new();
        for _ in 0..6 {
            codes.push(MdecCode::new(qscale, dc).unwrap());
            codes.push(MdecCode::end_of_data());
        }
        codes
    }

    #[test]
    fn test_gray_frame_is_neutral_rgb() {
        let mut dec = MdecDecoderInt::new(16, 16).unwrap();
        let mut src = CodeListSource::new(flat_macroblock(1, 0));
        dec.decode(&mut src).unwrap();

        let mut rgb = vec![0u8; 16 * 16 * 3];
        dec.read_rgb(&mut rgb, 0, 16).unwrap();
        assert!(rgb.iter().all(|&v| v == 128), "全零帧应输出中性灰");
    }

    #[test]
    fn test_dc_dequant_rounding() {
        // DC=7, quant[0]=2, qscale=3: (7*2*3 + 4) >> 3 = 5, 填充 (5+4)>>3 = 1
        let mut dec = MdecDecoderInt::new(16, 16).unwrap();
        let mut src = CodeListSource::new(flat_macroblock(3, 7));
        dec.decode(&mut src).unwrap();
        assert!(dec.luma().iter().all(|&v| v == 1), "实际: {}", dec.luma()[0]);
        assert!(dec.cr().iter().all(|&v| v == 1));

        let mut yuv = vec![0u8; 16 * 16 * 3 / 2];
        dec.read_psx_yuv420(&mut yuv).unwrap();
        assert_eq!(yuv[0], 129);
    }

    #[test]
    fn test_custom_quant_table() {
        let mut dec = MdecDecoderInt::new(16, 16).unwrap();
        let mut table = PSX_QUANT_MATRIX;
        table[0] = 8;
        dec.set_quant_table(&table);

        // DC=1, quant[0]=8, qscale=1: (8+4)>>3 = 1, 填充 (1+4)>>3 = 0
        let mut src = CodeListSource::new(flat_macroblock(1, 1));
        dec.decode(&mut src).unwrap();
        assert!(dec.luma().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_truncated_source_leaves_zero_planes() {
        let mut dec = MdecDecoderInt::new(16, 16).unwrap();
        // 先正常解码出非零内容
        let mut src = CodeListSource::new(flat_macroblock(3, 7));
        dec.decode(&mut src).unwrap();
        assert!(dec.luma()[0] != 0);

        // 再喂一个只有两个块的残缺帧
        let mut short = Vec::new();
        for _ in 0..2 {
            short.push(MdecCode::new(3, 7).unwrap());
            short.push(MdecCode::end_of_data());
        }
        let mut src = CodeListSource::new(short);
        let err = dec.decode(&mut src).unwrap_err();
        assert!(matches!(err, MdecError::EndOfStream(_)));

        // Cr, Cb 已解码; 亮度四个块全部保持零
        assert!(dec.luma().iter().all(|&v| v == 0), "未完成的块应为零");
        assert!(dec.cr().iter().all(|&v| v == 1));
    }

    #[test]
    fn test_ac_coefficient_changes_pixels() {
        // DC + 一个 AC 系数: 输出不再平坦
        let mut codes = Vec::new();
        for _ in 0..6 {
            codes.push(MdecCode::new(1, 64).unwrap());
            codes.push(MdecCode::new(0, 30).unwrap());
            codes.push(MdecCode::end_of_data());
        }
        let mut dec = MdecDecoderInt::new(16, 16).unwrap();
        let mut src = CodeListSource::new(codes);
        dec.decode(&mut src).unwrap();

        let first_row = &dec.luma()[..8];
        assert!(
            first_row.iter().any(|&v| v != first_row[0]),
            "带 AC 的块不应平坦: {:?}",
            first_row,
        );
    }

    #[test]
    fn test_rgb_offset_and_stride() {
        // 写入 32 像素宽画布的右半边
        let mut dec = MdecDecoderInt::new(16, 16).unwrap();
        let mut src = CodeListSource::new(flat_macroblock(1, 0));
        dec.decode(&mut src).unwrap();

        let mut canvas = vec![0u8; 32 * 16 * 3];
        dec.read_rgb(&mut canvas, 16, 32).unwrap();
        assert_eq!(canvas[0], 0, "画布左半边不应被触碰");
        assert_eq!(canvas[16 * 3], 128);
    }
}
