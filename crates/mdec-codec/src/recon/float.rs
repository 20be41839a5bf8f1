//! 浮点重建引擎.
//!
//! f64 参考精度路径: 反量化为 `p / 8.0`, 余弦基可分离 IDCT,
//! 单系数块走闭式快速路径, 色度上采样核可按名称选择.

use std::sync::OnceLock;

use mdec_core::MdecResult;

use crate::context::BlockRole;
use crate::source::MdecCodeSource;

use super::tables::PSX_QUANT_MATRIX;
use super::upsample::ChromaUpsample;
use super::{
    check_planar_dst, check_rgb_dst, read_raw_block, FrameGeometry, MdecDecoder,
};

/// 一维 IDCT 基: BASIS[u][x] = C(u)/2 * cos((2x+1)uπ/16), C(0) = 1/√2
static BASIS: OnceLock<[[f64; 8]; 8]> = OnceLock::new();

fn basis() -> &'static [[f64; 8]; 8] {
    BASIS.get_or_init(|| {
        let mut table = [[0.0; 8]; 8];
        for (u, row) in table.iter_mut().enumerate() {
            let c = if u == 0 {
                0.5 / std::f64::consts::SQRT_2
            } else {
                0.5
            };
            for (x, v) in row.iter_mut().enumerate() {
                *v = c * ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / 16.0).cos();
            }
        }
        table
    })
}

/// 完整 8x8 可分离 IDCT
fn idct_8x8(block: &[f64; 64], out: &mut [f64; 64]) {
    let basis = basis();
    // 行变换: tmp[u][x] = Σv F[u][v] * B[v][x]
    let mut tmp = [0.0f64; 64];
    for u in 0..8 {
        for x in 0..8 {
            let mut acc = 0.0;
            for v in 0..8 {
                acc += block[u * 8 + v] * basis[v][x];
            }
            tmp[u * 8 + x] = acc;
        }
    }
    // 列变换: out[y][x] = Σu tmp[u][x] * B[u][y]
    for y in 0..8 {
        for x in 0..8 {
            let mut acc = 0.0;
            for u in 0..8 {
                acc += tmp[u * 8 + x] * basis[u][y];
            }
            out[y * 8 + x] = acc;
        }
    }
}

/// 浮点重建引擎
pub struct MdecDecoderDouble {
    geo: FrameGeometry,
    quant: [u8; 64],
    upsample: ChromaUpsample,
    luma: Vec<f64>,
    cr: Vec<f64>,
    cb: Vec<f64>,
}

impl MdecDecoderDouble {
    pub fn new(width: u32, height: u32) -> MdecResult<Self> {
        let geo = FrameGeometry::new(width, height)?;
        let luma = vec![0.0; geo.luma_width() * geo.luma_height()];
        let chroma = geo.chroma_width() * geo.chroma_height();
        Ok(Self {
            geo,
            quant: PSX_QUANT_MATRIX,
            upsample: ChromaUpsample::default(),
            luma,
            cr: vec![0.0; chroma],
            cb: vec![0.0; chroma],
        })
    }

    /// 选择 RGB 输出使用的色度上采样核
    pub fn set_upsample(&mut self, kernel: ChromaUpsample) {
        self.upsample = kernel;
    }

    /// 亮度平面 (取整到宏块的分辨率)
    pub fn luma(&self) -> &[f64] {
        &self.luma
    }

    /// Cr 平面 (半分辨率)
    pub fn cr(&self) -> &[f64] {
        &self.cr
    }

    /// Cb 平面 (半分辨率)
    pub fn cb(&self) -> &[f64] {
        &self.cb
    }

    fn decode_block(
        &mut self,
        src: &mut dyn MdecCodeSource,
        mb: usize,
        role: BlockRole,
    ) -> MdecResult<()> {
        let raw = read_raw_block(src, mb, self.geo.macroblock_origin(mb), role)?;
        if raw.coeffs.is_empty() {
            return Ok(());
        }

        let qscale = f64::from(raw.qscale);
        let (offset, stride) = self.geo.block_origin(mb, role);
        let plane = match role {
            BlockRole::Cr => &mut self.cr,
            BlockRole::Cb => &mut self.cb,
            _ => &mut self.luma,
        };

        let dequant = |idx: usize, level: i32, quant: &[u8; 64]| -> f64 {
            f64::from(level) * f64::from(quant[idx]) * qscale / 8.0
        };

        if raw.coeffs.len() == 1 {
            let (idx, level) = raw.coeffs[0];
            let value = dequant(idx, level, &self.quant);
            if idx == 0 {
                // 仅 DC: 所有像素等于 v / 8
                let flat = value / 8.0;
                for y in 0..8 {
                    plane[offset + y * stride..offset + y * stride + 8].fill(flat);
                }
            } else {
                // 单个非 DC 系数: 输出即该基函数的缩放
                let basis = basis();
                let (u, v) = (idx / 8, idx % 8);
                for y in 0..8 {
                    for x in 0..8 {
                        plane[offset + y * stride + x] = value * basis[u][y] * basis[v][x];
                    }
                }
            }
            return Ok(());
        }

        let mut block = [0.0f64; 64];
        for &(idx, level) in &raw.coeffs {
            block[idx] = dequant(idx, level, &self.quant);
        }
        let mut out = [0.0f64; 64];
        idct_8x8(&block, &mut out);
        for y in 0..8 {
            plane[offset + y * stride..offset + y * stride + 8]
                .copy_from_slice(&out[y * 8..y * 8 + 8]);
        }
        Ok(())
    }
}

impl MdecDecoder for MdecDecoderDouble {
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
        self.luma.fill(0.0);
        self.cr.fill(0.0);
        self.cb.fill(0.0);

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

        let cw = self.geo.chroma_width();
        let ch = self.geo.chroma_height();
        let cr_full = self.upsample.upsample(&self.cr, cw, ch);
        let cb_full = self.upsample.upsample(&self.cb, cw, ch);

        let lw = self.geo.luma_width();
        for y in 0..self.geo.height as usize {
            for x in 0..self.geo.width as usize {
                let luma = self.luma[y * lw + x];
                let cr = cr_full[y * lw + x];
                let cb = cb_full[y * lw + x];

                let r = luma + 1.402 * cr;
                let g = luma - 0.3437 * cb - 0.7143 * cr;
                let b = luma + 1.772 * cb;

                let at = (dst_offset + y * dst_stride + x) * 3;
                dst[at] = (r + 128.0).round().clamp(0.0, 255.0) as u8;
                dst[at + 1] = (g + 128.0).round().clamp(0.0, 255.0) as u8;
                dst[at + 2] = (b + 128.0).round().clamp(0.0, 255.0) as u8;
            }
        }
        Ok(())
    }

    fn read_psx_yuv420(&self, dst: &mut [u8]) -> MdecResult<()> {
        check_planar_dst(dst.len(), self.geo.width, self.geo.height)?;

        let (w, h) = (self.geo.width as usize, self.geo.height as usize);
        let lw = self.geo.luma_width();
        let cw = self.geo.chroma_width();
        let to_byte = |s: f64| -> u8 { ((s.round() as i32).clamp(-128, 127) + 128) as u8 };

        let mut at = 0;
        for y in 0..h {
            for x in 0..w {
                dst[at] = to_byte(self.luma[y * lw + x]);
                at += 1;
            }
        }
        for plane in [&self.cb, &self.cr] {
            for y in 0..h / 2 {
                for x in 0..w / 2 {
                    dst[at] = to_byte(plane[y * cw + x]);
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

        // 限定范围映射: Y [16, 235], C [16, 240]
        let to_y = |s: f64| -> u8 {
            let v = (s + 128.0).clamp(0.0, 255.0);
            (16.0 + 219.0 * v / 255.0).round() as u8
        };
        let to_c = |s: f64| -> u8 {
            let v = (s + 128.0).clamp(0.0, 255.0);
            (16.0 + 224.0 * v / 255.0).round() as u8
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
