//! MDEC 帧位流熵解码.
//!
//! 把一帧原始字节流 (帧头 + 16 位字序列) 解码为系数码字序列.
//! 帧头决定格式、字序与量化比例; 其后按宏块与块角色的固定顺序
//! 交替产出 DC 码字、AC 码字与块结束标记.

pub mod header;
pub(crate) mod vlc;

use log::warn;
use mdec_core::{BitReader, MdecError, MdecResult};

pub use header::{BitStreamFormat, FrameHeader, FRAME_MAGIC};

use crate::code::MdecCode;
use crate::context::{BlockRole, MdecContext};
use crate::source::MdecCodeSource;
use vlc::AcSymbol;

/// 帧位流熵解码器
///
/// 实现 [`MdecCodeSource`], 按需产出码字. 宏块数由构造时的帧尺寸
/// 决定 (向上取整到 16 的倍数); 全部宏块产出完毕后继续拉取返回
/// 数据耗尽错误.
pub struct BitStreamDecoder<'a> {
    reader: BitReader<'a>,
    header: FrameHeader,
    ctx: MdecContext,
    macroblock_count: usize,
    /// 差分 DC 预测器: Cr, Cb, 亮度共享
    dc_predictors: [i32; 3],
    /// 当前块内最后写入的系数位置 (zig-zag 序)
    block_pos: u32,
}

impl<'a> BitStreamDecoder<'a> {
    /// 从一帧原始字节创建解码器
    ///
    /// `data` 长度为奇数时多余的尾字节被忽略并记录日志.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> MdecResult<Self> {
        if width == 0 || height == 0 {
            return Err(MdecError::InvalidArgument(format!(
                "帧尺寸 {}x{} 无效",
                width, height,
            )));
        }

        let header = FrameHeader::parse(data)?;
        let payload = &data[header.payload_offset..];
        if payload.len() % 2 != 0 {
            warn!(
                "位流负载 {} 字节不是整字, 忽略末尾 1 字节",
                payload.len(),
            );
        }

        let macroblock_count = (width.div_ceil(16) * height.div_ceil(16)) as usize;
        Ok(Self {
            reader: BitReader::new(payload, header.format.word_order()),
            header,
            ctx: MdecContext::with_frame_height(height),
            macroblock_count,
            dc_predictors: [0; 3],
            block_pos: 0,
        })
    }

    /// 帧头
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// 帧内宏块总数
    pub fn macroblock_count(&self) -> usize {
        self.macroblock_count
    }

    /// 当前解码位置
    pub fn context(&self) -> &MdecContext {
        &self.ctx
    }

    /// 当前块角色对应的量化比例
    fn role_qscale(&self) -> u8 {
        if self.ctx.role().is_chroma() {
            self.header.qscale_chroma
        } else {
            self.header.qscale_luma
        }
    }

    /// 解码块首码字 (量化比例 + DC)
    fn decode_dc(&mut self, code: &mut MdecCode) -> MdecResult<()> {
        let dc = if self.header.format.dc_is_differential() {
            self.decode_dc_differential()?
        } else {
            self.reader.read_bits_signed(10)? as i16
        };

        code.set_top6(self.role_qscale())?;
        code.set_bottom10(dc)?;
        Ok(())
    }

    /// 差分 DC: 尺寸 VLC + 差分位, 差分放大 4 倍后累加到预测器
    fn decode_dc_differential(&mut self) -> MdecResult<i16> {
        let role = self.ctx.role();
        let luma = role.is_luma();
        let size = vlc::decode_dc_size(&mut self.reader, luma)?;
        let diff = if size == 0 {
            0
        } else {
            let bits = self.reader.read_bits(size)?;
            vlc::dc_differential(bits, size)
        };

        let slot = match role {
            BlockRole::Cr => 0,
            BlockRole::Cb => 1,
            _ => 2,
        };
        let dc = self.dc_predictors[slot] + diff * 4;
        if !(-512..=511).contains(&dc) {
            return Err(MdecError::ReadCorruption(format!(
                "{}: 差分 DC 累加值 {} 超出 [-512, 511]",
                self.ctx.describe(),
                dc,
            )));
        }
        self.dc_predictors[slot] = dc;
        Ok(dc as i16)
    }

    /// Escape 负载: 6 位游程 + 格式相关的电平域
    fn decode_escape(&mut self) -> MdecResult<(u8, i16)> {
        let run = self.reader.read_bits(6)? as u8;
        let level = if self.header.format.escape_level_is_byte() {
            let level = self.reader.read_bits_signed(8)? as i16;
            if level == 0 {
                // 该格式的真实码流里存在无意义的零电平 escape
                warn!("{}: escape 电平为零", self.ctx.describe());
            }
            level
        } else {
            let level = self.reader.read_bits_signed(10)? as i16;
            if level == 0 {
                return Err(MdecError::ReadCorruption(format!(
                    "{}: escape 电平为零",
                    self.ctx.describe(),
                )));
            }
            level
        };
        Ok((run, level))
    }
}

impl MdecCodeSource for BitStreamDecoder<'_> {
    fn next_code(&mut self, code: &mut MdecCode) -> MdecResult<bool> {
        if self.ctx.macroblock_index() >= self.macroblock_count {
            return Err(MdecError::EndOfStream(format!(
                "帧内 {} 个宏块已全部解码",
                self.macroblock_count,
            )));
        }

        if self.ctx.at_block_start() {
            self.decode_dc(code)?;
            self.block_pos = 0;
            self.ctx.code_read();
            return Ok(false);
        }

        let (run, level) = match vlc::decode_ac_symbol(&mut self.reader)? {
            AcSymbol::EndOfBlock => {
                *code = MdecCode::end_of_data();
                self.ctx.block_end();
                return Ok(true);
            }
            AcSymbol::Escape => self.decode_escape()?,
            AcSymbol::RunLevel { run, level } => (run, level),
        };

        self.block_pos += u32::from(run) + 1;
        if self.block_pos > 63 {
            return Err(MdecError::ReadCorruption(format!(
                "{}: 累计零游程越界, 系数位置 {} 超出 63",
                self.ctx.describe(),
                self.block_pos,
            )));
        }

        code.set_top6(run)?;
        code.set_bottom10(level)?;
        self.ctx.code_read();
        Ok(false)
    }
}
