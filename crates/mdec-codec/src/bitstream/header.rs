//! 帧头解析与码流格式识别.
//!
//! 五种已知格式构成封闭集合, 由帧前若干字节一次性判定:
//!
//! | 格式 | 头部布局 | 字序 | DC 编码 |
//! |------|----------|------|---------|
//! | V2   | `[半码字数][0x3800][量化比例][版本=2]`, 各为小端 u16 | Le16 | 绝对 10 位 |
//! | V3   | 同 V2, 版本=3 | Le16 | 差分 VLC |
//! | FF7  | 40 字节相机前缀 + V2 布局 (版本=1) | Le16 | 绝对 10 位 |
//! | V1   | `[码字数][未检查][量化比例][版本=1]`, 不要求标记字 | Le16 | 绝对 10 位 |
//! | Lain | `[亮度 q][色度 q][0x3800][码字数][帧号]`, 大端 | Be16 | 绝对 10 位 |
//!
//! 码字数字段仅作容量提示, 不参与解码终止判断.

use log::{debug, warn};
use mdec_core::bitreader::WordOrder;
use mdec_core::{MdecError, MdecResult};

use std::fmt;

/// 标记字, 出现在多数格式的固定偏移处
pub const FRAME_MAGIC: u16 = 0x3800;

/// FF7 格式的相机参数前缀长度
const FF7_PREFIX_LEN: usize = 40;

/// 码流格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitStreamFormat {
    /// 版本 2: 绝对 DC
    V2,
    /// 版本 3: 差分 DC
    V3,
    /// FF7 变体: 40 字节相机前缀后接版本 1 头部
    Ff7,
    /// 遗留版本 1: 无标记字要求
    V1,
    /// Lain 变体: 亮度/色度量化比例分离, 大端字序
    Lain,
}

impl BitStreamFormat {
    /// 该格式位流的 16 位字序
    pub fn word_order(self) -> WordOrder {
        match self {
            BitStreamFormat::Lain => WordOrder::Be16,
            _ => WordOrder::Le16,
        }
    }

    /// DC 是否采用差分 VLC 编码
    pub fn dc_is_differential(self) -> bool {
        self == BitStreamFormat::V3
    }

    /// Escape 电平域是否为 8 位 (且容忍零电平)
    pub fn escape_level_is_byte(self) -> bool {
        self == BitStreamFormat::Lain
    }
}

impl fmt::Display for BitStreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BitStreamFormat::V2 => "v2",
            BitStreamFormat::V3 => "v3",
            BitStreamFormat::Ff7 => "ff7",
            BitStreamFormat::V1 => "v1",
            BitStreamFormat::Lain => "lain",
        };
        f.write_str(name)
    }
}

/// 解析后的帧头
#[derive(Debug, Clone, Copy)]
pub struct FrameHeader {
    pub format: BitStreamFormat,
    /// 亮度量化比例 (1-63)
    pub qscale_luma: u8,
    /// 色度量化比例 (多数格式与亮度相同)
    pub qscale_chroma: u8,
    /// 头部声明的码字数字段 (原始值, 仅作提示)
    pub code_count_field: u16,
    /// 帧号 (仅 Lain 格式携带)
    pub frame_number: u16,
    /// 位流负载的字节偏移
    pub payload_offset: usize,
}

fn u16_le(data: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([data[off], data[off + 1]])
}

fn u16_be(data: &[u8], off: usize) -> u16 {
    u16::from_be_bytes([data[off], data[off + 1]])
}

fn qscale_in_range(q: u16) -> bool {
    (1..=63).contains(&q)
}

/// 识别码流格式
///
/// 依次尝试: 标记字 + 版本 (V2/V3/V1 带标记) -> FF7 前缀 -> 遗留 V1
/// -> Lain. 全部不匹配时判为码流损坏.
pub fn identify(data: &[u8]) -> MdecResult<BitStreamFormat> {
    if data.len() < 8 {
        return Err(MdecError::EndOfStream(format!(
            "帧头不足 8 字节 (实际 {} 字节)",
            data.len(),
        )));
    }

    if u16_le(data, 2) == FRAME_MAGIC {
        match u16_le(data, 6) {
            2 => return Ok(BitStreamFormat::V2),
            3 => return Ok(BitStreamFormat::V3),
            1 if qscale_in_range(u16_le(data, 4)) => return Ok(BitStreamFormat::V1),
            other => {
                debug!("标记字匹配但版本字段异常: {}", other);
            }
        }
    }

    if data.len() >= FF7_PREFIX_LEN + 8
        && u16_le(data, FF7_PREFIX_LEN + 2) == FRAME_MAGIC
        && u16_le(data, FF7_PREFIX_LEN + 6) == 1
    {
        return Ok(BitStreamFormat::Ff7);
    }

    if u16_le(data, 6) == 1 && qscale_in_range(u16_le(data, 4)) {
        return Ok(BitStreamFormat::V1);
    }

    if qscale_in_range(u16::from(data[0]))
        && qscale_in_range(u16::from(data[1]))
        && u16_be(data, 2) == FRAME_MAGIC
    {
        return Ok(BitStreamFormat::Lain);
    }

    warn!(
        "无法识别的帧头: {:02X} {:02X} {:02X} {:02X} {:02X} {:02X} {:02X} {:02X}",
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    );
    Err(MdecError::ReadCorruption("无法识别的帧头布局".into()))
}

impl FrameHeader {
    /// 识别并解析帧头
    pub fn parse(data: &[u8]) -> MdecResult<Self> {
        let format = identify(data)?;
        let base = match format {
            BitStreamFormat::Ff7 => FF7_PREFIX_LEN,
            _ => 0,
        };

        let header = match format {
            BitStreamFormat::V2 | BitStreamFormat::V3 | BitStreamFormat::Ff7 => {
                let qscale = u16_le(data, base + 4);
                if !qscale_in_range(qscale) {
                    return Err(MdecError::ReadCorruption(format!(
                        "量化比例 {} 超出 [1, 63]",
                        qscale,
                    )));
                }
                Self {
                    format,
                    qscale_luma: qscale as u8,
                    qscale_chroma: qscale as u8,
                    code_count_field: u16_le(data, base),
                    frame_number: 0,
                    payload_offset: base + 8,
                }
            }
            BitStreamFormat::V1 => {
                // 遗留格式: 码字数为普通 16 位整数, 偏移 2 处不检查
                let qscale = u16_le(data, 4);
                Self {
                    format,
                    qscale_luma: qscale as u8,
                    qscale_chroma: qscale as u8,
                    code_count_field: u16_le(data, 0),
                    frame_number: 0,
                    payload_offset: 8,
                }
            }
            BitStreamFormat::Lain => Self {
                format,
                qscale_luma: data[0],
                qscale_chroma: data[1],
                code_count_field: u16_be(data, 4),
                frame_number: u16_be(data, 6),
                payload_offset: 8,
            },
        };

        debug!(
            "帧头: 格式 {} 亮度 q={} 色度 q={} 码字数字段 {}",
            header.format, header.qscale_luma, header.qscale_chroma, header.code_count_field,
        );
        Ok(header)
    }
}
