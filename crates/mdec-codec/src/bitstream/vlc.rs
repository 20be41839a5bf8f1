//! VLC (变长编码) 表定义与解码函数.
//!
//! 包含 AC 游程/电平 VLC 表与差分 DC 尺寸 VLC 表, 以及对应的解码逻辑.
//! AC 表为 MPEG-1 风格, 全部码流格式共用一份前缀表; 各格式只在
//! escape 负载的编码方式上不同, 该部分由调用方按格式读取.

use std::sync::OnceLock;

use log::warn;
use mdec_core::{BitReader, MdecError, MdecResult};

// ============================================================================
// VLC 表定义
// ============================================================================

/// EOB (块结束) 码字: "10"
pub(crate) const AC_EOB_LEN: u8 = 2;
pub(crate) const AC_EOB_CODE: u16 = 0b10;

/// Escape 前缀: "000001", 后随 6 位游程与格式相关的电平域
pub(crate) const AC_ESCAPE_LEN: u8 = 6;
pub(crate) const AC_ESCAPE_CODE: u16 = 0b000001;

/// 最长 AC 码字 16 位 + 1 位符号
pub(crate) const AC_MAX_CODE_BITS: u32 = 17;

/// AC 游程/电平 VLC 表
/// 格式: (位数, 码字, 游程, 电平绝对值); 码字后随 1 位符号 (1 = 负)
pub(crate) const AC_VLC: &[(u8, u16, u8, u8)] = &[
    (2, 0b11, 0, 1),
    (3, 0b011, 1, 1),
    (4, 0b0100, 0, 2),
    (4, 0b0101, 2, 1),
    (5, 0b00101, 0, 3),
    (5, 0b00110, 4, 1),
    (5, 0b00111, 3, 1),
    (6, 0b000100, 7, 1),
    (6, 0b000101, 6, 1),
    (6, 0b000110, 1, 2),
    (6, 0b000111, 5, 1),
    (7, 0b0000100, 2, 2),
    (7, 0b0000101, 9, 1),
    (7, 0b0000110, 0, 4),
    (7, 0b0000111, 8, 1),
    (8, 0b00100000, 13, 1),
    (8, 0b00100001, 0, 6),
    (8, 0b00100010, 12, 1),
    (8, 0b00100011, 11, 1),
    (8, 0b00100100, 3, 2),
    (8, 0b00100101, 1, 3),
    (8, 0b00100110, 0, 5),
    (8, 0b00100111, 10, 1),
    (10, 0b0000001000, 16, 1),
    (10, 0b0000001001, 5, 2),
    (10, 0b0000001010, 0, 7),
    (10, 0b0000001011, 2, 3),
    (10, 0b0000001100, 1, 4),
    (10, 0b0000001101, 15, 1),
    (10, 0b0000001110, 14, 1),
    (10, 0b0000001111, 4, 2),
    (12, 0b000000010000, 0, 11),
    (12, 0b000000010001, 8, 2),
    (12, 0b000000010010, 4, 3),
    (12, 0b000000010011, 0, 10),
    (12, 0b000000010100, 2, 4),
    (12, 0b000000010101, 7, 2),
    (12, 0b000000010110, 21, 1),
    (12, 0b000000010111, 20, 1),
    (12, 0b000000011000, 0, 9),
    (12, 0b000000011001, 19, 1),
    (12, 0b000000011010, 18, 1),
    (12, 0b000000011011, 1, 5),
    (12, 0b000000011100, 3, 3),
    (12, 0b000000011101, 0, 8),
    (12, 0b000000011110, 6, 2),
    (12, 0b000000011111, 17, 1),
    (13, 0b0000000010000, 10, 2),
    (13, 0b0000000010001, 9, 2),
    (13, 0b0000000010010, 5, 3),
    (13, 0b0000000010011, 3, 4),
    (13, 0b0000000010100, 2, 5),
    (13, 0b0000000010101, 1, 7),
    (13, 0b0000000010110, 1, 6),
    (13, 0b0000000010111, 0, 15),
    (13, 0b0000000011000, 0, 14),
    (13, 0b0000000011001, 0, 13),
    (13, 0b0000000011010, 0, 12),
    (13, 0b0000000011011, 26, 1),
    (13, 0b0000000011100, 25, 1),
    (13, 0b0000000011101, 24, 1),
    (13, 0b0000000011110, 23, 1),
    (13, 0b0000000011111, 22, 1),
    (14, 0b00000000010000, 0, 31),
    (14, 0b00000000010001, 0, 30),
    (14, 0b00000000010010, 0, 29),
    (14, 0b00000000010011, 0, 28),
    (14, 0b00000000010100, 0, 27),
    (14, 0b00000000010101, 0, 26),
    (14, 0b00000000010110, 0, 25),
    (14, 0b00000000010111, 0, 24),
    (14, 0b00000000011000, 0, 23),
    (14, 0b00000000011001, 0, 22),
    (14, 0b00000000011010, 0, 21),
    (14, 0b00000000011011, 0, 20),
    (14, 0b00000000011100, 0, 19),
    (14, 0b00000000011101, 0, 18),
    (14, 0b00000000011110, 0, 17),
    (14, 0b00000000011111, 0, 16),
    (15, 0b000000000010000, 0, 40),
    (15, 0b000000000010001, 0, 39),
    (15, 0b000000000010010, 0, 38),
    (15, 0b000000000010011, 0, 37),
    (15, 0b000000000010100, 0, 36),
    (15, 0b000000000010101, 0, 35),
    (15, 0b000000000010110, 0, 34),
    (15, 0b000000000010111, 0, 33),
    (15, 0b000000000011000, 0, 32),
    (15, 0b000000000011001, 1, 14),
    (15, 0b000000000011010, 1, 13),
    (15, 0b000000000011011, 1, 12),
    (15, 0b000000000011100, 1, 11),
    (15, 0b000000000011101, 1, 10),
    (15, 0b000000000011110, 1, 9),
    (15, 0b000000000011111, 1, 8),
    (16, 0b0000000000010000, 1, 18),
    (16, 0b0000000000010001, 1, 17),
    (16, 0b0000000000010010, 1, 16),
    (16, 0b0000000000010011, 1, 15),
    (16, 0b0000000000010100, 6, 3),
    (16, 0b0000000000010101, 16, 2),
    (16, 0b0000000000010110, 15, 2),
    (16, 0b0000000000010111, 14, 2),
    (16, 0b0000000000011000, 13, 2),
    (16, 0b0000000000011001, 12, 2),
    (16, 0b0000000000011010, 11, 2),
    (16, 0b0000000000011011, 31, 1),
    (16, 0b0000000000011100, 30, 1),
    (16, 0b0000000000011101, 29, 1),
    (16, 0b0000000000011110, 28, 1),
    (16, 0b0000000000011111, 27, 1),
];

/// 差分 DC 尺寸 VLC 表 (亮度)
/// 格式: (位数, 码字, 尺寸)
pub(crate) const DC_SIZE_VLC_LUMA: &[(u8, u16, u32)] = &[
    (2, 0b00, 1),
    (2, 0b01, 2),
    (3, 0b100, 0),
    (3, 0b101, 3),
    (3, 0b110, 4),
    (4, 0b1110, 5),
    (5, 0b11110, 6),
    (6, 0b111110, 7),
    (7, 0b1111110, 8),
];

/// 差分 DC 尺寸 VLC 表 (色度)
pub(crate) const DC_SIZE_VLC_CHROMA: &[(u8, u16, u32)] = &[
    (2, 0b00, 0),
    (2, 0b01, 1),
    (2, 0b10, 2),
    (3, 0b110, 3),
    (4, 0b1110, 4),
    (5, 0b11110, 5),
    (6, 0b111110, 6),
    (7, 0b1111110, 7),
    (8, 0b11111110, 8),
];

// ============================================================================
// VLC O(1) 快速查找表
// ============================================================================

/// AC VLC 快速查找表条目
#[derive(Clone, Copy, Default)]
struct AcVlcFastEntry {
    /// 码长 (0 = 无效条目)
    len: u8,
    /// 特殊标记: 0=普通系数, 1=EOB, 2=Escape
    special: u8,
    /// 游程
    run: u8,
    /// 电平绝对值
    level: u8,
}

/// 快速查找表位宽 (12 bits 覆盖绝大多数 AC 码字, 更长的走回退路径)
const AC_FAST_BITS: u32 = 12;
const AC_FAST_SIZE: usize = 1 << AC_FAST_BITS;

/// 构建 AC VLC 快速查找表
///
/// 对每个 VLC 条目, 将其映射到所有可能的 peek(12) 值:
/// 码字左移 (12-len) 位作为 base index, 填充低位 2^(12-len) 个条目.
fn build_ac_fast() -> Box<[AcVlcFastEntry; AC_FAST_SIZE]> {
    let mut entries = vec![AcVlcFastEntry::default(); AC_FAST_SIZE];

    let mut fill = |len: u8, code: u16, entry: AcVlcFastEntry| {
        let padding = AC_FAST_BITS - u32::from(len);
        let base = (code as usize) << padding;
        for extra in 0..(1usize << padding) {
            entries[base | extra] = entry;
        }
    };

    fill(
        AC_EOB_LEN,
        AC_EOB_CODE,
        AcVlcFastEntry {
            len: AC_EOB_LEN,
            special: 1,
            run: 0,
            level: 0,
        },
    );
    fill(
        AC_ESCAPE_LEN,
        AC_ESCAPE_CODE,
        AcVlcFastEntry {
            len: AC_ESCAPE_LEN,
            special: 2,
            run: 0,
            level: 0,
        },
    );
    for &(len, code, run, level) in AC_VLC {
        if u32::from(len) > AC_FAST_BITS {
            continue;
        }
        fill(
            len,
            code,
            AcVlcFastEntry {
                len,
                special: 0,
                run,
                level,
            },
        );
    }

    // Vec<T> -> Box<[T; N]>
    let boxed_slice = entries.into_boxed_slice();
    // SAFETY: 长度已确保为 AC_FAST_SIZE
    unsafe {
        let raw = Box::into_raw(boxed_slice) as *mut [AcVlcFastEntry; AC_FAST_SIZE];
        Box::from_raw(raw)
    }
}

/// 全局 AC 快速查找表 (延迟初始化)
static AC_FAST: OnceLock<Box<[AcVlcFastEntry; AC_FAST_SIZE]>> = OnceLock::new();

fn get_ac_fast() -> &'static [AcVlcFastEntry; AC_FAST_SIZE] {
    AC_FAST.get_or_init(build_ac_fast)
}

// ============================================================================
// 解码函数
// ============================================================================

/// AC 解码结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AcSymbol {
    /// 块结束
    EndOfBlock,
    /// Escape 前缀已消耗, 负载由调用方按格式读取
    Escape,
    /// 普通游程/电平对 (符号位已并入电平)
    RunLevel { run: u8, level: i16 },
}

/// 解码一个 AC 符号
///
/// 先走 O(1) 快速路径, 未命中 (长码字或末尾数据不足 12 位) 时
/// 逐条回退匹配. 均无匹配时: 剩余位数不足以容纳最长码字则判为
/// 数据耗尽, 否则判为码流损坏.
pub(crate) fn decode_ac_symbol(reader: &mut BitReader) -> MdecResult<AcSymbol> {
    let fast = get_ac_fast();

    if let Ok(peek) = reader.peek_bits(AC_FAST_BITS) {
        let entry = &fast[peek as usize];
        if entry.len > 0 {
            match entry.special {
                1 => {
                    reader.skip_bits(u32::from(entry.len))?;
                    return Ok(AcSymbol::EndOfBlock);
                }
                2 => {
                    reader.skip_bits(u32::from(entry.len))?;
                    return Ok(AcSymbol::Escape);
                }
                _ => {
                    reader.skip_bits(u32::from(entry.len))?;
                    let sign = reader.read_bit()?;
                    let level = if sign != 0 {
                        -i16::from(entry.level)
                    } else {
                        i16::from(entry.level)
                    };
                    return Ok(AcSymbol::RunLevel {
                        run: entry.run,
                        level,
                    });
                }
            }
        }
    }

    // 回退: 长码字 (13-16 位) 或剩余位不足 12 位的边界情况
    if let Ok(bits) = reader.peek_bits(u32::from(AC_EOB_LEN)) {
        if bits as u16 == AC_EOB_CODE {
            reader.skip_bits(u32::from(AC_EOB_LEN))?;
            return Ok(AcSymbol::EndOfBlock);
        }
    }
    if let Ok(bits) = reader.peek_bits(u32::from(AC_ESCAPE_LEN)) {
        if bits as u16 == AC_ESCAPE_CODE {
            reader.skip_bits(u32::from(AC_ESCAPE_LEN))?;
            return Ok(AcSymbol::Escape);
        }
    }
    for &(len, code, run, level) in AC_VLC {
        let Ok(bits) = reader.peek_bits(u32::from(len)) else {
            continue;
        };
        if bits as u16 == code {
            reader.skip_bits(u32::from(len))?;
            let sign = reader.read_bit()?;
            let signed = if sign != 0 {
                -i16::from(level)
            } else {
                i16::from(level)
            };
            return Ok(AcSymbol::RunLevel { run, level: signed });
        }
    }

    if (reader.bits_left() as u32) < AC_MAX_CODE_BITS {
        Err(MdecError::EndOfStream(format!(
            "位 {} 处剩余 {} 位, 不足以容纳 AC 码字",
            reader.bits_read(),
            reader.bits_left(),
        )))
    } else {
        warn!("AC VLC 解码失败: 字节位置 = {}", reader.byte_position());
        Err(MdecError::ReadCorruption(format!(
            "位 {} 处无法匹配 AC 码字",
            reader.bits_read(),
        )))
    }
}

/// 解码一个差分 DC 尺寸码字
pub(crate) fn decode_dc_size(reader: &mut BitReader, luma: bool) -> MdecResult<u32> {
    let table = if luma {
        DC_SIZE_VLC_LUMA
    } else {
        DC_SIZE_VLC_CHROMA
    };

    for &(len, code, size) in table {
        let Ok(bits) = reader.peek_bits(u32::from(len)) else {
            continue;
        };
        if bits as u16 == code {
            reader.skip_bits(u32::from(len))?;
            return Ok(size);
        }
    }

    if reader.bits_left() < 8 {
        Err(MdecError::EndOfStream(format!(
            "位 {} 处剩余 {} 位, 不足以容纳 DC 尺寸码字",
            reader.bits_read(),
            reader.bits_left(),
        )))
    } else {
        warn!(
            "DC 尺寸 VLC 解码失败: 字节位置 = {}",
            reader.byte_position(),
        );
        Err(MdecError::ReadCorruption(format!(
            "位 {} 处无法匹配 DC 尺寸码字",
            reader.bits_read(),
        )))
    }
}

/// 差分 DC 值映射
///
/// `bits` 为紧随尺寸码字的 `size` 位原始值: 最高位为 1 表示正差分,
/// 否则为负差分 (bits - (2^size - 1)).
pub(crate) fn dc_differential(bits: u32, size: u32) -> i32 {
    if size == 0 {
        return 0;
    }
    if (bits >> (size - 1)) & 1 != 0 {
        bits as i32
    } else {
        bits as i32 - ((1 << size) - 1)
    }
}
