//! 比特流写入器.
//!
//! 提供向字节缓冲区按位写入数据的能力, 与 BitReader 对应.
//! 主要供测试与分析工具合成 MDEC 帧位流使用.
//!
//! 字内按大端位序写入 (MSB first); `finish` 时补零对齐到 16 位字
//! 边界, 并按指定字序输出字节.

use crate::bitreader::WordOrder;

/// 比特流写入器
///
/// 向字节缓冲区按位写入数据, 字内使用大端位序 (MSB first).
///
/// # 示例
/// ```
/// use mdec_core::bitreader::WordOrder;
/// use mdec_core::bitwriter::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0xABCD, 16);
/// assert_eq!(bw.finish(WordOrder::Le16), vec![0xCD, 0xAB]);
/// ```
pub struct BitWriter {
    /// 输出缓冲区 (位流顺序)
    data: Vec<u8>,
    /// 当前字节 (正在填充)
    current_byte: u8,
    /// 当前字节中已填充的位数 (0-7)
    bit_count: u8,
}

impl BitWriter {
    /// 创建新的比特流写入器
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// 以指定容量创建比特流写入器
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// 获取已写入的总位数
    pub fn bits_written(&self) -> usize {
        self.data.len() * 8 + self.bit_count as usize
    }

    /// 写入 1 个位
    pub fn write_bit(&mut self, bit: u32) {
        self.current_byte = (self.current_byte << 1) | (bit & 1) as u8;
        self.bit_count += 1;
        if self.bit_count >= 8 {
            self.data.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// 写入 N 个位 (最多 32 位)
    ///
    /// 值的低 N 位被写入, 高位在前 (大端).
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32, "write_bits: n={} 超过 32 位", n);

        if n == 0 {
            return;
        }

        let mut remaining = n;
        while remaining > 0 {
            let available = 8 - self.bit_count as u32;
            let to_write = remaining.min(available);

            // 提取要写入的位
            let shift = remaining - to_write;
            let mask = if to_write >= 32 {
                u32::MAX
            } else {
                (1u32 << to_write) - 1
            };
            let bits = ((value >> shift) & mask) as u8;

            if to_write >= 8 {
                // 整字节写入 (bit_count 必定为 0)
                self.current_byte = bits;
            } else {
                self.current_byte = (self.current_byte << to_write) | bits;
            }
            self.bit_count += to_write as u8;

            if self.bit_count >= 8 {
                self.data.push(self.current_byte);
                self.current_byte = 0;
                self.bit_count = 0;
            }

            remaining -= to_write;
        }
    }

    /// 写入有符号整数 (二进制补码)
    pub fn write_bits_signed(&mut self, value: i32, n: u32) {
        let mask = (1u64 << n) - 1;
        self.write_bits((value as u32) & mask as u32, n);
    }

    /// 结束写入, 返回完整字节流
    ///
    /// 先补零对齐到 16 位字边界, 再按 `order` 排列每个字的字节.
    pub fn finish(mut self, order: WordOrder) -> Vec<u8> {
        if self.bit_count > 0 {
            self.current_byte <<= 8 - self.bit_count;
            self.data.push(self.current_byte);
            self.bit_count = 0;
        }
        if self.data.len() % 2 != 0 {
            self.data.push(0);
        }

        if order == WordOrder::Le16 {
            for pair in self.data.chunks_exact_mut(2) {
                pair.swap(0, 1);
            }
        }
        self.data
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitreader::BitReader;

    #[test]
    fn test_write_bits_be16() {
        let mut bw = BitWriter::new();
        bw.write_bits(0b1011, 4);
        bw.write_bits(0b0001, 4);
        bw.write_bits(0b01010101, 8);
        assert_eq!(bw.finish(WordOrder::Be16), vec![0b10110001, 0b01010101]);
    }

    #[test]
    fn test_write_bits_le16_word_swap() {
        let mut bw = BitWriter::new();
        bw.write_bits(0xABCD, 16);
        assert_eq!(bw.finish(WordOrder::Le16), vec![0xCD, 0xAB]);
    }

    #[test]
    fn test_finish_pads_to_word() {
        let mut bw = BitWriter::new();
        bw.write_bits(0b101, 3);
        // 补零到整字: 0b10100000_00000000
        assert_eq!(bw.finish(WordOrder::Be16), vec![0b10100000, 0x00]);
    }

    #[test]
    fn test_write_bits_signed() {
        let mut bw = BitWriter::new();
        bw.write_bits_signed(-1, 5);
        bw.write_bits_signed(10, 5);
        bw.write_bits(0, 6);
        let data = bw.finish(WordOrder::Be16);

        let mut br = BitReader::new(&data, WordOrder::Be16);
        assert_eq!(br.read_bits_signed(5).unwrap(), -1);
        assert_eq!(br.read_bits_signed(5).unwrap(), 10);
    }

    #[test]
    fn test_round_trip_le16() {
        let mut bw = BitWriter::new();
        bw.write_bits(0x3FF, 10);
        bw.write_bits_signed(-200, 10);
        bw.write_bits(0b10, 2);
        let data = bw.finish(WordOrder::Le16);
        assert_eq!(data.len() % 2, 0);

        let mut br = BitReader::new(&data, WordOrder::Le16);
        assert_eq!(br.read_bits(10).unwrap(), 0x3FF);
        assert_eq!(br.read_bits_signed(10).unwrap(), -200);
        assert_eq!(br.read_bits(2).unwrap(), 0b10);
    }
}
