//! 比特流读取器.
//!
//! 提供从字节缓冲区中按位读取数据的能力, 是熵解码器的基础设施.
//!
//! MDEC 码流以 16 位字为单位, 字内按大端位序 (MSB first) 读取.
//! 字本身的字节序由 [`WordOrder`] 指定: 主流格式将每个字以小端
//! 字节序存放, 个别格式直接按大端字节序存放.

use crate::{MdecError, MdecResult};

/// 16 位字的字节序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOrder {
    /// 每两个字节构成一个小端 16 位字 (主流 STR 码流)
    Le16,
    /// 字节顺序即位流顺序 (大端 16 位字)
    Be16,
}

/// 比特流读取器
///
/// 从字节缓冲区中按位读取数据, 字内使用大端位序 (MSB first).
/// 缓冲区长度不足整字时, 末尾的残余字节被截断, 不参与读取.
///
/// # 示例
/// ```
/// use mdec_core::bitreader::{BitReader, WordOrder};
///
/// // 小端字 0xB151 的位流为 0b10110001_01010001
/// let data = [0x51, 0xB1];
/// let mut br = BitReader::new(&data, WordOrder::Le16);
/// assert_eq!(br.read_bits(4).unwrap(), 0b1011);
/// assert_eq!(br.read_bits(4).unwrap(), 0b0001);
/// assert_eq!(br.read_bits(8).unwrap(), 0b01010001);
/// ```
pub struct BitReader<'a> {
    /// 源数据 (已截断到整字长度)
    data: &'a [u8],
    /// 字序
    order: WordOrder,
    /// 当前字节索引 (位流顺序, 未做字序换算)
    byte_pos: usize,
    /// 当前字节中的位位置 (0-7, 0 表示最高位)
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    ///
    /// `data` 长度为奇数时, 最后一个字节被忽略 (调用方负责记录该情况).
    pub fn new(data: &'a [u8], order: WordOrder) -> Self {
        let whole = data.len() & !1;
        Self {
            data: &data[..whole],
            order,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// 位流顺序中第 `pos` 个字节
    #[inline]
    fn byte_at(&self, pos: usize) -> u8 {
        match self.order {
            // 小端字: 同一个字内高低字节互换
            WordOrder::Le16 => self.data[pos ^ 1],
            WordOrder::Be16 => self.data[pos],
        }
    }

    /// 获取已读取的总位数
    pub fn bits_read(&self) -> usize {
        self.byte_pos * 8 + self.bit_pos as usize
    }

    /// 获取剩余可读位数
    pub fn bits_left(&self) -> usize {
        if self.byte_pos >= self.data.len() {
            return 0;
        }
        (self.data.len() - self.byte_pos) * 8 - self.bit_pos as usize
    }

    /// 是否已到达末尾
    pub fn is_eof(&self) -> bool {
        self.bits_left() == 0
    }

    /// 读取 1 个位
    pub fn read_bit(&mut self) -> MdecResult<u32> {
        if self.byte_pos >= self.data.len() {
            return Err(MdecError::EndOfStream(format!(
                "位 {} 处数据耗尽",
                self.bits_read(),
            )));
        }

        let bit = (self.byte_at(self.byte_pos) >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        if self.bit_pos >= 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }

        Ok(u32::from(bit))
    }

    /// 读取 N 个位 (最多 32 位)
    ///
    /// 按大端位序读取, 返回值的低 N 位有效.
    pub fn read_bits(&mut self, n: u32) -> MdecResult<u32> {
        if n == 0 {
            return Ok(0);
        }
        if n > 32 {
            return Err(MdecError::InvalidArgument(format!(
                "read_bits: n={} 超过 32 位",
                n,
            )));
        }
        if (n as usize) > self.bits_left() {
            return Err(MdecError::EndOfStream(format!(
                "位 {} 处请求 {} 位, 剩余 {} 位",
                self.bits_read(),
                n,
                self.bits_left(),
            )));
        }

        let mut result: u32 = 0;
        let mut remaining = n;

        while remaining > 0 {
            let available = 8 - self.bit_pos as u32;
            let to_read = remaining.min(available);

            // 从当前字节中提取位
            let shift = available - to_read;
            let mask = ((1u32 << to_read) - 1) as u8;
            let bits = (self.byte_at(self.byte_pos) >> shift) & mask;

            result = (result << to_read) | u32::from(bits);

            self.bit_pos += to_read as u8;
            if self.bit_pos >= 8 {
                self.bit_pos = 0;
                self.byte_pos += 1;
            }
            remaining -= to_read;
        }

        Ok(result)
    }

    /// 读取有符号整数 (二进制补码)
    pub fn read_bits_signed(&mut self, n: u32) -> MdecResult<i32> {
        let val = self.read_bits(n)?;
        if n == 0 {
            return Ok(0);
        }
        if n >= 32 {
            return Ok(val as i32);
        }
        // 符号扩展: 若最高有效位为 1, 则填充高位
        if (val >> (n - 1)) & 1 != 0 {
            Ok(val as i32 | !((1i32 << n) - 1))
        } else {
            Ok(val as i32)
        }
    }

    /// 窥视 N 个位 (不移动位置)
    pub fn peek_bits(&mut self, n: u32) -> MdecResult<u32> {
        let saved_byte = self.byte_pos;
        let saved_bit = self.bit_pos;
        let result = self.read_bits(n);
        self.byte_pos = saved_byte;
        self.bit_pos = saved_bit;
        result
    }

    /// 跳过 N 个位
    pub fn skip_bits(&mut self, n: u32) -> MdecResult<()> {
        if (n as usize) > self.bits_left() {
            return Err(MdecError::EndOfStream(format!(
                "位 {} 处跳过 {} 位越界",
                self.bits_read(),
                n,
            )));
        }

        let total_bits = self.bit_pos as u32 + n;
        self.byte_pos += (total_bits / 8) as usize;
        self.bit_pos = (total_bits % 8) as u8;

        Ok(())
    }

    /// 获取当前字节位置 (位流顺序)
    pub fn byte_position(&self) -> usize {
        self.byte_pos
    }

    /// 获取底层数据的引用 (已截断到整字)
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_be16() {
        let data = [0b10110001, 0b01010101];
        let mut br = BitReader::new(&data, WordOrder::Be16);

        assert_eq!(br.read_bits(1).unwrap(), 1);
        assert_eq!(br.read_bits(1).unwrap(), 0);
        assert_eq!(br.read_bits(2).unwrap(), 0b11);
        assert_eq!(br.read_bits(4).unwrap(), 0b0001);
        assert_eq!(br.read_bits(8).unwrap(), 0b01010101);

        assert!(br.is_eof());
    }

    #[test]
    fn test_read_bits_le16_word_swap() {
        // 小端字 0xABCD 存放为 [0xCD, 0xAB], 位流应先出 0xAB 的高位
        let data = [0xCD, 0xAB];
        let mut br = BitReader::new(&data, WordOrder::Le16);
        assert_eq!(br.read_bits(16).unwrap(), 0xABCD);
    }

    #[test]
    fn test_read_bits_le16_across_words() {
        // 两个小端字 0x1234, 0x5678
        let data = [0x34, 0x12, 0x78, 0x56];
        let mut br = BitReader::new(&data, WordOrder::Le16);
        assert_eq!(br.read_bits(32).unwrap(), 0x12345678);
    }

    #[test]
    fn test_odd_length_truncated() {
        let data = [0xFF, 0xFF, 0xAA];
        let br = BitReader::new(&data, WordOrder::Le16);
        assert_eq!(br.bits_left(), 16, "残余字节应被截断");
    }

    #[test]
    fn test_read_bits_signed() {
        let data = [0b11111000, 0x00]; // 5 位补码 0b11111 = -1
        let mut br = BitReader::new(&data, WordOrder::Be16);
        assert_eq!(br.read_bits_signed(5).unwrap(), -1);

        let data2 = [0b01010000, 0x00]; // 5 位补码 0b01010 = 10
        let mut br2 = BitReader::new(&data2, WordOrder::Be16);
        assert_eq!(br2.read_bits_signed(5).unwrap(), 10);
    }

    #[test]
    fn test_peek_bits() {
        let data = [0b10110001, 0b01010101];
        let mut br = BitReader::new(&data, WordOrder::Be16);

        assert_eq!(br.peek_bits(4).unwrap(), 0b1011);
        assert_eq!(br.peek_bits(4).unwrap(), 0b1011); // 不移动
        assert_eq!(br.read_bits(4).unwrap(), 0b1011); // 现在移动了
        assert_eq!(br.peek_bits(4).unwrap(), 0b0001);
    }

    #[test]
    fn test_skip_bits() {
        let data = [0b10110001, 0b01010101];
        let mut br = BitReader::new(&data, WordOrder::Be16);

        br.skip_bits(4).unwrap();
        assert_eq!(br.read_bits(4).unwrap(), 0b0001);
        br.skip_bits(4).unwrap();
        assert_eq!(br.read_bits(4).unwrap(), 0b0101);
    }

    #[test]
    fn test_bits_left() {
        let data = [0x00, 0x00];
        let mut br = BitReader::new(&data, WordOrder::Le16);

        assert_eq!(br.bits_left(), 16);
        br.read_bits(5).unwrap();
        assert_eq!(br.bits_left(), 11);
        br.read_bits(11).unwrap();
        assert_eq!(br.bits_left(), 0);
        assert!(br.is_eof());
    }

    #[test]
    fn test_eof_error() {
        let data = [0x00, 0x00];
        let mut br = BitReader::new(&data, WordOrder::Le16);

        br.read_bits(16).unwrap();
        assert!(matches!(
            br.read_bits(1),
            Err(MdecError::EndOfStream(_))
        ));
    }

    #[test]
    fn test_peek_past_end_is_end_of_stream() {
        let data = [0xFF, 0xFF];
        let mut br = BitReader::new(&data, WordOrder::Be16);
        br.skip_bits(10).unwrap();
        assert!(matches!(
            br.peek_bits(12),
            Err(MdecError::EndOfStream(_))
        ));
    }
}
