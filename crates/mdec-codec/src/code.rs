//! MDEC 16 位系数码字.
//!
//! 硬件把每个系数打包为一个 16 位字: 高 6 位与低 10 位两个子域.
//! 子域含义取决于上下文: 块内第一个码字为 (量化比例, DC 电平),
//! 其后为 (零游程, AC 电平). 高 6 位全 1 且低 10 位为最小值的组合
//! 保留作块结束标记 (EOD), 不表示系数.

use mdec_core::{MdecError, MdecResult};

/// EOD 标记的打包值: top6=63, bottom10=-512
const END_OF_DATA_WORD: u16 = 0xFE00;

/// 一个 MDEC 系数码字
///
/// 高 6 位子域取值 [0, 63], 低 10 位子域为补码有符号值 [-512, 511].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MdecCode {
    top6: u8,
    bottom10: i16,
}

impl MdecCode {
    /// 创建码字, 越界子域返回 [`MdecError::InvalidArgument`]
    pub fn new(top6: u8, bottom10: i16) -> MdecResult<Self> {
        let mut code = Self::default();
        code.set_top6(top6)?;
        code.set_bottom10(bottom10)?;
        Ok(code)
    }

    /// 块结束标记
    pub fn end_of_data() -> Self {
        Self {
            top6: 63,
            bottom10: -512,
        }
    }

    /// 从打包的 16 位字解出码字
    ///
    /// 任意 16 位值都是合法输入: 高 6 位直接取出, 低 10 位做符号扩展.
    pub fn from_packed_word(word: u16) -> Self {
        Self {
            top6: (word >> 10) as u8,
            // 左移到 i16 高位再算术右移, 完成 10 位符号扩展
            bottom10: ((word as i16) << 6) >> 6,
        }
    }

    /// 打包为 16 位字
    pub fn to_packed_word(self) -> u16 {
        (u16::from(self.top6) << 10) | ((self.bottom10 as u16) & 0x3FF)
    }

    /// 高 6 位子域 (量化比例或零游程)
    pub fn top6(self) -> u8 {
        self.top6
    }

    /// 低 10 位子域 (DC 或 AC 电平)
    pub fn bottom10(self) -> i16 {
        self.bottom10
    }

    /// 设置高 6 位子域
    pub fn set_top6(&mut self, top6: u8) -> MdecResult<()> {
        if top6 > 63 {
            return Err(MdecError::InvalidArgument(format!(
                "top6={} 超出 [0, 63]",
                top6,
            )));
        }
        self.top6 = top6;
        Ok(())
    }

    /// 设置低 10 位子域
    pub fn set_bottom10(&mut self, bottom10: i16) -> MdecResult<()> {
        if !(-512..=511).contains(&bottom10) {
            return Err(MdecError::InvalidArgument(format!(
                "bottom10={} 超出 [-512, 511]",
                bottom10,
            )));
        }
        self.bottom10 = bottom10;
        Ok(())
    }

    /// 是否为块结束标记
    pub fn is_end_of_data(self) -> bool {
        self.top6 == 63 && self.bottom10 == -512
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(MdecCode::new(64, 0).is_err());
        assert!(MdecCode::new(0, 512).is_err());
        assert!(MdecCode::new(0, -513).is_err());
        assert!(MdecCode::new(63, 511).is_ok());
        assert!(MdecCode::new(63, -512).is_ok());
    }

    #[test]
    fn test_end_of_data_packed_word() {
        let eod = MdecCode::end_of_data();
        assert!(eod.is_end_of_data());
        assert_eq!(eod.to_packed_word(), END_OF_DATA_WORD);
        assert!(MdecCode::from_packed_word(END_OF_DATA_WORD).is_end_of_data());
    }

    #[test]
    fn test_eod_is_unique() {
        // 只有 top6=63 且 bottom10=-512 的组合是 EOD
        assert!(!MdecCode::new(63, -511).unwrap().is_end_of_data());
        assert!(!MdecCode::new(62, -512).unwrap().is_end_of_data());
        assert!(!MdecCode::new(0, 0).unwrap().is_end_of_data());
    }

    #[test]
    fn test_packed_round_trip() {
        for &(top6, bottom10) in &[(0u8, 0i16), (1, -1), (63, 511), (63, -512), (31, -300)] {
            let code = MdecCode::new(top6, bottom10).unwrap();
            let back = MdecCode::from_packed_word(code.to_packed_word());
            assert_eq!(code, back, "打包往返应无损");
        }
    }

    #[test]
    fn test_from_packed_sign_extension() {
        // 低 10 位 0x200 = -512, 0x1FF = 511
        assert_eq!(MdecCode::from_packed_word(0x0200).bottom10(), -512);
        assert_eq!(MdecCode::from_packed_word(0x01FF).bottom10(), 511);
        assert_eq!(MdecCode::from_packed_word(0x03FF).bottom10(), -1);
    }
}
