//! 解码位置追踪.
//!
//! 一帧由若干 16x16 宏块组成, 每个宏块按固定顺序含 6 个 8x8 块:
//! Cr, Cb, Y1, Y2, Y3, Y4. 宏块在帧内按列主序排列 (先从上到下,
//! 再从左到右). 本模块追踪当前解码位置, 供诊断信息与重建引擎
//! 定位输出区域使用.

use std::fmt;

/// 宏块内的块角色, 按硬件固定顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    Cr,
    Cb,
    Y1,
    Y2,
    Y3,
    Y4,
}

impl BlockRole {
    /// 宏块内的固定块顺序
    pub const ORDER: [BlockRole; 6] = [
        BlockRole::Cr,
        BlockRole::Cb,
        BlockRole::Y1,
        BlockRole::Y2,
        BlockRole::Y3,
        BlockRole::Y4,
    ];

    /// 在宏块内的序号 (0-5)
    pub fn index(self) -> usize {
        match self {
            BlockRole::Cr => 0,
            BlockRole::Cb => 1,
            BlockRole::Y1 => 2,
            BlockRole::Y2 => 3,
            BlockRole::Y3 => 4,
            BlockRole::Y4 => 5,
        }
    }

    /// 宏块内的下一个块角色 (Y4 之后回到下一宏块的 Cr)
    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % 6]
    }

    /// 是否为色度块
    pub fn is_chroma(self) -> bool {
        matches!(self, BlockRole::Cr | BlockRole::Cb)
    }

    /// 是否为亮度块
    pub fn is_luma(self) -> bool {
        !self.is_chroma()
    }
}

impl fmt::Display for BlockRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockRole::Cr => "Cr",
            BlockRole::Cb => "Cb",
            BlockRole::Y1 => "Y1",
            BlockRole::Y2 => "Y2",
            BlockRole::Y3 => "Y3",
            BlockRole::Y4 => "Y4",
        };
        f.write_str(name)
    }
}

/// 帧内解码位置追踪器
///
/// 一次性使用: 每帧解码开始时新建, 随码字消费推进.
/// 提供了帧高度时可换算当前宏块的左上角像素坐标.
#[derive(Debug, Clone)]
pub struct MdecContext {
    role: BlockRole,
    /// 当前块内已读码字数 (含首码字, 不含 EOD)
    codes_in_block: u32,
    total_codes: u64,
    total_blocks: u64,
    mb_index: usize,
    /// 列主序换算所需的纵向宏块数
    mbs_high: Option<usize>,
}

impl MdecContext {
    pub fn new() -> Self {
        Self {
            role: BlockRole::Cr,
            codes_in_block: 0,
            total_codes: 0,
            total_blocks: 0,
            mb_index: 0,
            mbs_high: None,
        }
    }

    /// 创建带像素坐标换算能力的追踪器
    pub fn with_frame_height(height: u32) -> Self {
        let mut ctx = Self::new();
        ctx.mbs_high = Some(height.div_ceil(16) as usize);
        ctx
    }

    /// 当前块角色
    pub fn role(&self) -> BlockRole {
        self.role
    }

    /// 当前位置是否为块首 (下一个码字将是量化比例/DC 码字)
    pub fn at_block_start(&self) -> bool {
        self.codes_in_block == 0
    }

    /// 当前宏块序号
    pub fn macroblock_index(&self) -> usize {
        self.mb_index
    }

    /// 当前宏块的左上角像素坐标 (列主序)
    ///
    /// 未提供帧高度时返回 None.
    pub fn macroblock_pixel(&self) -> Option<(u32, u32)> {
        let mbs_high = self.mbs_high?;
        let x = (self.mb_index / mbs_high) * 16;
        let y = (self.mb_index % mbs_high) * 16;
        Some((x as u32, y as u32))
    }

    /// 当前块内已读码字数
    pub fn codes_in_block(&self) -> u32 {
        self.codes_in_block
    }

    /// 已读码字总数 (含 EOD)
    pub fn total_codes(&self) -> u64 {
        self.total_codes
    }

    /// 已完成的块总数
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    /// 消费一个非 EOD 码字
    pub fn code_read(&mut self) {
        self.codes_in_block += 1;
        self.total_codes += 1;
    }

    /// 消费 EOD, 推进到下一个块
    pub fn block_end(&mut self) {
        self.total_codes += 1;
        self.total_blocks += 1;
        self.codes_in_block = 0;
        if self.role == BlockRole::Y4 {
            self.mb_index += 1;
        }
        self.role = self.role.next();
    }

    /// 诊断用位置描述: 宏块序号、像素坐标、块角色
    pub fn describe(&self) -> String {
        match self.macroblock_pixel() {
            Some((x, y)) => format!(
                "宏块 {} (像素 {},{}) 块 {}",
                self.mb_index, x, y, self.role,
            ),
            None => format!("宏块 {} 块 {}", self.mb_index, self.role),
        }
    }
}

impl Default for MdecContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_cycle() {
        let mut role = BlockRole::Cr;
        let expected = [
            BlockRole::Cb,
            BlockRole::Y1,
            BlockRole::Y2,
            BlockRole::Y3,
            BlockRole::Y4,
            BlockRole::Cr,
        ];
        for &next in &expected {
            role = role.next();
            assert_eq!(role, next);
        }
    }

    #[test]
    fn test_chroma_luma_split() {
        assert!(BlockRole::Cr.is_chroma());
        assert!(BlockRole::Cb.is_chroma());
        assert!(BlockRole::Y1.is_luma());
        assert!(BlockRole::Y4.is_luma());
    }

    #[test]
    fn test_block_end_advances_macroblock() {
        let mut ctx = MdecContext::new();
        assert_eq!(ctx.macroblock_index(), 0);
        for _ in 0..6 {
            ctx.code_read();
            ctx.block_end();
        }
        assert_eq!(ctx.macroblock_index(), 1);
        assert_eq!(ctx.role(), BlockRole::Cr);
        assert_eq!(ctx.total_blocks(), 6);
        assert_eq!(ctx.total_codes(), 12);
    }

    #[test]
    fn test_at_block_start() {
        let mut ctx = MdecContext::new();
        assert!(ctx.at_block_start());
        ctx.code_read();
        assert!(!ctx.at_block_start());
        ctx.block_end();
        assert!(ctx.at_block_start());
    }

    #[test]
    fn test_column_major_pixel_position() {
        // 高 32 像素 => 纵向 2 个宏块: 序号 0,1 在第一列, 2,3 在第二列
        let mut ctx = MdecContext::with_frame_height(32);
        assert_eq!(ctx.macroblock_pixel(), Some((0, 0)));
        for _ in 0..6 {
            ctx.block_end();
        }
        assert_eq!(ctx.macroblock_pixel(), Some((0, 16)));
        for _ in 0..6 {
            ctx.block_end();
        }
        assert_eq!(ctx.macroblock_pixel(), Some((16, 0)));
    }

    #[test]
    fn test_height_rounds_up() {
        // 高 17 像素同样是纵向 2 个宏块
        let ctx = MdecContext::with_frame_height(17);
        assert_eq!(ctx.mbs_high, Some(2));
    }
}
