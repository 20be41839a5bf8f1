//! 帧系数捕获存储.
//!
//! 把一帧的全部码字按宏块 × 块角色结构化存下来, 支持随机访问
//! 查询 (码字数、量化比例) 与从任意宏块开始的顺序回放. 构造时
//! 完整消费来源, 任何错误原样传播, 不暴露半成品.

use mdec_core::{MdecError, MdecResult};

use crate::code::MdecCode;
use crate::context::BlockRole;
use crate::source::MdecCodeSource;

/// 一帧的结构化码字存储
pub struct MdecCapture {
    /// 每宏块 6 个块, 每块为 DC..AC..EOD 的完整码字列表
    blocks: Vec<[Vec<MdecCode>; 6]>,
}

impl MdecCapture {
    /// 从码字来源读取整帧
    pub fn read_frame(
        src: &mut dyn MdecCodeSource,
        macroblock_count: usize,
    ) -> MdecResult<Self> {
        if macroblock_count == 0 {
            return Err(MdecError::InvalidArgument("宏块数为零".into()));
        }

        let mut blocks = Vec::with_capacity(macroblock_count);
        let mut code = MdecCode::default();
        for _ in 0..macroblock_count {
            let mut mb: [Vec<MdecCode>; 6] = Default::default();
            for block in &mut mb {
                loop {
                    let eod = src.next_code(&mut code)?;
                    block.push(code);
                    if eod {
                        break;
                    }
                }
            }
            blocks.push(mb);
        }
        Ok(Self { blocks })
    }

    /// 帧内宏块数
    pub fn macroblock_count(&self) -> usize {
        self.blocks.len()
    }

    /// 指定块的码字数 (不含 EOD)
    pub fn code_count(&self, mb: usize, role: BlockRole) -> Option<usize> {
        let block = &self.blocks.get(mb)?[role.index()];
        Some(block.len() - 1)
    }

    /// 指定块的量化比例 (块首码字的高 6 位)
    pub fn qscale(&self, mb: usize, role: BlockRole) -> Option<u8> {
        let block = &self.blocks.get(mb)?[role.index()];
        block.first().map(|c| c.top6())
    }

    /// 帧内码字总数 (含 EOD)
    pub fn total_codes(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|mb| mb.iter())
            .map(Vec::len)
            .sum()
    }

    /// 从指定宏块开始的顺序回放来源
    pub fn reader(&self, start_mb: usize) -> MdecResult<CaptureReader<'_>> {
        if start_mb >= self.blocks.len() {
            return Err(MdecError::InvalidArgument(format!(
                "起始宏块 {} 超出范围 (共 {} 个)",
                start_mb,
                self.blocks.len(),
            )));
        }
        Ok(CaptureReader {
            capture: self,
            mb: start_mb,
            block: 0,
            pos: 0,
        })
    }
}

/// 捕获存储的回放来源
pub struct CaptureReader<'a> {
    capture: &'a MdecCapture,
    mb: usize,
    block: usize,
    pos: usize,
}

impl MdecCodeSource for CaptureReader<'_> {
    fn next_code(&mut self, code: &mut MdecCode) -> MdecResult<bool> {
        loop {
            let Some(mb) = self.capture.blocks.get(self.mb) else {
                return Err(MdecError::EndOfStream(format!(
                    "捕获存储回放完毕 (共 {} 个宏块)",
                    self.capture.blocks.len(),
                )));
            };
            let block = &mb[self.block];
            if let Some(next) = block.get(self.pos) {
                self.pos += 1;
                *code = *next;
                return Ok(next.is_end_of_data());
            }
            // 块耗尽, 推进到下一个块/宏块
            self.pos = 0;
            self.block += 1;
            if self.block >= 6 {
                self.block = 0;
                self.mb += 1;
            }
        }
    }
}
