//! 系数码字来源抽象.
//!
//! 重建引擎、冗余码过滤器与捕获存储都通过同一个拉取式接口
//! 消费码字, 彼此可以任意组合串联.

use mdec_core::{MdecError, MdecResult};

use crate::code::MdecCode;

/// 码字来源
///
/// 实现者把下一个码字写入 `code` 并返回它是否为块结束标记 (EOD).
/// 返回 `true` 时 `code` 保证满足 [`MdecCode::is_end_of_data`].
pub trait MdecCodeSource {
    fn next_code(&mut self, code: &mut MdecCode) -> MdecResult<bool>;
}

/// 内存码字列表来源
///
/// 按顺序回放一个预先构造的码字序列, 供测试与分析工具使用.
pub struct CodeListSource {
    codes: Vec<MdecCode>,
    pos: usize,
}

impl CodeListSource {
    pub fn new(codes: Vec<MdecCode>) -> Self {
        Self { codes, pos: 0 }
    }

    /// 剩余未回放的码字数
    pub fn remaining(&self) -> usize {
        self.codes.len() - self.pos
    }
}

impl MdecCodeSource for CodeListSource {
    fn next_code(&mut self, code: &mut MdecCode) -> MdecResult<bool> {
        let Some(next) = self.codes.get(self.pos) else {
            return Err(MdecError::EndOfStream(format!(
                "码字列表耗尽 (共 {} 个)",
                self.codes.len(),
            )));
        };
        self.pos += 1;
        *code = *next;
        Ok(next.is_end_of_data())
    }
}
