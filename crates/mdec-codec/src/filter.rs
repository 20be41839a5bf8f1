//! 冗余码过滤器.
//!
//! 真实码流中偶见电平为零的 AC 码字: 它们只消耗带宽, 不携带任何
//! 系数信息. 本过滤器包装任意码字来源, 统计此类码字, 并可选地把
//! 连续的零电平码字并入其后第一个非零码字的游程中 (紧邻 EOD 的
//! 零电平码字直接丢弃). 零电平码字本身永不致命; 合并后的游程
//! 超出块内 63 个系数位置时按码流损坏处理.

use log::info;
use mdec_core::{MdecError, MdecResult};

use crate::code::MdecCode;
use crate::source::MdecCodeSource;

/// 零电平 AC 码字过滤器
pub struct ZeroRunFilter<S> {
    inner: S,
    /// 是否把零电平码字并入后续游程
    merge: bool,
    /// 观测到的零电平 AC 码字数 (无论是否合并)
    observed: u64,
    /// 下一个码字是否为块首
    at_block_start: bool,
    /// 待合并的累计游程
    pending_run: Option<u32>,
}

impl<S: MdecCodeSource> ZeroRunFilter<S> {
    /// 创建过滤器; `merge` 为 false 时只统计, 码字原样通过
    pub fn new(inner: S, merge: bool) -> Self {
        Self {
            inner,
            merge,
            observed: 0,
            at_block_start: true,
            pending_run: None,
        }
    }

    /// 观测到的零电平 AC 码字数
    pub fn observed(&self) -> u64 {
        self.observed
    }

    /// 把观测计数写入日志 (计数为零时保持安静)
    pub fn log_observed(&self) {
        if self.observed > 0 {
            info!("观测到 {} 个零电平 AC 码字", self.observed);
        }
    }

    /// 取回内部来源
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: MdecCodeSource> MdecCodeSource for ZeroRunFilter<S> {
    fn next_code(&mut self, code: &mut MdecCode) -> MdecResult<bool> {
        loop {
            let eod = self.inner.next_code(code)?;

            if eod {
                // 紧邻 EOD 的零电平码字直接丢弃
                self.pending_run = None;
                self.at_block_start = true;
                return Ok(true);
            }

            if self.at_block_start {
                // 块首码字是量化比例/DC, 零 DC 是合法电平
                self.at_block_start = false;
                return Ok(false);
            }

            if code.bottom10() != 0 {
                if let Some(acc) = self.pending_run.take() {
                    // 合并: 被吞掉的每个零码字贡献自身游程 + 1 个位置
                    let merged = acc + 1 + u32::from(code.top6());
                    if merged > 63 {
                        return Err(MdecError::ReadCorruption(format!(
                            "合并后的零游程 {} 超出 63",
                            merged,
                        )));
                    }
                    code.set_top6(merged as u8)?;
                }
                return Ok(false);
            }

            self.observed += 1;
            if !self.merge {
                return Ok(false);
            }
            self.pending_run = Some(match self.pending_run {
                None => u32::from(code.top6()),
                Some(acc) => acc + 1 + u32::from(code.top6()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::CodeListSource;
    use mdec_core::MdecError;

    fn code(top6: u8, bottom10: i16) -> MdecCode {
        MdecCode::new(top6, bottom10).unwrap()
    }

    fn drain<S: MdecCodeSource>(src: &mut S) -> Vec<MdecCode> {
        let mut out = Vec::new();
        let mut c = MdecCode::default();
        loop {
            match src.next_code(&mut c) {
                Ok(_) => out.push(c),
                Err(MdecError::EndOfStream(_)) => break,
                Err(e) => panic!("过滤失败: {}", e),
            }
        }
        out
    }

    #[test]
    fn test_merge_into_following_code() {
        // DC, (2,0), (1,5), EOD => DC, (4,5), EOD
        let src = CodeListSource::new(vec![
            code(3, 100),
            code(2, 0),
            code(1, 5),
            MdecCode::end_of_data(),
        ]);
        let mut filter = ZeroRunFilter::new(src, true);
        let out = drain(&mut filter);

        assert_eq!(out.len(), 3);
        assert_eq!((out[1].top6(), out[1].bottom10()), (4, 5));
        assert!(out[2].is_end_of_data());
        assert_eq!(filter.observed(), 1);
    }

    #[test]
    fn test_consecutive_zeros_accumulate() {
        // (1,0), (2,0), (3,7): 游程 1 + 1 + 2 + 1 + 3 = 8
        let src = CodeListSource::new(vec![
            code(0, 50),
            code(1, 0),
            code(2, 0),
            code(3, 7),
            MdecCode::end_of_data(),
        ]);
        let mut filter = ZeroRunFilter::new(src, true);
        let out = drain(&mut filter);

        assert_eq!((out[1].top6(), out[1].bottom10()), (8, 7));
        assert_eq!(filter.observed(), 2);
    }

    #[test]
    fn test_zeros_before_eod_dropped() {
        let src = CodeListSource::new(vec![
            code(0, 50),
            code(5, 0),
            MdecCode::end_of_data(),
        ]);
        let mut filter = ZeroRunFilter::new(src, true);
        let out = drain(&mut filter);

        assert_eq!(out.len(), 2);
        assert!(out[1].is_end_of_data());
        assert_eq!(filter.observed(), 1);
    }

    #[test]
    fn test_zero_dc_passes_through() {
        // 块首的零 DC 不是冗余码
        let src = CodeListSource::new(vec![code(1, 0), MdecCode::end_of_data()]);
        let mut filter = ZeroRunFilter::new(src, true);
        let out = drain(&mut filter);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].bottom10(), 0);
        assert_eq!(filter.observed(), 0);
    }

    #[test]
    fn test_observe_only_mode() {
        let src = CodeListSource::new(vec![
            code(0, 50),
            code(2, 0),
            code(1, 5),
            MdecCode::end_of_data(),
        ]);
        let mut filter = ZeroRunFilter::new(src, false);
        let out = drain(&mut filter);

        assert_eq!(out.len(), 4, "不合并时码字原样通过");
        assert_eq!((out[1].top6(), out[1].bottom10()), (2, 0));
        assert_eq!(filter.observed(), 1);
    }

    #[test]
    fn test_merged_run_overflow_is_corruption() {
        // 4 个 (63,0): 累计游程 63+1+63+1+63+1+63 = 255, 并入 (0,5) 后为 256;
        // 必须报错而不是回绕成 top6=0
        let src = CodeListSource::new(vec![
            code(0, 50),
            code(63, 0),
            code(63, 0),
            code(63, 0),
            code(63, 0),
            code(0, 5),
            MdecCode::end_of_data(),
        ]);
        let mut filter = ZeroRunFilter::new(src, true);
        let mut c = MdecCode::default();
        filter.next_code(&mut c).unwrap(); // DC
        assert!(matches!(
            filter.next_code(&mut c),
            Err(MdecError::ReadCorruption(_))
        ));
    }

    #[test]
    fn test_merged_run_just_over_block_is_corruption() {
        // (63,0) 并入 (0,5) 后游程 64: 越过 8x8 系数边界同样是损坏
        let src = CodeListSource::new(vec![
            code(0, 50),
            code(63, 0),
            code(0, 5),
            MdecCode::end_of_data(),
        ]);
        let mut filter = ZeroRunFilter::new(src, true);
        let mut c = MdecCode::default();
        filter.next_code(&mut c).unwrap();
        assert!(matches!(
            filter.next_code(&mut c),
            Err(MdecError::ReadCorruption(_))
        ));
    }

    #[test]
    fn test_block_boundary_resets_state() {
        // 第二个块的块首 DC 不受第一个块尾部零码字影响
        let src = CodeListSource::new(vec![
            code(0, 10),
            code(4, 0),
            MdecCode::end_of_data(),
            code(0, 0),
            MdecCode::end_of_data(),
        ]);
        let mut filter = ZeroRunFilter::new(src, true);
        let out = drain(&mut filter);

        assert_eq!(out.len(), 4);
        assert_eq!(out[2].bottom10(), 0, "第二块块首零 DC 原样通过");
        assert_eq!(filter.observed(), 1);
    }
}
