//! 统一错误类型定义.
//!
//! 所有 mdec crate 共用的错误类型, 支持跨模块传播.
//!
//! 帧解码只有两类致命错误: 数据耗尽与数据损坏. 两者都携带
//! 足够的上下文 (位位置、宏块序号、块角色等) 以便定位问题帧.

use thiserror::Error;

/// MDEC 解码器统一错误类型
#[derive(Debug, Error)]
pub enum MdecError {
    /// 无效参数 (API 误用, 非码流问题)
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 码流在帧完成前耗尽
    #[error("码流提前结束: {0}")]
    EndOfStream(String),

    /// 码流损坏 (无法匹配的编码、越界的系数位置等)
    #[error("码流损坏: {0}")]
    ReadCorruption(String),
}

/// MDEC 解码器统一 Result 类型
pub type MdecResult<T> = Result<T, MdecError>;
