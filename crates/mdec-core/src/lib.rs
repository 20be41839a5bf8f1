//! # mdec-core
//!
//! MDEC 解码器核心库, 提供统一错误类型与 16 位字流的位级读写工具.
//!
//! PlayStation 的 MDEC 码流以 16 位字为基本单位, 本 crate 的位读写器
//! 因此带有字序概念, 供上层熵解码器与测试工具共用.

pub mod bitreader;
pub mod bitwriter;
pub mod error;

// 重导出常用类型
pub use bitreader::{BitReader, WordOrder};
pub use bitwriter::BitWriter;
pub use error::{MdecError, MdecResult};
