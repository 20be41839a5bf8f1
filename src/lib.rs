//! # mdec
//!
//! 纯 Rust 实现的 PlayStation MDEC 运动视频帧解码器.
//!
//! 覆盖从帧字节流到像素输出的完整解码管线:
//! - **熵解码**: 五种帧格式 (v1/v2/v3/FF7/Lain) 的识别与 VLC 解码
//! - **图像重建**: 整数 (贴近硬件) 与 f64 浮点 (参考精度) 两套引擎
//! - **辅助工具**: 零电平码字过滤、整帧系数捕获与回放、位流读写器
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use mdec::codec::{BitStreamDecoder, MdecDecoder, MdecDecoderInt};
//!
//! # fn run(frame_bytes: &[u8]) -> mdec::core::MdecResult<()> {
//! let mut source = BitStreamDecoder::new(frame_bytes, 320, 240)?;
//! let mut engine = MdecDecoderInt::new(320, 240)?;
//! engine.decode(&mut source)?;
//!
//! let mut rgb = vec![0u8; 320 * 240 * 3];
//! engine.read_rgb(&mut rgb, 0, 320)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `mdec-core` | 错误类型与 16 位字位流读写 |
//! | `mdec-codec` | 熵解码、重建引擎与辅助工具 |

/// 核心类型与位流工具
pub use mdec_core as core;

/// 熵解码与图像重建
pub use mdec_codec as codec;
