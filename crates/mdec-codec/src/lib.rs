//! # mdec-codec
//!
//! PlayStation MDEC 运动视频帧解码库: 熵解码与图像重建.
//!
//! 解码管线分为两段, 通过 [`MdecCodeSource`] 拉取式接口衔接:
//!
//! - **熵解码**: [`BitStreamDecoder`] 识别帧头格式 (v1/v2/v3/FF7/Lain),
//!   把 16 位字位流还原为系数码字序列;
//! - **图像重建**: [`MdecDecoderInt`] / [`MdecDecoderDouble`] 消费码字,
//!   反量化 + IDCT 重建像素平面, 输出 RGB 或平面 YUV.
//!
//! 中间可以串联 [`ZeroRunFilter`] 清理冗余零电平码字, 或用
//! [`MdecCapture`] 把整帧码字存下来做随机访问分析与回放.
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use mdec_codec::{BitStreamDecoder, MdecDecoder, MdecDecoderInt};
//!
//! # fn run(frame_bytes: &[u8]) -> mdec_core::MdecResult<()> {
//! let mut source = BitStreamDecoder::new(frame_bytes, 320, 240)?;
//! let mut engine = MdecDecoderInt::new(320, 240)?;
//! engine.decode(&mut source)?;
//!
//! let mut rgb = vec![0u8; 320 * 240 * 3];
//! engine.read_rgb(&mut rgb, 0, 320)?;
//! # Ok(())
//! # }
//! ```

pub mod bitstream;
pub mod capture;
pub mod code;
pub mod context;
pub mod filter;
pub mod recon;
pub mod source;

// 重导出常用类型
pub use bitstream::{BitStreamDecoder, BitStreamFormat, FrameHeader};
pub use capture::{CaptureReader, MdecCapture};
pub use code::MdecCode;
pub use context::{BlockRole, MdecContext};
pub use filter::ZeroRunFilter;
pub use recon::{
    ChromaUpsample, MdecDecoder, MdecDecoderDouble, MdecDecoderInt, PSX_QUANT_MATRIX,
};
pub use source::{CodeListSource, MdecCodeSource};
