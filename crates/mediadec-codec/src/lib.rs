//! # mediadec-codec
//!
//! 编解码层抽象: 压缩数据包 [`Packet`], 解码后的帧 [`Frame`], 解码器 trait
//! [`Decoder`], 以及按 [`CodecId`] 创建解码器实例的 [`CodecRegistry`].
//!
//! ## 内置解码器
//!
//! - PCM (U8 / S16LE / S16BE / S24LE / S32LE / F32LE)
//! - RawVideo (按像素格式拆分平面)
//!
//! ```rust
//! use mediadec_codec::{CodecId, CodecRegistry};
//!
//! let mut reg = CodecRegistry::new();
//! mediadec_codec::register_all(&mut reg);
//! let decoder = reg.create_decoder(CodecId::PcmS16le).unwrap();
//! assert_eq!(decoder.name(), "pcm_s16le");
//! ```

pub mod codec_id;
pub mod codec_parameters;
pub mod decoder;
pub mod decoders;
pub mod frame;
pub mod packet;
pub mod registry;

// 重导出常用类型
pub use codec_id::CodecId;
pub use codec_parameters::{AudioCodecParams, CodecParameters, CodecParamsType, VideoCodecParams};
pub use decoder::Decoder;
pub use frame::{AudioFrame, Frame, VideoFrame};
pub use packet::Packet;
pub use registry::CodecRegistry;

/// 注册所有内置解码器
pub fn register_all(registry: &mut CodecRegistry) {
    decoders::register_all_decoders(registry);
}
