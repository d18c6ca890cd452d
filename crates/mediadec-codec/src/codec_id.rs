//! 编解码器标识符.

use mediadec_core::MediaType;
use std::fmt;

/// 编解码器标识符
///
/// 唯一标识一种编码方式, 与容器格式无关.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    /// 未知编解码器
    None,

    /// Raw 视频 (未压缩)
    RawVideo,

    /// PCM 无符号 8 位
    PcmU8,
    /// PCM 有符号 16 位小端
    PcmS16le,
    /// PCM 有符号 16 位大端
    PcmS16be,
    /// PCM 有符号 24 位小端
    PcmS24le,
    /// PCM 有符号 32 位小端
    PcmS32le,
    /// PCM 32 位浮点小端
    PcmF32le,

    /// 纯文本字幕
    Text,
}

impl CodecId {
    /// 所属媒体类型
    pub const fn media_type(&self) -> MediaType {
        match self {
            Self::RawVideo => MediaType::Video,
            Self::PcmU8
            | Self::PcmS16le
            | Self::PcmS16be
            | Self::PcmS24le
            | Self::PcmS32le
            | Self::PcmF32le => MediaType::Audio,
            Self::Text => MediaType::Subtitle,
            Self::None => MediaType::Data,
        }
    }

    /// 编解码器名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::RawVideo => "rawvideo",
            Self::PcmU8 => "pcm_u8",
            Self::PcmS16le => "pcm_s16le",
            Self::PcmS16be => "pcm_s16be",
            Self::PcmS24le => "pcm_s24le",
            Self::PcmS32le => "pcm_s32le",
            Self::PcmF32le => "pcm_f32le",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
