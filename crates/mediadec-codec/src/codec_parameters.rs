//! 编解码器参数, 通常由容器格式在解析头部时填充.

use mediadec_core::{ChannelLayout, PixelFormat, Rational, SampleFormat};

use crate::codec_id::CodecId;

/// 编解码器参数
#[derive(Debug, Clone)]
pub struct CodecParameters {
    /// 编解码器标识
    pub codec_id: CodecId,
    /// 码率 (bits/s), 0 表示未知
    pub bit_rate: u64,
    /// 媒体类型特定参数
    pub params: CodecParamsType,
}

/// 媒体类型特定参数
#[derive(Debug, Clone)]
pub enum CodecParamsType {
    /// 视频参数
    Video(VideoCodecParams),
    /// 音频参数
    Audio(AudioCodecParams),
    /// 无特定参数
    None,
}

/// 视频编解码器参数
#[derive(Debug, Clone)]
pub struct VideoCodecParams {
    /// 宽度 (像素), 0 表示未知
    pub width: u32,
    /// 高度 (像素), 0 表示未知
    pub height: u32,
    /// 像素格式
    pub pixel_format: PixelFormat,
    /// 帧率
    pub frame_rate: Rational,
}

/// 音频编解码器参数
#[derive(Debug, Clone)]
pub struct AudioCodecParams {
    /// 采样率 (Hz), 0 表示未知
    pub sample_rate: u32,
    /// 声道布局
    pub channel_layout: ChannelLayout,
    /// 采样格式
    pub sample_format: SampleFormat,
}
