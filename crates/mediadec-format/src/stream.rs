//! 流信息定义.

use mediadec_codec::{AudioCodecParams, CodecId, CodecParameters, CodecParamsType, VideoCodecParams};
use mediadec_core::{ChannelLayout, MediaType, PixelFormat, Rational, SampleFormat};

/// 流信息
#[derive(Debug, Clone)]
pub struct Stream {
    /// 流索引 (从 0 开始)
    pub index: usize,
    /// 媒体类型
    pub media_type: MediaType,
    /// 编解码器标识
    pub codec_id: CodecId,
    /// 时间基
    pub time_base: Rational,
    /// 流时长 (以 time_base 为单位, -1 表示未知)
    pub duration: i64,
    /// 起始时间 (以 time_base 为单位)
    pub start_time: i64,
    /// 总帧数 (0 表示未知)
    pub nb_frames: u64,
    /// 流特定参数
    pub params: StreamParams,
}

/// 流特定参数
#[derive(Debug, Clone)]
pub enum StreamParams {
    /// 视频流参数
    Video(VideoStreamParams),
    /// 音频流参数
    Audio(AudioStreamParams),
    /// 字幕流
    Subtitle,
    /// 其他
    Other,
}

/// 视频流参数
#[derive(Debug, Clone)]
pub struct VideoStreamParams {
    /// 宽度 (像素), 0 表示未知
    pub width: u32,
    /// 高度 (像素), 0 表示未知
    pub height: u32,
    /// 像素格式
    pub pixel_format: PixelFormat,
    /// 帧率
    pub frame_rate: Rational,
}

/// 音频流参数
#[derive(Debug, Clone)]
pub struct AudioStreamParams {
    /// 采样率 (Hz), 0 表示未知
    pub sample_rate: u32,
    /// 声道布局
    pub channel_layout: ChannelLayout,
    /// 采样格式
    pub sample_format: SampleFormat,
    /// 码率 (bps, 0 表示未知)
    pub bit_rate: u64,
}

impl Stream {
    /// 流时长 (秒), 未知时返回 `None`
    pub fn duration_seconds(&self) -> Option<f64> {
        if self.duration < 0 || !self.time_base.is_valid() {
            return None;
        }
        let secs = self.duration as f64 * self.time_base.to_f64();
        secs.is_finite().then_some(secs)
    }

    /// 构造打开解码器所需的参数
    pub fn codec_parameters(&self) -> CodecParameters {
        let (params, bit_rate) = match &self.params {
            StreamParams::Video(v) => (
                CodecParamsType::Video(VideoCodecParams {
                    width: v.width,
                    height: v.height,
                    pixel_format: v.pixel_format,
                    frame_rate: v.frame_rate,
                }),
                0,
            ),
            StreamParams::Audio(a) => (
                CodecParamsType::Audio(AudioCodecParams {
                    sample_rate: a.sample_rate,
                    channel_layout: a.channel_layout,
                    sample_format: a.sample_format,
                }),
                a.bit_rate,
            ),
            StreamParams::Subtitle | StreamParams::Other => (CodecParamsType::None, 0),
        };
        CodecParameters {
            codec_id: self.codec_id,
            bit_rate,
            params,
        }
    }
}
