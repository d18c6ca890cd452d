//! 解码上下文配置.
//!
//! 所有字段都有默认值, JSON 配置中可以只写需要覆盖的字段:
//!
//! ```json
//! { "video": { "width": 640, "pixel_format": "rgb24" }, "resync_frames": 3 }
//! ```

use mediadec_core::{MediaError, MediaResult, PixelFormat, SampleFormat};
use mediadec_scale::ScaleAlgorithm;
use serde::{Deserialize, Serialize};

/// 默认的定位后同步帧数
pub const DEFAULT_RESYNC_FRAMES: u32 = 2;

/// 解码器未报告采样率时使用的采样率
pub const DEFAULT_FALLBACK_SAMPLE_RATE: u32 = 44100;

/// 视频输出配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoOutputOptions {
    /// 输出宽度, 未设置时使用第一帧的宽度
    pub width: Option<u32>,
    /// 输出高度, 未设置时使用第一帧的高度
    pub height: Option<u32>,
    /// 输出像素格式, 必须是打包格式
    pub pixel_format: PixelFormat,
    /// 缩放算法
    pub algorithm: ScaleAlgorithm,
}

impl Default for VideoOutputOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            pixel_format: PixelFormat::Rgba,
            algorithm: ScaleAlgorithm::default(),
        }
    }
}

/// 音频输出配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioOutputOptions {
    /// 输出采样率, 未设置时跟随源
    pub sample_rate: Option<u32>,
    /// 输出声道数, 未设置时跟随源
    pub channels: Option<u32>,
    /// 输出采样格式, 必须是交错格式
    pub sample_format: SampleFormat,
}

impl Default for AudioOutputOptions {
    fn default() -> Self {
        Self {
            sample_rate: None,
            channels: None,
            sample_format: SampleFormat::F32,
        }
    }
}

/// 解码上下文配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    pub video: VideoOutputOptions,
    pub audio: AudioOutputOptions,
    /// 定位之后为同步解码器而拉取的帧数
    pub resync_frames: u32,
    /// 解码器报告采样率为 0 时使用的采样率
    pub fallback_sample_rate: u32,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            video: VideoOutputOptions::default(),
            audio: AudioOutputOptions::default(),
            resync_frames: DEFAULT_RESYNC_FRAMES,
            fallback_sample_rate: DEFAULT_FALLBACK_SAMPLE_RATE,
        }
    }
}

impl DecoderOptions {
    /// 检查配置是否有效
    pub fn validate(&self) -> MediaResult<()> {
        validate_video_output(self.video.width, self.video.height, self.video.pixel_format)?;
        validate_audio_output(
            self.audio.sample_rate,
            self.audio.channels,
            self.audio.sample_format,
        )?;
        if self.fallback_sample_rate == 0 {
            return Err(MediaError::InvalidArgument(
                "fallback_sample_rate 不能为 0".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_video_output(
    width: Option<u32>,
    height: Option<u32>,
    pixel_format: PixelFormat,
) -> MediaResult<()> {
    if width == Some(0) || height == Some(0) {
        return Err(MediaError::InvalidArgument("输出宽高不能为 0".into()));
    }
    if pixel_format.bytes_per_pixel().is_none() {
        return Err(MediaError::Unsupported(format!(
            "输出像素格式必须是打包格式: {pixel_format}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_audio_output(
    sample_rate: Option<u32>,
    channels: Option<u32>,
    sample_format: SampleFormat,
) -> MediaResult<()> {
    if sample_rate == Some(0) || channels == Some(0) {
        return Err(MediaError::InvalidArgument(
            "输出采样率和声道数不能为 0".into(),
        ));
    }
    if sample_format == SampleFormat::None || sample_format.is_planar() {
        return Err(MediaError::Unsupported(format!(
            "输出采样格式必须是交错格式: {sample_format}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = DecoderOptions::default();
        assert_eq!(opts.video.pixel_format, PixelFormat::Rgba);
        assert_eq!(opts.audio.sample_format, SampleFormat::F32);
        assert_eq!(opts.resync_frames, 2);
        assert_eq!(opts.fallback_sample_rate, 44100);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let opts: DecoderOptions = serde_json::from_str(
            r#"{ "video": { "width": 320, "pixel_format": "rgbaf16le" }, "resync_frames": 3 }"#,
        )
        .unwrap();
        assert_eq!(opts.video.width, Some(320));
        assert_eq!(opts.video.height, None);
        assert_eq!(opts.video.pixel_format, PixelFormat::Rgbaf16le);
        assert_eq!(opts.resync_frames, 3);
        assert_eq!(opts.audio, AudioOutputOptions::default());
    }

    #[test]
    fn test_rejects_planar_outputs() {
        let mut opts = DecoderOptions::default();
        opts.video.pixel_format = PixelFormat::Yuv420p;
        assert!(matches!(opts.validate(), Err(MediaError::Unsupported(_))));

        let mut opts = DecoderOptions::default();
        opts.audio.sample_format = SampleFormat::S16p;
        assert!(opts.validate().is_err());

        let mut opts = DecoderOptions::default();
        opts.video.width = Some(0);
        assert!(matches!(opts.validate(), Err(MediaError::InvalidArgument(_))));
    }
}
