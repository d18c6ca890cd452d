//! 解码上下文.
//!
//! [`DecoderContext`] 持有一个已打开的输入, 至多一路视频解码器与一路音频
//! 解码器, 两个格式转换缓存, 两个输出缓冲区以及播放状态.
//! 上下文只能由一个线程驱动, 跨线程共享时需要外部加锁.

mod audio;
mod clock;
mod image;
mod router;
mod seek;
mod selection;
mod video;

#[cfg(test)]
mod tests;

pub use clock::PlayStatus;
pub use image::ImageState;
pub use router::FrameStatus;
pub use selection::StreamSelection;

use log::{debug, info};
use mediadec_codec::Frame;
use mediadec_core::{ChannelLayout, MediaError, MediaResult, MediaType, PixelFormat, SampleFormat};
use mediadec_format::{InputFormat, Stream, StreamParams};

use crate::engine::{DefaultEngine, MediaEngine};
use crate::options::DecoderOptions;
use audio::AudioOutput;
use clock::PlaybackClock;
use router::{CurrentFrame, DecoderSlot, RouterState};
use video::VideoOutput;

/// 播放信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackInfo {
    /// 容器中的流总数
    pub stream_count: usize,
    pub selection: StreamSelection,
    /// 时长 (秒), 0 表示未知
    pub duration: f64,
    /// 当前位置 (秒)
    pub position: f64,
}

/// 视频输出信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub original_width: u32,
    pub original_height: u32,
    /// 输出宽度, 第一帧之前未设置时为 0
    pub decoded_width: u32,
    pub decoded_height: u32,
    pub pixel_format: PixelFormat,
    /// 一帧输出的字节数
    pub bytes_per_frame: usize,
}

/// 音频输出信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    pub original_sample_rate: u32,
    pub original_channel_layout: ChannelLayout,
    pub decoded_sample_rate: u32,
    pub decoded_channel_layout: ChannelLayout,
    pub sample_format: SampleFormat,
    pub bytes_per_sample: u32,
    pub sample_capacity_per_channel: u32,
    pub sample_count_per_channel: u32,
    pub channel_count: u32,
}

/// 两个转换缓存的计划构建/释放次数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub pixel_builds: u64,
    pub pixel_releases: u64,
    pub sample_builds: u64,
    pub sample_releases: u64,
}

/// 解码上下文
pub struct DecoderContext {
    input: Box<dyn InputFormat>,
    selection: StreamSelection,
    video_decoder: Option<DecoderSlot>,
    audio_decoder: Option<DecoderSlot>,
    video: VideoOutput,
    audio: AudioOutput,
    router: RouterState,
    current: Option<CurrentFrame>,
    duration: f64,
    position: f64,
    clock: PlaybackClock,
    image: ImageState,
    resync_frames: u32,
    fallback_sample_rate: u32,
}

impl DecoderContext {
    /// 使用内置引擎和默认配置打开 `url`
    pub fn open(url: &str) -> MediaResult<Self> {
        Self::open_with(url, Box::new(DefaultEngine::new()), DecoderOptions::default())
    }

    /// 使用指定引擎和配置打开 `url`
    ///
    /// 选出第一路视频, 音频与字幕流, 为视频和音频打开解码器.
    /// 任何一步失败都不会返回上下文.
    pub fn open_with(
        url: &str,
        engine: Box<dyn MediaEngine>,
        options: DecoderOptions,
    ) -> MediaResult<Self> {
        options.validate()?;
        let input = engine.open_input(url)?;
        let streams = input.streams();
        let selection = StreamSelection::select(streams);
        let duration = selected_duration(streams, &selection, input.duration());
        let image = ImageState::detect(&selection, duration);

        let mut video = VideoOutput::new(engine.create_scaler(), &options.video);
        let video_decoder = match selection.video {
            Some(index) => {
                let stream = find_stream(streams, index)?;
                if let StreamParams::Video(params) = &stream.params {
                    video.original_width = params.width;
                    video.original_height = params.height;
                }
                Some(DecoderSlot::open(engine.as_ref(), stream)?)
            }
            None => None,
        };

        let mut audio = AudioOutput::new(engine.create_resampler(), &options.audio);
        let audio_decoder = match selection.audio {
            Some(index) => {
                let stream = find_stream(streams, index)?;
                if let StreamParams::Audio(params) = &stream.params {
                    // 任何一项未知时全部留空, 由第一帧确定
                    let known = params.sample_rate > 0
                        && params.channel_layout.is_known()
                        && params.sample_format != SampleFormat::None;
                    if known {
                        audio.original_sample_rate = params.sample_rate;
                        audio.original_layout = params.channel_layout;
                    }
                }
                Some(DecoderSlot::open(engine.as_ref(), stream)?)
            }
            None => None,
        };

        info!(
            "打开 {url}: 格式 {}, {} 路流, 视频 {:?}, 音频 {:?}, 字幕 {:?}, 时长 {duration:.3}s",
            input.format_name(),
            streams.len(),
            selection.video,
            selection.audio,
            selection.subtitle,
        );
        if image.is_image() {
            debug!("没有音频且时长未知, 暂定为图片");
        }

        Ok(Self {
            input,
            selection,
            video_decoder,
            audio_decoder,
            video,
            audio,
            router: RouterState::default(),
            current: None,
            duration,
            position: 0.0,
            clock: PlaybackClock::default(),
            image,
            resync_frames: options.resync_frames,
            fallback_sample_rate: options.fallback_sample_rate,
        })
    }

    /// 关闭上下文, 释放转换计划, 输出缓冲区, 解码器和输入
    pub fn close(mut self) {
        self.video.release();
        self.audio.release();
        self.current = None;
        info!("关闭解码上下文 ({})", self.input.format_name());
    }

    /// 把最近一次 `next_frame` 取到的帧转换到对应的输出缓冲区
    ///
    /// 可以对同一帧重复调用.
    pub fn decode_frame(&mut self) -> MediaResult<()> {
        let current = self.current.as_ref().ok_or_else(|| {
            MediaError::InvalidState("没有可转换的帧, 请先调用 next_frame".into())
        })?;
        match &current.frame {
            Frame::Video(frame) => self.video.process(frame),
            Frame::Audio(frame) => self.audio.process(frame, self.fallback_sample_rate),
        }
    }

    /// 是否按图片处理 (暂定或已确认)
    pub fn is_image(&self) -> bool {
        self.image.is_image()
    }

    pub fn image_state(&self) -> ImageState {
        self.image
    }

    pub fn selection(&self) -> StreamSelection {
        self.selection
    }

    /// 容器中的所有流
    pub fn streams(&self) -> &[Stream] {
        self.input.streams()
    }

    pub fn format_name(&self) -> &str {
        self.input.format_name()
    }

    /// 当前位置 (秒)
    pub fn position(&self) -> f64 {
        self.position
    }

    /// 时长 (秒), 0 表示未知
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// 最近一帧的流索引与类型
    pub fn current_frame(&self) -> Option<(usize, MediaType)> {
        self.current
            .as_ref()
            .map(|c| (c.stream_index, c.frame.media_type()))
    }

    pub fn playback_info(&self) -> PlaybackInfo {
        PlaybackInfo {
            stream_count: self.input.streams().len(),
            selection: self.selection,
            duration: self.duration,
            position: self.position,
        }
    }

    pub fn video_info(&self) -> VideoInfo {
        let v = &self.video;
        VideoInfo {
            original_width: v.original_width,
            original_height: v.original_height,
            decoded_width: v.decoded_width.unwrap_or(0),
            decoded_height: v.decoded_height.unwrap_or(0),
            pixel_format: v.pixel_format,
            bytes_per_frame: v.bytes_per_frame(),
        }
    }

    pub fn audio_info(&self) -> AudioInfo {
        let a = &self.audio;
        let layout = a.output_layout();
        AudioInfo {
            original_sample_rate: a.original_sample_rate,
            original_channel_layout: a.original_layout,
            decoded_sample_rate: a.decoded_sample_rate.unwrap_or(a.original_sample_rate),
            decoded_channel_layout: layout,
            sample_format: a.sample_format,
            bytes_per_sample: a.sample_format.bytes_per_sample(),
            sample_capacity_per_channel: a.capacity_per_channel,
            sample_count_per_channel: a.count_per_channel,
            channel_count: layout.channels,
        }
    }

    /// 视频输出缓冲区, 第一次 `decode_frame` 之前为 `None`
    pub fn video_buffer(&self) -> Option<&[u8]> {
        self.video.buffer.as_slice()
    }

    /// 整个音频输出缓冲区 (容量部分)
    pub fn audio_buffer(&self) -> Option<&[u8]> {
        self.audio.buffer.as_slice()
    }

    /// 最近一次音频转换的有效输出
    pub fn audio_samples(&self) -> Option<&[u8]> {
        self.audio.samples()
    }

    /// 设置视频输出尺寸与像素格式, 只能在视频缓冲区分配之前调用
    pub fn set_video_output(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
        pixel_format: PixelFormat,
    ) -> MediaResult<()> {
        self.video.configure(width, height, pixel_format)
    }

    /// 设置音频输出采样率, 声道数与采样格式, 只能在音频缓冲区分配之前调用
    pub fn set_audio_output(
        &mut self,
        sample_rate: Option<u32>,
        channels: Option<u32>,
        sample_format: SampleFormat,
    ) -> MediaResult<()> {
        self.audio.configure(sample_rate, channels, sample_format)
    }

    pub fn conversion_stats(&self) -> ConversionStats {
        ConversionStats {
            pixel_builds: self.video.cache.builds(),
            pixel_releases: self.video.cache.releases(),
            sample_builds: self.audio.cache.builds(),
            sample_releases: self.audio.cache.releases(),
        }
    }

    fn stream(&self, index: usize) -> MediaResult<&Stream> {
        find_stream(self.input.streams(), index)
    }
}

fn find_stream(streams: &[Stream], index: usize) -> MediaResult<&Stream> {
    streams
        .iter()
        .find(|s| s.index == index)
        .ok_or(MediaError::StreamNotFound(index))
}

/// 选中流的流级时长与容器时长中的最大值, 都未知时为 0
fn selected_duration(
    streams: &[Stream],
    selection: &StreamSelection,
    container: Option<f64>,
) -> f64 {
    MediaType::SELECTABLE
        .iter()
        .filter_map(|&t| selection.get(t))
        .filter_map(|index| find_stream(streams, index).ok())
        .filter_map(Stream::duration_seconds)
        .chain(container)
        .filter(|d| d.is_finite() && *d > 0.0)
        .fold(0.0, f64::max)
}
