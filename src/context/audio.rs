//! 音频帧后处理: 采样率/声道/采样格式转换到音频输出缓冲区.

use log::debug;
use mediadec_codec::AudioFrame;
use mediadec_core::{ChannelLayout, MediaError, MediaResult, SampleFormat};
use mediadec_resample::{ResampleParams, Resampler};

use crate::buffer::FrameBuffer;
use crate::convert::SampleConversionCache;
use crate::options::AudioOutputOptions;

/// 音频输出状态
pub(crate) struct AudioOutput {
    /// 源采样率, 每帧更新
    pub original_sample_rate: u32,
    /// 源声道布局, 打开时未知则从第一帧获取
    pub original_layout: ChannelLayout,
    /// 输出采样率, 未设置时跟随源
    pub decoded_sample_rate: Option<u32>,
    /// 输出声道布局, 未设置时跟随源
    pub decoded_layout: Option<ChannelLayout>,
    pub sample_format: SampleFormat,
    pub cache: SampleConversionCache,
    pub buffer: FrameBuffer,
    /// 缓冲区可容纳的采样数 (每声道)
    pub capacity_per_channel: u32,
    /// 最近一次转换输出的采样数 (每声道)
    pub count_per_channel: u32,
}

impl AudioOutput {
    pub fn new(resampler: Box<dyn Resampler>, options: &AudioOutputOptions) -> Self {
        Self {
            original_sample_rate: 0,
            original_layout: ChannelLayout::UNKNOWN,
            decoded_sample_rate: options.sample_rate,
            decoded_layout: options.channels.map(ChannelLayout::from_channels),
            sample_format: options.sample_format,
            cache: SampleConversionCache::new(resampler),
            buffer: FrameBuffer::new(),
            capacity_per_channel: 0,
            count_per_channel: 0,
        }
    }

    /// 输出声道布局, 未确定时为未知布局
    pub fn output_layout(&self) -> ChannelLayout {
        self.decoded_layout.unwrap_or(self.original_layout)
    }

    /// 把一帧转换到输出缓冲区
    ///
    /// 分配或扩容失败时保留原缓冲区与容量.
    pub fn process(&mut self, frame: &AudioFrame, fallback_sample_rate: u32) -> MediaResult<()> {
        if self.original_sample_rate == 0 {
            self.original_sample_rate = if frame.sample_rate > 0 {
                frame.sample_rate
            } else {
                fallback_sample_rate
            };
        }
        if !self.original_layout.is_known() {
            if !frame.channel_layout.is_known() {
                return Err(MediaError::InvalidData("音频帧没有声道布局".into()));
            }
            self.original_layout = frame.channel_layout;
            debug!(
                "从第一帧获取音频参数: {} Hz, {}",
                self.original_sample_rate, self.original_layout
            );
        }

        let src_sample_rate = if frame.sample_rate > 0 {
            frame.sample_rate
        } else {
            self.original_sample_rate
        };
        let src_channel_layout = if frame.channel_layout.is_known() {
            frame.channel_layout
        } else {
            self.original_layout
        };
        let dst_sample_rate = self.decoded_sample_rate.unwrap_or(self.original_sample_rate);
        let dst_channel_layout = self.output_layout();

        let params = ResampleParams {
            src_sample_rate,
            src_channel_layout,
            src_sample_format: frame.sample_format,
            dst_sample_rate,
            dst_channel_layout,
            dst_sample_format: self.sample_format,
        };
        self.cache.set_parameters(&params)?;

        let max_samples = self.cache.max_output_samples(frame.nb_samples)?;
        let frame_bytes = params.dst_frame_bytes();
        let needed = (max_samples as usize)
            .checked_mul(frame_bytes)
            .ok_or_else(|| {
                MediaError::OutOfMemory(format!("音频输出过大: {max_samples} 个采样"))
            })?;
        if needed > self.buffer.len() || !self.buffer.is_allocated() {
            self.buffer.grow_to(needed)?;
            debug!("音频输出缓冲区扩容到 {needed} 字节 ({max_samples} 个采样)");
        }

        self.decoded_sample_rate = Some(dst_sample_rate);
        self.decoded_layout = Some(dst_channel_layout);
        let capacity = self.buffer.len() / frame_bytes.max(1);
        self.capacity_per_channel = u32::try_from(capacity).unwrap_or(u32::MAX);

        let planes: Vec<&[u8]> = frame.data.iter().map(Vec::as_slice).collect();
        self.count_per_channel = self.cache.convert(
            &planes,
            frame.nb_samples,
            self.buffer.as_mut_slice(),
            self.capacity_per_channel,
        )?;
        Ok(())
    }

    /// 最近一次转换的有效输出
    pub fn samples(&self) -> Option<&[u8]> {
        let len = self.count_per_channel as usize
            * self.output_layout().channels as usize
            * self.sample_format.bytes_per_sample() as usize;
        self.buffer.as_slice().map(|buf| &buf[..len.min(buf.len())])
    }

    /// 更改输出配置, 只能在缓冲区分配之前进行
    pub fn configure(
        &mut self,
        sample_rate: Option<u32>,
        channels: Option<u32>,
        sample_format: SampleFormat,
    ) -> MediaResult<()> {
        if self.buffer.is_allocated() {
            return Err(MediaError::InvalidState(
                "音频输出缓冲区已分配, 不能再修改输出格式".into(),
            ));
        }
        crate::options::validate_audio_output(sample_rate, channels, sample_format)?;
        self.decoded_sample_rate = sample_rate;
        self.decoded_layout = channels.map(ChannelLayout::from_channels);
        self.sample_format = sample_format;
        Ok(())
    }

    pub fn release(&mut self) {
        self.cache.release();
        self.buffer.release();
        self.capacity_per_channel = 0;
        self.count_per_channel = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadec_resample::SoftwareResampler;

    fn s16_mono(nb_samples: u32, sample_rate: u32) -> AudioFrame {
        let mut frame = AudioFrame::new(nb_samples, sample_rate, SampleFormat::S16, ChannelLayout::MONO);
        frame.data[0] = vec![0; nb_samples as usize * 2];
        frame
    }

    fn output(options: AudioOutputOptions) -> AudioOutput {
        AudioOutput::new(Box::new(SoftwareResampler), &options)
    }

    #[test]
    fn test_learns_source_from_first_frame() {
        let mut out = output(AudioOutputOptions::default());
        out.process(&s16_mono(100, 8000), 44100).unwrap();
        assert_eq!(out.original_sample_rate, 8000);
        assert_eq!(out.original_layout, ChannelLayout::MONO);
        assert_eq!(out.decoded_sample_rate, Some(8000));
        assert_eq!(out.count_per_channel, 100);
        assert_eq!(out.capacity_per_channel, 100);
        assert_eq!(out.buffer.len(), 100 * 4);
        assert_eq!(out.samples().map(<[u8]>::len), Some(400));
    }

    #[test]
    fn test_zero_sample_rate_uses_fallback() {
        let mut out = output(AudioOutputOptions::default());
        out.process(&s16_mono(10, 0), 44100).unwrap();
        assert_eq!(out.original_sample_rate, 44100);
    }

    #[test]
    fn test_capacity_grows_only() {
        let mut out = output(AudioOutputOptions {
            sample_rate: Some(16000),
            channels: Some(2),
            ..Default::default()
        });
        out.process(&s16_mono(100, 8000), 44100).unwrap();
        assert_eq!(out.capacity_per_channel, 200);
        assert_eq!(out.buffer.len(), 200 * 2 * 4);

        out.process(&s16_mono(10, 8000), 44100).unwrap();
        assert_eq!(out.capacity_per_channel, 200);
        assert_eq!(out.count_per_channel, 20);

        out.process(&s16_mono(300, 8000), 44100).unwrap();
        assert_eq!(out.capacity_per_channel, 600);
        assert_eq!(out.cache.builds(), 1);
    }

    #[test]
    fn test_unknown_layout_is_rejected() {
        let mut out = output(AudioOutputOptions::default());
        let frame = AudioFrame::new(4, 8000, SampleFormat::S16, ChannelLayout::UNKNOWN);
        assert!(matches!(
            out.process(&frame, 44100),
            Err(MediaError::InvalidData(_))
        ));
        assert!(!out.buffer.is_allocated());
    }

    #[test]
    fn test_configure_after_allocation_fails() {
        let mut out = output(AudioOutputOptions::default());
        out.configure(Some(48000), Some(2), SampleFormat::S16).unwrap();
        out.process(&s16_mono(10, 48000), 44100).unwrap();
        assert_eq!(out.sample_format, SampleFormat::S16);
        assert!(out.configure(None, None, SampleFormat::F32).is_err());
    }
}
