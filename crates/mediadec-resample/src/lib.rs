//! # mediadec-resample
//!
//! mediadec 音频重采样引擎, 提供:
//! - 采样格式转换 (如 S16 平面 -> F32 交错)
//! - 声道布局转换 (如 5.1 -> 立体声)
//! - 采样率转换 (如 44100Hz -> 48000Hz, 线性插值)
//!
//! 输出总是交错格式.

pub mod convert;
pub mod mix;

use log::debug;
use mediadec_core::{ChannelLayout, MediaError, MediaResult, SampleFormat};

pub use mix::MixMatrix;

/// 一次转换的完整参数, 同时作为转换计划缓存的键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResampleParams {
    pub src_sample_rate: u32,
    pub src_channel_layout: ChannelLayout,
    pub src_sample_format: SampleFormat,
    pub dst_sample_rate: u32,
    pub dst_channel_layout: ChannelLayout,
    pub dst_sample_format: SampleFormat,
}

impl ResampleParams {
    /// 检查参数是否可以构建转换计划
    pub fn validate(&self) -> MediaResult<()> {
        if self.src_sample_rate == 0 || self.dst_sample_rate == 0 {
            return Err(MediaError::InvalidArgument(format!(
                "采样率无效: {} -> {}",
                self.src_sample_rate, self.dst_sample_rate
            )));
        }
        if !self.src_channel_layout.is_known() || !self.dst_channel_layout.is_known() {
            return Err(MediaError::InvalidArgument(format!(
                "声道布局无效: {} -> {}",
                self.src_channel_layout, self.dst_channel_layout
            )));
        }
        if self.src_sample_format == SampleFormat::None {
            return Err(MediaError::Unsupported("源采样格式未知".into()));
        }
        if self.dst_sample_format == SampleFormat::None || self.dst_sample_format.is_planar() {
            return Err(MediaError::Unsupported(format!(
                "不支持的输出采样格式: {}",
                self.dst_sample_format
            )));
        }
        Ok(())
    }

    /// 输出每个采样点 (所有声道) 的字节数
    pub fn dst_frame_bytes(&self) -> usize {
        self.dst_sample_format.bytes_per_sample() as usize
            * self.dst_channel_layout.channels as usize
    }
}

/// 转换引擎: 根据参数构建转换计划
pub trait Resampler: Send {
    /// 引擎名称
    fn name(&self) -> &str;

    /// 构建转换计划, 参数不受支持时返回错误
    fn build(&self, params: &ResampleParams) -> MediaResult<Box<dyn ResamplePlan>>;
}

/// 已构建的转换计划
pub trait ResamplePlan: Send {
    /// 构建该计划时使用的参数
    fn params(&self) -> &ResampleParams;

    /// 输入 `nb_samples` 个采样 (每声道) 时最多产生的输出采样数
    fn max_output_samples(&self, nb_samples: u32) -> u32;

    /// 执行转换
    ///
    /// - `input`: 平面格式每声道一个平面, 交错格式一个平面
    /// - `output`: 交错输出缓冲区, 容量为 `out_capacity` 个采样 (每声道)
    ///
    /// 返回实际输出的采样数 (每声道).
    fn convert(
        &mut self,
        input: &[&[u8]],
        nb_samples: u32,
        output: &mut [u8],
        out_capacity: u32,
    ) -> MediaResult<u32>;
}

/// 纯软件转换引擎
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareResampler;

impl Resampler for SoftwareResampler {
    fn name(&self) -> &str {
        "software"
    }

    fn build(&self, params: &ResampleParams) -> MediaResult<Box<dyn ResamplePlan>> {
        Ok(Box::new(ResampleContext::new(*params)?))
    }
}

/// 重采样上下文
///
/// 构建一次后可对同样参数的音频反复转换. 处理顺序:
/// 1. 采样格式解码为 f64
/// 2. 声道布局转换
/// 3. 采样率转换 (线性插值)
/// 4. 编码为目标采样格式
pub struct ResampleContext {
    params: ResampleParams,
    matrix: Option<MixMatrix>,
    decoded: Vec<f64>,
    mixed: Vec<f64>,
    resampled: Vec<f64>,
}

impl ResampleContext {
    /// 创建新的重采样上下文
    pub fn new(params: ResampleParams) -> MediaResult<Self> {
        params.validate()?;
        let matrix = MixMatrix::new(params.src_channel_layout, params.dst_channel_layout);
        debug!(
            "构建重采样计划: {}Hz {} {} -> {}Hz {} {}",
            params.src_sample_rate,
            params.src_channel_layout,
            params.src_sample_format,
            params.dst_sample_rate,
            params.dst_channel_layout,
            params.dst_sample_format,
        );
        Ok(Self {
            params,
            matrix: (!matrix.is_identity()).then_some(matrix),
            decoded: Vec::new(),
            mixed: Vec::new(),
            resampled: Vec::new(),
        })
    }

    /// 是否需要转换 (源和目标参数不同)
    pub fn is_needed(&self) -> bool {
        let p = &self.params;
        p.src_sample_rate != p.dst_sample_rate
            || p.src_sample_format != p.dst_sample_format
            || p.src_channel_layout != p.dst_channel_layout
    }

    fn output_samples(&self, nb_samples: u32) -> u32 {
        let p = &self.params;
        if p.src_sample_rate == p.dst_sample_rate {
            return nb_samples;
        }
        let n = (u64::from(nb_samples) * u64::from(p.dst_sample_rate))
            .div_ceil(u64::from(p.src_sample_rate));
        u32::try_from(n).unwrap_or(u32::MAX)
    }
}

impl ResamplePlan for ResampleContext {
    fn params(&self) -> &ResampleParams {
        &self.params
    }

    fn max_output_samples(&self, nb_samples: u32) -> u32 {
        self.output_samples(nb_samples)
    }

    fn convert(
        &mut self,
        input: &[&[u8]],
        nb_samples: u32,
        output: &mut [u8],
        out_capacity: u32,
    ) -> MediaResult<u32> {
        let out_samples = self.output_samples(nb_samples);
        if out_samples > out_capacity {
            return Err(MediaError::InvalidArgument(format!(
                "输出容量不足: 需要 {out_samples} 个采样, 容量 {out_capacity}"
            )));
        }
        if nb_samples == 0 {
            return Ok(0);
        }

        let p = self.params;
        let src_channels = p.src_channel_layout.channels as usize;
        let dst_channels = p.dst_channel_layout.channels as usize;

        convert::decode_samples(
            input,
            p.src_sample_format,
            nb_samples as usize,
            src_channels,
            &mut self.decoded,
        )?;

        let mixed = match &self.matrix {
            Some(matrix) => {
                matrix.apply(&self.decoded, &mut self.mixed);
                &self.mixed
            }
            None => &self.decoded,
        };

        let samples = if p.src_sample_rate == p.dst_sample_rate {
            mixed
        } else {
            resample_linear(
                mixed,
                nb_samples as usize,
                dst_channels,
                out_samples as usize,
                p.src_sample_rate,
                p.dst_sample_rate,
                &mut self.resampled,
            );
            &self.resampled
        };

        convert::encode_samples(samples, p.dst_sample_format, output)?;
        Ok(out_samples)
    }
}

/// 线性插值重采样
fn resample_linear(
    input: &[f64],
    nb_samples: usize,
    channels: usize,
    out_samples: usize,
    src_rate: u32,
    dst_rate: u32,
    out: &mut Vec<f64>,
) {
    out.clear();
    out.reserve(out_samples * channels);

    let ratio = f64::from(src_rate) / f64::from(dst_rate);
    let last = nb_samples - 1;
    for i in 0..out_samples {
        let src_pos = i as f64 * ratio;
        let idx0 = (src_pos.floor() as usize).min(last);
        let frac = src_pos - idx0 as f64;
        let idx1 = (idx0 + 1).min(last);

        for ch in 0..channels {
            let s0 = input[idx0 * channels + ch];
            let s1 = input[idx1 * channels + ch];
            out.push(s0 + (s1 - s0) * frac);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        src: (u32, ChannelLayout, SampleFormat),
        dst: (u32, ChannelLayout, SampleFormat),
    ) -> ResampleParams {
        ResampleParams {
            src_sample_rate: src.0,
            src_channel_layout: src.1,
            src_sample_format: src.2,
            dst_sample_rate: dst.0,
            dst_channel_layout: dst.1,
            dst_sample_format: dst.2,
        }
    }

    #[test]
    fn test_no_conversion_needed() {
        let p = params(
            (44100, ChannelLayout::STEREO, SampleFormat::S16),
            (44100, ChannelLayout::STEREO, SampleFormat::S16),
        );
        let mut ctx = ResampleContext::new(p).unwrap();
        assert!(!ctx.is_needed());

        let data: Vec<u8> = (0..100).collect();
        let mut out = vec![0u8; 100];
        assert_eq!(ctx.convert(&[&data], 25, &mut out, 25).unwrap(), 25);
        assert_eq!(out, data);
    }

    #[test]
    fn test_format_convert_s16p_to_flt() {
        let p = params(
            (44100, ChannelLayout::STEREO, SampleFormat::S16p),
            (44100, ChannelLayout::STEREO, SampleFormat::F32),
        );
        let mut ctx = SoftwareResampler.build(&p).unwrap();
        let left = 32767i16.to_le_bytes();
        let right = (-32768i16).to_le_bytes();
        let mut out = vec![0u8; 8];
        assert_eq!(ctx.convert(&[&left, &right], 1, &mut out, 1).unwrap(), 1);

        let l = f32::from_le_bytes([out[0], out[1], out[2], out[3]]);
        let r = f32::from_le_bytes([out[4], out[5], out[6], out[7]]);
        assert!((l - (32767.0 / 32768.0)).abs() < 0.001);
        assert_eq!(r, -1.0);
    }

    #[test]
    fn test_channel_convert_mono_to_stereo() {
        let p = params(
            (44100, ChannelLayout::MONO, SampleFormat::S16),
            (44100, ChannelLayout::STEREO, SampleFormat::S16),
        );
        let mut ctx = ResampleContext::new(p).unwrap();

        let mut input = Vec::new();
        input.extend_from_slice(&1000i16.to_le_bytes());
        input.extend_from_slice(&(-2000i16).to_le_bytes());
        let mut out = vec![0u8; 8];
        assert_eq!(ctx.convert(&[&input], 2, &mut out, 2).unwrap(), 2);

        let samples: Vec<i16> = out
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![1000, 1000, -2000, -2000]);
    }

    #[test]
    fn test_sample_rate_convert_44100_to_48000() {
        let p = params(
            (44100, ChannelLayout::MONO, SampleFormat::S16),
            (48000, ChannelLayout::MONO, SampleFormat::S16),
        );
        let mut ctx = ResampleContext::new(p).unwrap();
        let nb_in = 100u32;
        assert_eq!(ctx.max_output_samples(nb_in), 109);

        let mut input = Vec::with_capacity(nb_in as usize * 2);
        for i in 0..nb_in {
            input.extend_from_slice(&((i * 100) as i16).to_le_bytes());
        }
        let mut out = vec![0u8; 109 * 2];
        let produced = ctx.convert(&[&input], nb_in, &mut out, 109).unwrap();
        assert_eq!(produced, 109);

        // 递增输入插值后仍单调不减
        let samples: Vec<i16> = out
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples[0], 0);
        assert!(samples.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_sample_rate_convert_48000_to_44100() {
        let p = params(
            (48000, ChannelLayout::STEREO, SampleFormat::F32),
            (44100, ChannelLayout::STEREO, SampleFormat::F32),
        );
        let ctx = ResampleContext::new(p).unwrap();
        // ceil(1024 * 44100 / 48000) = 941
        assert_eq!(ctx.max_output_samples(1024), 941);
    }

    #[test]
    fn test_capacity_too_small() {
        let p = params(
            (8000, ChannelLayout::MONO, SampleFormat::U8),
            (16000, ChannelLayout::MONO, SampleFormat::U8),
        );
        let mut ctx = ResampleContext::new(p).unwrap();
        let mut out = vec![0u8; 4];
        assert!(matches!(
            ctx.convert(&[&[128, 128]], 2, &mut out, 3),
            Err(MediaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_params() {
        let p = params(
            (0, ChannelLayout::MONO, SampleFormat::S16),
            (44100, ChannelLayout::MONO, SampleFormat::S16),
        );
        assert!(SoftwareResampler.build(&p).is_err());

        let p = params(
            (44100, ChannelLayout::MONO, SampleFormat::S16),
            (44100, ChannelLayout::MONO, SampleFormat::F32p),
        );
        assert!(matches!(
            SoftwareResampler.build(&p),
            Err(MediaError::Unsupported(_))
        ));

        let p = params(
            (44100, ChannelLayout::UNKNOWN, SampleFormat::S16),
            (44100, ChannelLayout::MONO, SampleFormat::S16),
        );
        assert!(SoftwareResampler.build(&p).is_err());
    }
}
