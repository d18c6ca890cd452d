//! 解封装/解码与格式转换引擎接口.
//!
//! 解码上下文只通过 [`MediaEngine`] 访问外部能力: 按 URL 打开输入,
//! 为某一路流打开解码器, 以及创建像素与采样转换引擎.

use log::debug;
use mediadec_codec::{CodecRegistry, Decoder};
use mediadec_core::MediaResult;
use mediadec_format::{FormatRegistry, InputFormat, Stream};
use mediadec_resample::{Resampler, SoftwareResampler};
use mediadec_scale::{Scaler, SoftwareScaler};

/// 媒体引擎
pub trait MediaEngine: Send {
    /// 按 URL 打开容器输入
    fn open_input(&self, url: &str) -> MediaResult<Box<dyn InputFormat>>;

    /// 为指定流创建并打开解码器
    fn open_decoder(&self, stream: &Stream) -> MediaResult<Box<dyn Decoder>>;

    /// 创建像素转换引擎
    fn create_scaler(&self) -> Box<dyn Scaler>;

    /// 创建采样转换引擎
    fn create_resampler(&self) -> Box<dyn Resampler>;
}

/// 内置引擎: 内置容器格式 + 内置解码器 + 软件转换
pub struct DefaultEngine {
    formats: FormatRegistry,
    codecs: CodecRegistry,
}

impl DefaultEngine {
    /// 创建已注册全部内置格式与解码器的引擎
    pub fn new() -> Self {
        Self::with_registries(crate::default_format_registry(), crate::default_codec_registry())
    }

    /// 使用自定义注册表创建引擎
    pub fn with_registries(formats: FormatRegistry, codecs: CodecRegistry) -> Self {
        Self { formats, codecs }
    }
}

impl Default for DefaultEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaEngine for DefaultEngine {
    fn open_input(&self, url: &str) -> MediaResult<Box<dyn InputFormat>> {
        Ok(Box::new(self.formats.open_input(url)?))
    }

    fn open_decoder(&self, stream: &Stream) -> MediaResult<Box<dyn Decoder>> {
        let mut decoder = self.codecs.create_decoder(stream.codec_id)?;
        decoder.open(&stream.codec_parameters())?;
        debug!("流 #{} 使用解码器 {}", stream.index, decoder.name());
        Ok(decoder)
    }

    fn create_scaler(&self) -> Box<dyn Scaler> {
        Box::new(SoftwareScaler)
    }

    fn create_resampler(&self) -> Box<dyn Resampler> {
        Box::new(SoftwareResampler)
    }
}
