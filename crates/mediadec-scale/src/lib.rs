//! # mediadec-scale
//!
//! mediadec 图像缩放与像素格式转换引擎.
//!
//! 一次转换分三步完成:
//! 1. 把源图像 (YUV 平面/半平面, 打包 RGB, 灰度) 读取为 RGBA8 中间图像
//! 2. 按最近邻或双线性算法缩放中间图像
//! 3. 把中间图像写入目标打包格式 (8/16 位整数, 半精度或单精度浮点)
//!
//! 每一步都按行并行处理.
//!
//! 解码上下文只通过 [`Scaler`] / [`ScalePlan`] 两个 trait 使用本 crate,
//! 参数变化时由调用方释放旧计划并重新构建.

pub mod convert;
pub mod scale;

use log::debug;
use mediadec_core::{MediaError, MediaResult, PixelFormat};
use serde::{Deserialize, Serialize};

/// 缩放算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleAlgorithm {
    /// 最近邻 (速度最快, 质量最低)
    NearestNeighbor,
    /// 双线性插值 (速度与质量均衡)
    #[default]
    Bilinear,
}

/// 一次转换的完整参数, 同时作为转换计划缓存的键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaleParams {
    pub src_width: u32,
    pub src_height: u32,
    pub src_format: PixelFormat,
    pub dst_width: u32,
    pub dst_height: u32,
    pub dst_format: PixelFormat,
    pub algorithm: ScaleAlgorithm,
}

impl ScaleParams {
    /// 目标图像每行的最小字节数, 目标格式不是打包格式时返回 `None`
    pub fn dst_linesize(&self) -> Option<usize> {
        self.dst_format
            .bytes_per_pixel()
            .map(|bpp| bpp as usize * self.dst_width as usize)
    }

    /// 检查尺寸与格式是否可以构建转换计划
    pub fn validate(&self) -> MediaResult<()> {
        if self.src_width == 0 || self.src_height == 0 {
            return Err(MediaError::InvalidArgument(format!(
                "源尺寸无效: {}x{}",
                self.src_width, self.src_height
            )));
        }
        if self.dst_width == 0 || self.dst_height == 0 {
            return Err(MediaError::InvalidArgument(format!(
                "目标尺寸无效: {}x{}",
                self.dst_width, self.dst_height
            )));
        }
        if !convert::is_supported_source(self.src_format) {
            return Err(MediaError::Unsupported(format!(
                "不支持的源像素格式: {}",
                self.src_format
            )));
        }
        if !convert::is_supported_target(self.dst_format) {
            return Err(MediaError::Unsupported(format!(
                "不支持的目标像素格式: {}",
                self.dst_format
            )));
        }
        Ok(())
    }
}

/// 转换引擎: 根据参数构建转换计划
pub trait Scaler: Send {
    /// 引擎名称
    fn name(&self) -> &str;

    /// 构建转换计划, 参数不受支持时返回错误
    fn build(&self, params: &ScaleParams) -> MediaResult<Box<dyn ScalePlan>>;
}

/// 已构建的转换计划
pub trait ScalePlan: Send {
    /// 构建该计划时使用的参数
    fn params(&self) -> &ScaleParams;

    /// 执行转换
    ///
    /// - `src_data` / `src_linesize`: 源图像各平面数据及行跨度
    /// - `dst` / `dst_linesize`: 目标打包图像及行跨度
    fn scale(
        &mut self,
        src_data: &[&[u8]],
        src_linesize: &[usize],
        dst: &mut [u8],
        dst_linesize: usize,
    ) -> MediaResult<()>;
}

/// 纯软件转换引擎
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareScaler;

impl Scaler for SoftwareScaler {
    fn name(&self) -> &str {
        "software"
    }

    fn build(&self, params: &ScaleParams) -> MediaResult<Box<dyn ScalePlan>> {
        Ok(Box::new(ScaleContext::new(*params)?))
    }
}

/// 图像缩放/转换上下文
///
/// 构建一次后可对同样参数的图像反复转换, 中间缓冲区在多次调用间复用.
pub struct ScaleContext {
    params: ScaleParams,
    /// 源尺寸的 RGBA8 中间图像
    src_rgba: Vec<u8>,
    /// 目标尺寸的 RGBA8 中间图像, 尺寸不变时为空
    dst_rgba: Vec<u8>,
}

impl ScaleContext {
    /// 创建新的缩放上下文
    pub fn new(params: ScaleParams) -> MediaResult<Self> {
        params.validate()?;
        let src_len = rgba_len(params.src_width, params.src_height)?;
        let same_size =
            params.src_width == params.dst_width && params.src_height == params.dst_height;
        let dst_len = if same_size {
            0
        } else {
            rgba_len(params.dst_width, params.dst_height)?
        };

        debug!(
            "构建缩放计划: {}x{} {} -> {}x{} {} ({:?})",
            params.src_width,
            params.src_height,
            params.src_format,
            params.dst_width,
            params.dst_height,
            params.dst_format,
            params.algorithm,
        );
        Ok(Self {
            params,
            src_rgba: vec![0u8; src_len],
            dst_rgba: vec![0u8; dst_len],
        })
    }
}

fn rgba_len(width: u32, height: u32) -> MediaResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| MediaError::InvalidArgument(format!("图像尺寸溢出: {width}x{height}")))
}

impl ScalePlan for ScaleContext {
    fn params(&self) -> &ScaleParams {
        &self.params
    }

    fn scale(
        &mut self,
        src_data: &[&[u8]],
        src_linesize: &[usize],
        dst: &mut [u8],
        dst_linesize: usize,
    ) -> MediaResult<()> {
        let p = self.params;
        convert::check_source(p.src_format, p.src_width, p.src_height, src_data, src_linesize)?;
        convert::check_target(p.dst_format, p.dst_width, p.dst_height, dst, dst_linesize)?;

        convert::fetch_rgba(
            p.src_format,
            p.src_width,
            src_data,
            src_linesize,
            &mut self.src_rgba,
        )?;

        let rgba = if self.dst_rgba.is_empty() {
            &self.src_rgba
        } else {
            scale::resize_rgba(
                &self.src_rgba,
                p.src_width,
                p.src_height,
                &mut self.dst_rgba,
                p.dst_width,
                p.dst_height,
                p.algorithm,
            );
            &self.dst_rgba
        };

        convert::store_rgba(rgba, p.dst_width, p.dst_height, p.dst_format, dst, dst_linesize)
    }
}
