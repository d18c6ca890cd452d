//! 像素转换缓存.

use mediadec_core::MediaResult;
use mediadec_scale::{ScalePlan, ScaleParams, Scaler};

use super::PlanCache;

/// 视频帧的像素格式/尺寸转换缓存
pub struct PixelConversionCache {
    scaler: Box<dyn Scaler>,
    cache: PlanCache<ScaleParams, dyn ScalePlan>,
}

impl PixelConversionCache {
    pub fn new(scaler: Box<dyn Scaler>) -> Self {
        Self {
            scaler,
            cache: PlanCache::new(),
        }
    }

    /// 确保存在与 `params` 匹配的转换计划
    pub fn set_parameters(&mut self, params: &ScaleParams) -> MediaResult<()> {
        let scaler = &self.scaler;
        self.cache.set_parameters(params, |p| scaler.build(p))?;
        Ok(())
    }

    /// 使用当前计划转换一帧
    pub fn convert(
        &mut self,
        src_data: &[&[u8]],
        src_linesize: &[usize],
        dst: &mut [u8],
        dst_linesize: usize,
    ) -> MediaResult<()> {
        self.cache
            .plan_mut()?
            .scale(src_data, src_linesize, dst, dst_linesize)
    }

    pub fn release(&mut self) {
        self.cache.release();
    }

    /// 累计构建次数
    pub fn builds(&self) -> u64 {
        self.cache.builds()
    }

    /// 累计释放次数
    pub fn releases(&self) -> u64 {
        self.cache.releases()
    }
}
