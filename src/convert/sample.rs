//! 采样转换缓存.

use mediadec_core::MediaResult;
use mediadec_resample::{ResamplePlan, ResampleParams, Resampler};

use super::PlanCache;

/// 音频帧的采样率/声道/采样格式转换缓存
pub struct SampleConversionCache {
    resampler: Box<dyn Resampler>,
    cache: PlanCache<ResampleParams, dyn ResamplePlan>,
}

impl SampleConversionCache {
    pub fn new(resampler: Box<dyn Resampler>) -> Self {
        Self {
            resampler,
            cache: PlanCache::new(),
        }
    }

    /// 确保存在与 `params` 匹配的转换计划
    pub fn set_parameters(&mut self, params: &ResampleParams) -> MediaResult<()> {
        let resampler = &self.resampler;
        self.cache.set_parameters(params, |p| resampler.build(p))?;
        Ok(())
    }

    /// 输入 `nb_samples` 个采样时最多产生的输出采样数
    pub fn max_output_samples(&mut self, nb_samples: u32) -> MediaResult<u32> {
        Ok(self.cache.plan_mut()?.max_output_samples(nb_samples))
    }

    /// 使用当前计划转换一帧, 返回输出的采样数 (每声道)
    pub fn convert(
        &mut self,
        input: &[&[u8]],
        nb_samples: u32,
        output: &mut [u8],
        out_capacity: u32,
    ) -> MediaResult<u32> {
        self.cache
            .plan_mut()?
            .convert(input, nb_samples, output, out_capacity)
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
