//! 格式转换缓存.
//!
//! 每个缓存最多持有一个活动的转换计划, 以及构建它时使用的参数.
//! 参数与上次完全相同时直接复用计划; 不同时先释放旧计划, 再构建新计划.

pub mod pixel;
pub mod sample;

pub use pixel::PixelConversionCache;
pub use sample::SampleConversionCache;

use std::fmt::Debug;

use log::debug;
use mediadec_core::{MediaError, MediaResult};

/// 单条目的转换计划缓存
///
/// `K` 为参数键, `P` 为计划类型 (通常是 trait 对象).
pub struct PlanCache<K, P: ?Sized> {
    entry: Option<(K, Box<P>)>,
    builds: u64,
    releases: u64,
}

impl<K, P> PlanCache<K, P>
where
    K: Copy + PartialEq + Debug,
    P: ?Sized,
{
    pub fn new() -> Self {
        Self {
            entry: None,
            builds: 0,
            releases: 0,
        }
    }

    /// 按参数取得计划, 必要时释放旧计划并调用 `build` 构建新计划
    ///
    /// 构建失败时缓存为空, 之后的 [`Self::plan_mut`] 返回错误.
    pub fn set_parameters<F>(&mut self, key: &K, build: F) -> MediaResult<&mut P>
    where
        F: FnOnce(&K) -> MediaResult<Box<P>>,
    {
        let hit = matches!(&self.entry, Some((cached, _)) if cached == key);
        if !hit {
            self.release();
            let plan = build(key)?;
            self.builds += 1;
            debug!("构建转换计划 #{}: {key:?}", self.builds);
            self.entry = Some((*key, plan));
        }
        self.plan_mut()
    }

    /// 当前计划, 从未构建过时返回 `InvalidState`
    pub fn plan_mut(&mut self) -> MediaResult<&mut P> {
        match self.entry.as_mut() {
            Some((_, plan)) => Ok(plan.as_mut()),
            None => Err(MediaError::InvalidState("转换计划尚未构建".into())),
        }
    }

    /// 释放当前计划
    pub fn release(&mut self) {
        if let Some((key, _)) = self.entry.take() {
            self.releases += 1;
            debug!("释放转换计划: {key:?}");
        }
    }

    /// 累计构建次数
    pub fn builds(&self) -> u64 {
        self.builds
    }

    /// 累计释放次数
    pub fn releases(&self) -> u64 {
        self.releases
    }
}

impl<K, P> Default for PlanCache<K, P>
where
    K: Copy + PartialEq + Debug,
    P: ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestCache = PlanCache<(u32, u32), Vec<u32>>;

    fn build(key: &(u32, u32)) -> MediaResult<Box<Vec<u32>>> {
        Ok(Box::new(vec![key.0, key.1]))
    }

    #[test]
    fn test_same_key_builds_once() {
        let mut cache = TestCache::new();
        cache.set_parameters(&(1, 2), build).unwrap();
        cache.set_parameters(&(1, 2), build).unwrap();
        assert_eq!(cache.builds(), 1);
        assert_eq!(cache.releases(), 0);
    }

    #[test]
    fn test_changed_key_rebuilds_and_releases() {
        let mut cache = TestCache::new();
        cache.set_parameters(&(1, 2), build).unwrap();
        let plan = cache.set_parameters(&(1, 3), build).unwrap();
        assert_eq!(plan.as_slice(), &[1, 3]);
        assert_eq!(cache.builds(), 2);
        assert_eq!(cache.releases(), 1);
    }

    #[test]
    fn test_failed_build_leaves_cache_empty() {
        let mut cache = TestCache::new();
        cache.set_parameters(&(1, 2), build).unwrap();
        let result = cache.set_parameters(&(9, 9), |_| {
            Err(MediaError::Unsupported("测试".into()))
        });
        assert!(result.is_err());
        assert_eq!(cache.releases(), 1);
        assert!(matches!(cache.plan_mut(), Err(MediaError::InvalidState(_))));
    }

    #[test]
    fn test_plan_before_build_is_error() {
        let mut cache = TestCache::new();
        assert!(cache.plan_mut().is_err());
        cache.release();
        assert_eq!(cache.releases(), 0);
    }
}
