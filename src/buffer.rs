//! 只增不减的输出缓冲区.
//!
//! 分配与扩容都走 `try_reserve_exact`, 失败时返回 `OutOfMemory`,
//! 原有内容和容量保持不变.

use mediadec_core::{MediaError, MediaResult};

/// 帧输出缓冲区
#[derive(Debug, Default)]
pub struct FrameBuffer {
    data: Vec<u8>,
    allocated: bool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已分配
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// 当前字节数
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 已分配时返回内容
    pub fn as_slice(&self) -> Option<&[u8]> {
        self.allocated.then_some(self.data.as_slice())
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// 扩容到至少 `len` 字节, 已经足够时什么也不做
    ///
    /// 新增部分填 0. 首次调用即为分配.
    pub fn grow_to(&mut self, len: usize) -> MediaResult<()> {
        if self.allocated && len <= self.data.len() {
            return Ok(());
        }
        let additional = len.saturating_sub(self.data.len());
        self.data.try_reserve_exact(additional).map_err(|e| {
            MediaError::OutOfMemory(format!("无法分配 {len} 字节输出缓冲区: {e}"))
        })?;
        self.data.resize(len.max(self.data.len()), 0);
        self.allocated = true;
        Ok(())
    }

    /// 释放缓冲区
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.allocated = false;
    }
}
