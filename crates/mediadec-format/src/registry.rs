//! 容器格式注册表.
//!
//! 管理所有已注册的解封装器, 支持按格式标识查找和自动探测.

use std::collections::HashMap;

use log::debug;
use mediadec_core::{MediaError, MediaResult};

use crate::demuxer::Demuxer;
use crate::format_id::FormatId;
use crate::input::FormatContext;
use crate::io::IoContext;
use crate::probe::{FormatProbe, ProbeResult};

/// 解封装器工厂函数类型
pub type DemuxerFactory = fn() -> MediaResult<Box<dyn Demuxer>>;

/// 探测时读取的最大头部字节数
const PROBE_SIZE: usize = 8192;

/// 容器格式注册表
pub struct FormatRegistry {
    demuxers: HashMap<FormatId, DemuxerFactory>,
    probes: Vec<Box<dyn FormatProbe + Send + Sync>>,
}

impl FormatRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            demuxers: HashMap::new(),
            probes: Vec::new(),
        }
    }

    /// 注册一个解封装器
    pub fn register_demuxer(&mut self, format_id: FormatId, factory: DemuxerFactory) {
        self.demuxers.insert(format_id, factory);
    }

    /// 注册一个格式探测器
    pub fn register_probe(&mut self, probe: Box<dyn FormatProbe + Send + Sync>) {
        self.probes.push(probe);
    }

    /// 创建指定格式的解封装器实例
    pub fn create_demuxer(&self, format_id: FormatId) -> MediaResult<Box<dyn Demuxer>> {
        let factory = self
            .demuxers
            .get(&format_id)
            .ok_or_else(|| MediaError::FormatNotFound(format!("未找到 {format_id} 的解封装器")))?;
        factory()
    }

    /// 探测数据的容器格式, 返回置信度最高的结果
    pub fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeResult> {
        let mut best: Option<ProbeResult> = None;
        for probe in &self.probes {
            if let Some(score) = probe.probe(data, filename) {
                if best.as_ref().is_none_or(|b| score > b.score) {
                    best = Some(ProbeResult {
                        format_id: probe.format_id(),
                        score,
                    });
                }
            }
        }
        best
    }

    /// 读取头部探测格式, 然后回到起始位置
    pub fn probe_input(&self, io: &mut IoContext, filename: Option<&str>) -> MediaResult<ProbeResult> {
        let mut head = vec![0u8; PROBE_SIZE];
        let len = io.read_up_to(&mut head)?;
        head.truncate(len);

        let result = self
            .probe(&head, filename)
            .ok_or_else(|| MediaError::FormatNotFound("无法识别输入格式".into()))?;
        io.seek(std::io::SeekFrom::Start(0))?;
        Ok(result)
    }

    /// 在已有 I/O 上下文上探测格式并打开解封装器
    pub fn open_io(&self, mut io: IoContext, filename: Option<&str>) -> MediaResult<FormatContext> {
        let result = self.probe_input(&mut io, filename)?;
        debug!("探测到格式 {} (置信度 {})", result.format_id, result.score);
        let mut demuxer = self.create_demuxer(result.format_id)?;
        demuxer.open(&mut io)?;
        Ok(FormatContext::new(io, demuxer))
    }

    /// 按 URL 打开输入
    pub fn open_input(&self, url: &str) -> MediaResult<FormatContext> {
        let io = IoContext::open_url(url)?;
        self.open_io(io, Some(url))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
