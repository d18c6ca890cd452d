//! 解封装器 trait 定义.

use mediadec_codec::Packet;
use mediadec_core::MediaResult;

use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::stream::Stream;

/// 解封装器 trait
///
/// 使用流程:
/// 1. 调用 `open()` 解析头部
/// 2. 调用 `streams()` 获取流信息
/// 3. 循环调用 `read_packet()` 读取数据包, 末尾返回 `Eof`
/// 4. 可选: 调用 `seek()` 定位
pub trait Demuxer: Send {
    /// 格式标识
    fn format_id(&self) -> FormatId;

    /// 格式名称
    fn name(&self) -> &str {
        self.format_id().name()
    }

    /// 打开容器并解析头部信息
    fn open(&mut self, io: &mut IoContext) -> MediaResult<()>;

    /// 所有流信息
    fn streams(&self) -> &[Stream];

    /// 读取下一个数据包
    fn read_packet(&mut self, io: &mut IoContext) -> MediaResult<Packet>;

    /// 定位到指定时间戳 (以该流的 time_base 为单位)
    fn seek(
        &mut self,
        io: &mut IoContext,
        stream_index: usize,
        timestamp: i64,
        flags: SeekFlags,
    ) -> MediaResult<()>;

    /// 容器时长 (秒), None 表示未知
    fn duration(&self) -> Option<f64>;
}

/// Seek 标志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekFlags {
    /// 向后 seek (目标之前最近的可解码位置)
    pub backward: bool,
    /// 允许定位到任意帧 (不仅是关键帧)
    pub any: bool,
}

impl Default for SeekFlags {
    fn default() -> Self {
        Self {
            backward: true,
            any: false,
        }
    }
}
