//! 已打开的输入.
//!
//! [`InputFormat`] 是解码上下文看到的容器接口: 流列表, 时长, 读包, 按时间戳定位.
//! [`FormatContext`] 把 I/O 上下文与解封装器绑定在一起实现该接口.

use log::debug;
use mediadec_codec::Packet;
use mediadec_core::{MediaError, MediaResult};

use crate::demuxer::{Demuxer, SeekFlags};
use crate::io::IoContext;
use crate::stream::Stream;

/// 已打开的容器输入
pub trait InputFormat: Send {
    /// 格式名称
    fn format_name(&self) -> &str;

    /// 所有流信息
    fn streams(&self) -> &[Stream];

    /// 容器级时长 (秒), None 表示未知
    fn duration(&self) -> Option<f64>;

    /// 读取下一个数据包, 末尾返回 `Eof`
    fn read_packet(&mut self) -> MediaResult<Packet>;

    /// 定位到 `stream_index` 流 time_base 下的时间戳
    fn seek(&mut self, stream_index: usize, timestamp: i64, flags: SeekFlags) -> MediaResult<()>;
}

/// I/O 上下文 + 解封装器
pub struct FormatContext {
    io: IoContext,
    demuxer: Box<dyn Demuxer>,
}

impl FormatContext {
    /// 由已打开的解封装器创建
    pub fn new(io: IoContext, demuxer: Box<dyn Demuxer>) -> Self {
        Self { io, demuxer }
    }
}

impl InputFormat for FormatContext {
    fn format_name(&self) -> &str {
        self.demuxer.name()
    }

    fn streams(&self) -> &[Stream] {
        self.demuxer.streams()
    }

    fn duration(&self) -> Option<f64> {
        self.demuxer.duration()
    }

    fn read_packet(&mut self) -> MediaResult<Packet> {
        self.demuxer.read_packet(&mut self.io)
    }

    fn seek(&mut self, stream_index: usize, timestamp: i64, flags: SeekFlags) -> MediaResult<()> {
        if stream_index >= self.demuxer.streams().len() {
            return Err(MediaError::StreamNotFound(stream_index));
        }
        debug!(
            "{}: 定位流 #{stream_index} 到时间戳 {timestamp}",
            self.demuxer.name()
        );
        self.demuxer.seek(&mut self.io, stream_index, timestamp, flags)
    }
}
