//! # mediadec-format
//!
//! 容器层: 统一的 I/O 上下文, 解封装器 trait 与格式探测, 以及把二者绑定在一起的
//! [`FormatContext`]. 解码上下文只通过 [`InputFormat`] trait 与这一层交互.
//!
//! 内置格式: WAV, YUV4MPEG2 (Y4M), PNM (P5/P6).

pub mod demuxer;
pub mod demuxers;
pub mod format_id;
pub mod input;
pub mod io;
pub mod probe;
pub mod registry;
pub mod stream;

// 重导出常用类型
pub use demuxer::{Demuxer, SeekFlags};
pub use format_id::FormatId;
pub use input::{FormatContext, InputFormat};
pub use io::IoContext;
pub use probe::ProbeResult;
pub use registry::FormatRegistry;
pub use stream::{AudioStreamParams, Stream, StreamParams, VideoStreamParams};

/// 注册所有内置容器格式
pub fn register_all(registry: &mut FormatRegistry) {
    demuxers::register_all_demuxers(registry);
}
