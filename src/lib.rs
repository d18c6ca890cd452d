//! # mediadec
//!
//! 拉取式媒体解码编排层.
//!
//! 打开一个媒体容器, 选出一路视频与一路音频, 然后由宿主程序逐帧拉取
//! 解码并转换好格式的帧, 用于播放或逐帧定位. 本 crate 不负责显示或发声.
//!
//! - **流选择**: 打开时选出第一路视频, 音频与字幕流
//! - **帧路由**: 读包, 送入对应解码器, 取出一帧并按类型分派
//! - **格式转换缓存**: 像素/采样转换计划按参数缓存, 参数变化时才重建
//! - **播放时钟**: 按墙上时钟推进, 到达末尾时自动循环
//! - **定位**: 重新定位容器并拉取若干帧完成同步
//! - **静态图片判定**: 只有一帧且没有时长的视频按图片处理
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use mediadec::{DecoderContext, FrameStatus};
//!
//! let mut ctx = DecoderContext::open("clip.y4m").unwrap();
//! while let FrameStatus::Ready { .. } = ctx.next_frame().unwrap() {
//!     ctx.decode_frame().unwrap();
//!     let rgba = ctx.video_buffer().unwrap();
//!     println!("帧大小: {} 字节", rgba.len());
//! }
//! ctx.close();
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `mediadec-core` | 核心类型与错误 |
//! | `mediadec-codec` | 数据包, 帧与解码器 |
//! | `mediadec-format` | I/O, 解封装器与已打开输入 |
//! | `mediadec-scale` | 图像缩放与像素格式转换 |
//! | `mediadec-resample` | 音频重采样 |

pub mod buffer;
pub mod context;
pub mod convert;
pub mod engine;
pub mod options;

/// 核心类型与工具
pub use mediadec_core as core;

/// 数据包, 帧与解码器
pub use mediadec_codec as codec;

/// I/O 与容器格式
pub use mediadec_format as format;

/// 图像缩放与像素格式转换
pub use mediadec_scale as scale;

/// 音频重采样
pub use mediadec_resample as resample;

pub use context::{
    AudioInfo, ConversionStats, DecoderContext, FrameStatus, ImageState, PlayStatus, PlaybackInfo,
    StreamSelection, VideoInfo,
};
pub use engine::{DefaultEngine, MediaEngine};
pub use options::{AudioOutputOptions, DecoderOptions, VideoOutputOptions};

/// 获取 mediadec 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置解码器的注册表
pub fn default_codec_registry() -> mediadec_codec::CodecRegistry {
    let mut registry = mediadec_codec::CodecRegistry::new();
    mediadec_codec::register_all(&mut registry);
    registry
}

/// 创建已注册所有内置容器格式的注册表
pub fn default_format_registry() -> mediadec_format::FormatRegistry {
    let mut registry = mediadec_format::FormatRegistry::new();
    mediadec_format::register_all(&mut registry);
    registry
}
