//! # mediadec-core
//!
//! mediadec 的基础类型库, 提供错误类型、媒体类型、像素/采样格式、
//! 声道布局以及时间基与时间戳.
//!
//! 其余 crate (编解码、容器、转换引擎以及解码上下文) 都建立在本 crate 之上.

pub mod channel_layout;
pub mod error;
pub mod media_type;
pub mod pixel_format;
pub mod rational;
pub mod sample_format;
pub mod timestamp;

// 重导出常用类型
pub use channel_layout::{ChannelLayout, ChannelMask};
pub use error::{MediaError, MediaResult};
pub use media_type::MediaType;
pub use pixel_format::PixelFormat;
pub use rational::Rational;
pub use sample_format::SampleFormat;
pub use timestamp::{NOPTS_VALUE, Timestamp};
