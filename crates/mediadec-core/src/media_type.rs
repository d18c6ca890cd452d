//! 媒体类型定义.

use std::fmt;

/// 媒体流类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// 视频流
    Video,
    /// 音频流
    Audio,
    /// 字幕流
    Subtitle,
    /// 数据流
    Data,
}

impl MediaType {
    /// 解码上下文会为其选择流的媒体类型, 按定位优先级排列
    pub const SELECTABLE: [Self; 3] = [Self::Video, Self::Audio, Self::Subtitle];
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Data => "data",
        };
        write!(f, "{name}")
    }
}
