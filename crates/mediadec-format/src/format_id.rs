//! 容器格式标识符.

use std::fmt;

/// 容器格式标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FormatId {
    /// WAV (RIFF WAVE)
    Wav,
    /// YUV4MPEG2 原始视频序列
    Y4m,
    /// 便携式任意图 (PGM P5 / PPM P6)
    Pnm,
}

impl FormatId {
    /// 格式名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Y4m => "yuv4mpegpipe",
            Self::Pnm => "pnm",
        }
    }

    /// 常见文件扩展名
    pub const fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Wav => &["wav", "wave"],
            Self::Y4m => &["y4m"],
            Self::Pnm => &["pgm", "ppm", "pnm"],
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
