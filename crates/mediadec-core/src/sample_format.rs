//! 音频采样格式定义.
//!
//! - 交错 (Interleaved): 所有声道的采样点交替排列, 如 LRLRLR...
//! - 平面 (Planar): 每个声道独立存储, 如 LLL...RRR...

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 音频采样格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SampleFormat {
    /// 未指定
    #[serde(rename = "none")]
    None,
    /// 无符号 8 位整数, 交错
    #[serde(rename = "u8")]
    U8,
    /// 有符号 16 位整数, 交错
    #[serde(rename = "s16")]
    S16,
    /// 有符号 32 位整数, 交错
    #[serde(rename = "s32")]
    S32,
    /// 32 位浮点, 交错
    #[serde(rename = "flt")]
    F32,
    /// 64 位浮点, 交错
    #[serde(rename = "dbl")]
    F64,
    /// 无符号 8 位整数, 平面
    #[serde(rename = "u8p")]
    U8p,
    /// 有符号 16 位整数, 平面
    #[serde(rename = "s16p")]
    S16p,
    /// 有符号 32 位整数, 平面
    #[serde(rename = "s32p")]
    S32p,
    /// 32 位浮点, 平面
    #[serde(rename = "fltp")]
    F32p,
    /// 64 位浮点, 平面
    #[serde(rename = "dblp")]
    F64p,
}

impl SampleFormat {
    /// 每个采样点占用的字节数
    pub const fn bytes_per_sample(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::U8 | Self::U8p => 1,
            Self::S16 | Self::S16p => 2,
            Self::S32 | Self::S32p | Self::F32 | Self::F32p => 4,
            Self::F64 | Self::F64p => 8,
        }
    }

    /// 是否为平面格式
    pub const fn is_planar(&self) -> bool {
        matches!(
            self,
            Self::U8p | Self::S16p | Self::S32p | Self::F32p | Self::F64p
        )
    }

    /// 获取对应的交错格式
    pub const fn to_interleaved(&self) -> Self {
        match self {
            Self::U8p => Self::U8,
            Self::S16p => Self::S16,
            Self::S32p => Self::S32,
            Self::F32p => Self::F32,
            Self::F64p => Self::F64,
            other => *other,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::U8 => "u8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::F32 => "flt",
            Self::F64 => "dbl",
            Self::U8p => "u8p",
            Self::S16p => "s16p",
            Self::S32p => "s32p",
            Self::F32p => "fltp",
            Self::F64p => "dblp",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SampleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fmt = match s.to_ascii_lowercase().as_str() {
            "u8" => Self::U8,
            "s16" => Self::S16,
            "s32" => Self::S32,
            "flt" | "f32" | "float" => Self::F32,
            "dbl" | "f64" | "double" => Self::F64,
            "u8p" => Self::U8p,
            "s16p" => Self::S16p,
            "s32p" => Self::S32p,
            "fltp" => Self::F32p,
            "dblp" => Self::F64p,
            other => return Err(format!("未知采样格式: {other}")),
        };
        Ok(fmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_sample() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::S16p.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F32.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::F64p.bytes_per_sample(), 8);
    }

    #[test]
    fn test_planar_to_interleaved() {
        assert!(SampleFormat::F32p.is_planar());
        assert_eq!(SampleFormat::F32p.to_interleaved(), SampleFormat::F32);
        assert_eq!(SampleFormat::S16.to_interleaved(), SampleFormat::S16);
    }

    #[test]
    fn test_parse_and_display_agree() {
        for fmt in [SampleFormat::U8, SampleFormat::F32, SampleFormat::S32p] {
            assert_eq!(fmt.to_string().parse::<SampleFormat>(), Ok(fmt));
        }
    }
}
