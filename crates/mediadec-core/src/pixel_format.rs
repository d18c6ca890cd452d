//! 像素格式定义.
//!
//! 分为两类: 解码器输出的源格式 (YUV 平面/半平面, 8 位打包 RGB, 灰度)
//! 以及解码上下文对外提供的打包输出格式 (8/16 位整数, 16/32 位浮点 RGBA).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 像素格式
///
/// 命名规则: 颜色空间 + 位深 + 排列方式 (p = Planar, le = 小端).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum PixelFormat {
    /// 未指定
    None,

    // ========================
    // YUV 平面格式
    // ========================
    /// YUV 4:2:0 平面, 8 位, 有限范围
    Yuv420p,
    /// YUV 4:2:2 平面, 8 位, 有限范围
    Yuv422p,
    /// YUV 4:4:4 平面, 8 位, 有限范围
    Yuv444p,
    /// YUV 4:2:0 平面, 8 位, 全范围 (JPEG)
    Yuvj420p,
    /// YUV 4:2:2 平面, 8 位, 全范围 (JPEG)
    Yuvj422p,
    /// YUV 4:4:4 平面, 8 位, 全范围 (JPEG)
    Yuvj444p,

    // ========================
    // YUV 半平面格式
    // ========================
    /// Y 平面 + UV 交错, 4:2:0
    Nv12,
    /// Y 平面 + VU 交错, 4:2:0
    Nv21,

    // ========================
    // 8 位打包格式
    // ========================
    /// RGB 各 8 位
    Rgb24,
    /// BGR 各 8 位
    Bgr24,
    /// RGBA 各 8 位
    Rgba,
    /// BGRA 各 8 位
    Bgra,
    /// ARGB 各 8 位
    Argb,
    /// 灰度 8 位, 也用作单通道 R8 输出
    Gray8,

    // ========================
    // 高位深打包格式 (仅作输出)
    // ========================
    /// RGB 各 16 位, 小端
    Rgb48le,
    /// RGBA 各 16 位, 小端
    Rgba64le,
    /// RGBA 各 16 位半精度浮点, 小端
    Rgbaf16le,
    /// RGBA 各 32 位浮点, 小端
    Rgbaf32le,
}

impl PixelFormat {
    /// 打包格式每个像素的字节数, 平面/半平面格式返回 `None`
    pub const fn bytes_per_pixel(&self) -> Option<u32> {
        match self {
            Self::Gray8 => Some(1),
            Self::Rgb24 | Self::Bgr24 => Some(3),
            Self::Rgba | Self::Bgra | Self::Argb => Some(4),
            Self::Rgb48le => Some(6),
            Self::Rgba64le | Self::Rgbaf16le => Some(8),
            Self::Rgbaf32le => Some(16),
            _ => None,
        }
    }

    /// 色度子采样 (log2 水平, log2 垂直)
    pub const fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p | Self::Yuvj420p | Self::Nv12 | Self::Nv21 => (1, 1),
            Self::Yuv422p | Self::Yuvj422p => (1, 0),
            _ => (0, 0),
        }
    }

    /// 是否为 YUV 格式 (平面或半平面)
    pub const fn is_yuv(&self) -> bool {
        matches!(
            self,
            Self::Yuv420p
                | Self::Yuv422p
                | Self::Yuv444p
                | Self::Yuvj420p
                | Self::Yuvj422p
                | Self::Yuvj444p
                | Self::Nv12
                | Self::Nv21
        )
    }

    /// 是否为全范围 (0-255) YUV
    pub const fn is_full_range(&self) -> bool {
        matches!(self, Self::Yuvj420p | Self::Yuvj422p | Self::Yuvj444p)
    }

    /// 把已弃用的 JPEG 全范围格式映射为对应的普通 YUV 格式
    ///
    /// 返回 (映射后的格式, 是否全范围). 其余格式原样返回.
    pub const fn normalize_range(&self) -> (Self, bool) {
        match self {
            Self::Yuvj420p => (Self::Yuv420p, true),
            Self::Yuvj422p => (Self::Yuv422p, true),
            Self::Yuvj444p => (Self::Yuv444p, true),
            other => (*other, false),
        }
    }

    /// 平面数量
    pub const fn plane_count(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Yuv420p
            | Self::Yuv422p
            | Self::Yuv444p
            | Self::Yuvj420p
            | Self::Yuvj422p
            | Self::Yuvj444p => 3,
            Self::Nv12 | Self::Nv21 => 2,
            _ => 1,
        }
    }

    /// 指定平面每行的字节数
    ///
    /// 格式为 None 或平面索引越界时返回 `None`.
    pub fn plane_linesize(&self, plane: usize, width: u32) -> Option<usize> {
        if plane >= self.plane_count() as usize {
            return None;
        }
        let w = width as usize;
        if let Some(bpp) = self.bytes_per_pixel() {
            return Some(w * bpp as usize);
        }
        let (sub_h, _) = self.chroma_subsampling();
        Some(match self {
            // NV12/NV21 的 UV 平面: (w/2) 对 * 2 字节
            Self::Nv12 | Self::Nv21 if plane == 1 => w.div_ceil(2) * 2,
            _ if plane == 0 => w,
            _ => chroma_len(w, sub_h),
        })
    }

    /// 指定平面的行数
    pub fn plane_height(&self, plane: usize, height: u32) -> Option<usize> {
        if plane >= self.plane_count() as usize {
            return None;
        }
        let h = height as usize;
        let (_, sub_v) = self.chroma_subsampling();
        Some(if plane == 0 { h } else { chroma_len(h, sub_v) })
    }

    /// 整帧字节数 (各平面紧密排列)
    pub fn frame_size(&self, width: u32, height: u32) -> Option<usize> {
        if *self == Self::None {
            return None;
        }
        let mut total = 0usize;
        for plane in 0..self.plane_count() as usize {
            let linesize = self.plane_linesize(plane, width)?;
            let rows = self.plane_height(plane, height)?;
            total = total.checked_add(linesize.checked_mul(rows)?)?;
        }
        Some(total)
    }
}

/// 子采样后的长度, 向上取整
fn chroma_len(len: usize, shift: u32) -> usize {
    (len + (1 << shift) - 1) >> shift
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Yuvj420p => "yuvj420p",
            Self::Yuvj422p => "yuvj422p",
            Self::Yuvj444p => "yuvj444p",
            Self::Nv12 => "nv12",
            Self::Nv21 => "nv21",
            Self::Rgb24 => "rgb24",
            Self::Bgr24 => "bgr24",
            Self::Rgba => "rgba",
            Self::Bgra => "bgra",
            Self::Argb => "argb",
            Self::Gray8 => "gray8",
            Self::Rgb48le => "rgb48le",
            Self::Rgba64le => "rgba64le",
            Self::Rgbaf16le => "rgbaf16le",
            Self::Rgbaf32le => "rgbaf32le",
        };
        write!(f, "{name}")
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fmt = match s.to_ascii_lowercase().as_str() {
            "yuv420p" => Self::Yuv420p,
            "yuv422p" => Self::Yuv422p,
            "yuv444p" => Self::Yuv444p,
            "yuvj420p" => Self::Yuvj420p,
            "yuvj422p" => Self::Yuvj422p,
            "yuvj444p" => Self::Yuvj444p,
            "nv12" => Self::Nv12,
            "nv21" => Self::Nv21,
            "rgb24" | "r8g8b8" => Self::Rgb24,
            "bgr24" => Self::Bgr24,
            "rgba" | "r8g8b8a8" => Self::Rgba,
            "bgra" => Self::Bgra,
            "argb" => Self::Argb,
            "gray8" | "gray" | "r8" => Self::Gray8,
            "rgb48le" | "r16g16b16" => Self::Rgb48le,
            "rgba64le" | "r16g16b16a16" => Self::Rgba64le,
            "rgbaf16le" | "r16g16b16a16_float" => Self::Rgbaf16le,
            "rgbaf32le" | "r32g32b32a32_float" => Self::Rgbaf32le,
            other => return Err(format!("未知像素格式: {other}")),
        };
        Ok(fmt)
    }
}
