//! 像素格式读写.
//!
//! 所有源格式先读取为 RGBA8 中间图像 (每像素 4 字节, 行紧密排列),
//! 再由中间图像写入目标打包格式.
//!
//! YUV → RGB 使用 BT.601 系数, 有限范围 (16-235) 与全范围 (0-255) 分别处理,
//! JPEG 全范围格式 (yuvj*) 先映射为普通 YUV 格式加全范围标记.

use mediadec_core::{MediaError, MediaResult, PixelFormat};
use rayon::prelude::*;

// BT.601 亮度系数 (定点数, 精度 1/256)
const Y_R: i32 = 77; // 0.299 * 256
const Y_G: i32 = 150; // 0.587 * 256
const Y_B: i32 = 29; // 0.114 * 256

/// 是否可以作为转换源
pub fn is_supported_source(format: PixelFormat) -> bool {
    let (format, _) = format.normalize_range();
    matches!(
        format,
        PixelFormat::Yuv420p
            | PixelFormat::Yuv422p
            | PixelFormat::Yuv444p
            | PixelFormat::Nv12
            | PixelFormat::Nv21
            | PixelFormat::Rgb24
            | PixelFormat::Bgr24
            | PixelFormat::Rgba
            | PixelFormat::Bgra
            | PixelFormat::Argb
            | PixelFormat::Gray8
    )
}

/// 是否可以作为转换目标 (所有打包格式)
pub fn is_supported_target(format: PixelFormat) -> bool {
    format.bytes_per_pixel().is_some()
}

/// 检查源图像各平面的数据量是否足够
pub fn check_source(
    format: PixelFormat,
    width: u32,
    height: u32,
    planes: &[&[u8]],
    linesize: &[usize],
) -> MediaResult<()> {
    for plane in 0..format.plane_count() as usize {
        let (Some(row_bytes), Some(rows)) = (
            format.plane_linesize(plane, width),
            format.plane_height(plane, height),
        ) else {
            return Err(MediaError::Unsupported(format!(
                "无法计算 {format} 平面 {plane} 的布局"
            )));
        };
        let (Some(data), Some(&stride)) = (planes.get(plane), linesize.get(plane)) else {
            return Err(MediaError::InvalidArgument(format!(
                "{format} 缺少平面 {plane}"
            )));
        };
        if stride < row_bytes || data.len() < plane_len(stride, rows, row_bytes) {
            return Err(MediaError::InvalidArgument(format!(
                "平面 {plane} 数据不足: 行跨度 {stride}, 长度 {}",
                data.len()
            )));
        }
    }
    Ok(())
}

/// 检查目标缓冲区是否能容纳整幅图像
pub fn check_target(
    format: PixelFormat,
    width: u32,
    height: u32,
    dst: &[u8],
    linesize: usize,
) -> MediaResult<()> {
    let row_bytes = format
        .bytes_per_pixel()
        .map(|bpp| bpp as usize * width as usize)
        .ok_or_else(|| MediaError::Unsupported(format!("不支持的目标像素格式: {format}")))?;
    if linesize < row_bytes || dst.len() < plane_len(linesize, height as usize, row_bytes) {
        return Err(MediaError::InvalidArgument(format!(
            "目标缓冲区不足: 行跨度 {linesize}, 长度 {}",
            dst.len()
        )));
    }
    Ok(())
}

/// 最后一行不要求带行尾填充
fn plane_len(stride: usize, rows: usize, row_bytes: usize) -> usize {
    stride.saturating_mul(rows.saturating_sub(1)).saturating_add(row_bytes)
}

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// YUV (BT.601) → RGBA
#[inline]
fn yuv_to_rgba(y: u8, u: u8, v: u8, full_range: bool) -> [u8; 4] {
    let u = i32::from(u) - 128;
    let v = i32::from(v) - 128;
    let (r, g, b) = if full_range {
        let y = i32::from(y);
        (
            y + ((v * 359 + 128) >> 8),
            y - ((u * 88 + v * 183 + 128) >> 8),
            y + ((u * 454 + 128) >> 8),
        )
    } else {
        let c = (i32::from(y) - 16) * 298;
        (
            (c + 409 * v + 128) >> 8,
            (c - 100 * u - 208 * v + 128) >> 8,
            (c + 516 * u + 128) >> 8,
        )
    };
    [clamp_u8(r), clamp_u8(g), clamp_u8(b), 255]
}

/// 读取源图像到 RGBA8 中间图像
///
/// 调用前须通过 [`check_source`] 检查平面数据.
pub fn fetch_rgba(
    format: PixelFormat,
    width: u32,
    planes: &[&[u8]],
    linesize: &[usize],
    out: &mut [u8],
) -> MediaResult<()> {
    let w = width as usize;
    let (format, full_range) = format.normalize_range();

    match format {
        PixelFormat::Yuv420p | PixelFormat::Yuv422p | PixelFormat::Yuv444p => {
            let (sub_h, sub_v) = format.chroma_subsampling();
            let (y_plane, u_plane, v_plane) = (planes[0], planes[1], planes[2]);
            out.par_chunks_mut(w * 4).enumerate().for_each(|(row, line)| {
                let crow = row >> sub_v;
                let y_row = &y_plane[row * linesize[0]..];
                let u_row = &u_plane[crow * linesize[1]..];
                let v_row = &v_plane[crow * linesize[2]..];
                for (col, px) in line.chunks_exact_mut(4).enumerate() {
                    let c = col >> sub_h;
                    px.copy_from_slice(&yuv_to_rgba(y_row[col], u_row[c], v_row[c], full_range));
                }
            });
        }
        PixelFormat::Nv12 | PixelFormat::Nv21 => {
            // NV21 的色度平面为 VU 交错
            let (u_off, v_off) = if format == PixelFormat::Nv12 {
                (0, 1)
            } else {
                (1, 0)
            };
            let (y_plane, uv_plane) = (planes[0], planes[1]);
            out.par_chunks_mut(w * 4).enumerate().for_each(|(row, line)| {
                let y_row = &y_plane[row * linesize[0]..];
                let uv_row = &uv_plane[(row >> 1) * linesize[1]..];
                for (col, px) in line.chunks_exact_mut(4).enumerate() {
                    let c = (col >> 1) * 2;
                    px.copy_from_slice(&yuv_to_rgba(
                        y_row[col],
                        uv_row[c + u_off],
                        uv_row[c + v_off],
                        full_range,
                    ));
                }
            });
        }
        PixelFormat::Rgb24
        | PixelFormat::Bgr24
        | PixelFormat::Rgba
        | PixelFormat::Bgra
        | PixelFormat::Argb
        | PixelFormat::Gray8 => {
            let unpack: fn(&[u8]) -> [u8; 4] = match format {
                PixelFormat::Rgb24 => |p| [p[0], p[1], p[2], 255],
                PixelFormat::Bgr24 => |p| [p[2], p[1], p[0], 255],
                PixelFormat::Rgba => |p| [p[0], p[1], p[2], p[3]],
                PixelFormat::Bgra => |p| [p[2], p[1], p[0], p[3]],
                PixelFormat::Argb => |p| [p[1], p[2], p[3], p[0]],
                _ => |p| [p[0], p[0], p[0], 255],
            };
            let bpp = format.bytes_per_pixel().unwrap_or(1) as usize;
            let src = planes[0];
            out.par_chunks_mut(w * 4).enumerate().for_each(|(row, line)| {
                let src_row = &src[row * linesize[0]..];
                for (px, sp) in line.chunks_exact_mut(4).zip(src_row.chunks_exact(bpp)) {
                    px.copy_from_slice(&unpack(sp));
                }
            });
        }
        other => {
            return Err(MediaError::Unsupported(format!("不支持的源像素格式: {other}")));
        }
    }
    Ok(())
}

/// 把 RGBA8 中间图像写入目标打包格式
///
/// 目标每行只写 `width * bpp` 字节, 行尾填充保持不变.
pub fn store_rgba(
    rgba: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    dst: &mut [u8],
    dst_linesize: usize,
) -> MediaResult<()> {
    let w = width as usize;
    let bpp = format
        .bytes_per_pixel()
        .ok_or_else(|| MediaError::Unsupported(format!("不支持的目标像素格式: {format}")))?
        as usize;

    let pack: fn(&[u8], &mut [u8]) = match format {
        PixelFormat::Gray8 => |p, o| o[0] = luma(p),
        PixelFormat::Rgb24 => |p, o| o.copy_from_slice(&p[..3]),
        PixelFormat::Bgr24 => |p, o| o.copy_from_slice(&[p[2], p[1], p[0]]),
        PixelFormat::Rgba => |p, o| o.copy_from_slice(p),
        PixelFormat::Bgra => |p, o| o.copy_from_slice(&[p[2], p[1], p[0], p[3]]),
        PixelFormat::Argb => |p, o| o.copy_from_slice(&[p[3], p[0], p[1], p[2]]),
        // 8 位扩展到 16 位: v * 257, 使 255 映射为 65535
        PixelFormat::Rgb48le | PixelFormat::Rgba64le => |p, o| {
            for (c, out) in o.chunks_exact_mut(2).enumerate() {
                out.copy_from_slice(&(u16::from(p[c]) * 257).to_le_bytes());
            }
        },
        PixelFormat::Rgbaf16le => |p, o| {
            for (c, out) in o.chunks_exact_mut(2).enumerate() {
                out.copy_from_slice(&f32_to_f16_bits(f32::from(p[c]) / 255.0).to_le_bytes());
            }
        },
        PixelFormat::Rgbaf32le => |p, o| {
            for (c, out) in o.chunks_exact_mut(4).enumerate() {
                out.copy_from_slice(&(f32::from(p[c]) / 255.0).to_le_bytes());
            }
        },
        other => {
            return Err(MediaError::Unsupported(format!("不支持的目标像素格式: {other}")));
        }
    };

    dst.par_chunks_mut(dst_linesize)
        .take(height as usize)
        .enumerate()
        .for_each(|(row, line)| {
            let src_row = &rgba[row * w * 4..(row + 1) * w * 4];
            for (p, o) in src_row.chunks_exact(4).zip(line[..w * bpp].chunks_exact_mut(bpp)) {
                pack(p, o);
            }
        });
    Ok(())
}

/// RGB → 灰度 (BT.601 亮度)
#[inline]
fn luma(p: &[u8]) -> u8 {
    let (r, g, b) = (i32::from(p[0]), i32::from(p[1]), i32::from(p[2]));
    clamp_u8((Y_R * r + Y_G * g + Y_B * b + 128) >> 8)
}

/// f32 → IEEE 754 半精度位模式 (就近舍入)
pub fn f32_to_f16_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xFF) as i32;
    let mant = bits & 0x7F_FFFF;

    if exp == 0xFF {
        // Inf / NaN
        let nan = if mant != 0 { 0x200 } else { 0 };
        return sign | 0x7C00 | nan;
    }
    let half_exp = exp - 127 + 15;
    if half_exp >= 0x1F {
        return sign | 0x7C00;
    }
    if half_exp <= 0 {
        // 非规格化数或下溢为 0
        if half_exp < -10 {
            return sign;
        }
        let full = mant | 0x80_0000;
        let shift = (14 - half_exp) as u32;
        let rounded = (full + (1 << (shift - 1))) >> shift;
        return sign | rounded as u16;
    }
    // 尾数舍入进位会自然进入指数位
    sign | (((half_exp as u32) << 10) + ((mant + 0x1000) >> 13)) as u16
}
