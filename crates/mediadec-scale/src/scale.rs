//! RGBA8 中间图像缩放.
//!
//! 输入输出均为行紧密排列的 RGBA8 图像, 目标图像按行并行计算.

use rayon::prelude::*;

use crate::ScaleAlgorithm;

const BPP: usize = 4;

/// 缩放 RGBA8 图像
pub fn resize_rgba(
    src: &[u8],
    src_w: u32,
    src_h: u32,
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    algorithm: ScaleAlgorithm,
) {
    match algorithm {
        ScaleAlgorithm::NearestNeighbor => resize_nearest(src, src_w, src_h, dst, dst_w, dst_h),
        ScaleAlgorithm::Bilinear => resize_bilinear(src, src_w, src_h, dst, dst_w, dst_h),
    }
}

// ============================================================
// 最近邻
// ============================================================

fn resize_nearest(src: &[u8], src_w: u32, src_h: u32, dst: &mut [u8], dst_w: u32, dst_h: u32) {
    let src_stride = src_w as usize * BPP;
    let h_map: Vec<usize> = (0..dst_w as usize)
        .map(|dx| nearest_index(dx, dst_w, src_w))
        .collect();

    dst.par_chunks_mut(dst_w as usize * BPP)
        .enumerate()
        .for_each(|(dy, line)| {
            let sy = nearest_index(dy, dst_h, src_h);
            let src_row = &src[sy * src_stride..(sy + 1) * src_stride];
            for (px, &sx) in line.chunks_exact_mut(BPP).zip(&h_map) {
                px.copy_from_slice(&src_row[sx * BPP..(sx + 1) * BPP]);
            }
        });
}

/// 映射目标索引到源索引
#[inline]
fn nearest_index(dst_idx: usize, dst_size: u32, src_size: u32) -> usize {
    let idx = (dst_idx * src_size as usize) / dst_size as usize;
    idx.min(src_size as usize - 1)
}

// ============================================================
// 双线性插值
// ============================================================

/// 双线性插值缩放
///
/// 对于每个目标像素, 根据在源图像中的浮点坐标,
/// 用周围 4 个最近像素进行加权平均, 权重由距离决定.
///
/// ```text
/// (x0,y0)---t-----(x1,y0)
///    |              |
///    s    (x,y)     |
///    |              |
/// (x0,y1)---------(x1,y1)
/// ```
///
/// 权重使用精度 1/256 的定点数.
fn resize_bilinear(src: &[u8], src_w: u32, src_h: u32, dst: &mut [u8], dst_w: u32, dst_h: u32) {
    let src_stride = src_w as usize * BPP;
    // 预计算水平坐标映射表
    let h_map: Vec<(usize, usize, u32)> = (0..dst_w as usize)
        .map(|dx| map_coord(dx, dst_w, src_w))
        .collect();

    dst.par_chunks_mut(dst_w as usize * BPP)
        .enumerate()
        .for_each(|(dy, line)| {
            let (sy0, sy1, frac_y) = map_coord(dy, dst_h, src_h);
            let inv_y = 256 - frac_y;
            let row0 = &src[sy0 * src_stride..];
            let row1 = &src[sy1 * src_stride..];

            for (px, &(sx0, sx1, frac_x)) in line.chunks_exact_mut(BPP).zip(&h_map) {
                let inv_x = 256 - frac_x;
                // 权重和 = 65536
                let w00 = inv_x * inv_y;
                let w10 = frac_x * inv_y;
                let w01 = inv_x * frac_y;
                let w11 = frac_x * frac_y;

                for (c, out) in px.iter_mut().enumerate() {
                    let v = (u32::from(row0[sx0 * BPP + c]) * w00
                        + u32::from(row0[sx1 * BPP + c]) * w10
                        + u32::from(row1[sx0 * BPP + c]) * w01
                        + u32::from(row1[sx1 * BPP + c]) * w11
                        + 32768)
                        >> 16;
                    *out = v as u8;
                }
            }
        });
}

/// 将目标坐标映射到源坐标
///
/// 返回 `(idx0, idx1, frac)`, `frac` 为 0..256 的定点小数部分.
#[inline]
fn map_coord(dst_idx: usize, dst_size: u32, src_size: u32) -> (usize, usize, u32) {
    // 中心对齐: src_pos = (dst_idx + 0.5) * src_size / dst_size - 0.5
    let src_pos_256 =
        ((dst_idx as u64 * 2 + 1) * src_size as u64 * 128 / dst_size as u64).saturating_sub(128);

    let max_idx = (src_size as usize).saturating_sub(1);
    let idx0 = ((src_pos_256 >> 8) as usize).min(max_idx);
    let idx1 = (idx0 + 1).min(max_idx);
    let frac = (src_pos_256 & 0xFF) as u32;
    (idx0, idx1, frac)
}
