//! 声道混合矩阵.
//!
//! 声道顺序 (交错格式):
//! - 5.1: L, R, C, LFE, Ls, Rs
//! - 7.1: L, R, C, LFE, Ls, Rs, Lsr, Rsr
//!
//! 支持的转换:
//! - 单声道 → 多声道: 复制到所有声道
//! - 多声道 → 单声道: 所有声道取平均
//! - 5.1 / 7.1 → 立体声: 中置与环绕按系数叠加到左右声道
//! - 立体声 → 5.1: 生成中置, LFE 与环绕声道
//! - 其余 N → M: 对应声道直接映射, 多余声道填静音

use mediadec_core::ChannelLayout;

/// 5.1 下混到立体声的 C/Ls/Rs 系数 (1/sqrt(2))
const DOWNMIX_COEF: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// 7.1 后环绕声道下混系数
const DOWNMIX_BACK_COEF: f64 = 0.5;

/// 立体声上混到 5.1 的 LFE 衰减
const UPMIX_LFE_COEF: f64 = 0.1;

/// 立体声上混到 5.1 的环绕声道系数
const UPMIX_SURROUND_COEF: f64 = 0.5;

/// 混合矩阵, `coef[dst * src_channels + src]`
#[derive(Debug, Clone, PartialEq)]
pub struct MixMatrix {
    src_channels: usize,
    dst_channels: usize,
    coef: Vec<f64>,
}

impl MixMatrix {
    /// 根据源/目标布局生成矩阵
    pub fn new(src: ChannelLayout, dst: ChannelLayout) -> Self {
        let src_channels = src.channels as usize;
        let dst_channels = dst.channels as usize;
        let mut m = Self {
            src_channels,
            dst_channels,
            coef: vec![0.0; src_channels * dst_channels],
        };

        if src_channels == 1 {
            for d in 0..dst_channels {
                m.set(d, 0, 1.0);
            }
        } else if dst_channels == 1 {
            let avg = 1.0 / src_channels as f64;
            for s in 0..src_channels {
                m.set(0, s, avg);
            }
        } else if dst == ChannelLayout::STEREO
            && (src == ChannelLayout::SURROUND_5_1 || src == ChannelLayout::SURROUND_7_1)
        {
            // L' = L + 0.707*C + 0.707*Ls (+ 0.5*Lsr)
            for (out, front, side) in [(0, 0, 4), (1, 1, 5)] {
                m.set(out, front, 1.0);
                m.set(out, 2, DOWNMIX_COEF);
                m.set(out, side, DOWNMIX_COEF);
                if src == ChannelLayout::SURROUND_7_1 {
                    m.set(out, side + 2, DOWNMIX_BACK_COEF);
                }
            }
        } else if src == ChannelLayout::STEREO && dst == ChannelLayout::SURROUND_5_1 {
            m.set(0, 0, 1.0);
            m.set(1, 1, 1.0);
            for s in 0..2 {
                m.set(2, s, 0.5);
                m.set(3, s, 0.5 * UPMIX_LFE_COEF);
            }
            m.set(4, 0, UPMIX_SURROUND_COEF);
            m.set(5, 1, UPMIX_SURROUND_COEF);
        } else {
            for c in 0..src_channels.min(dst_channels) {
                m.set(c, c, 1.0);
            }
        }
        m
    }

    fn set(&mut self, dst: usize, src: usize, value: f64) {
        self.coef[dst * self.src_channels + src] = value;
    }

    /// 是否为恒等映射
    pub fn is_identity(&self) -> bool {
        self.src_channels == self.dst_channels
            && (0..self.dst_channels).all(|d| {
                (0..self.src_channels).all(|s| {
                    let expected = if d == s { 1.0 } else { 0.0 };
                    self.coef[d * self.src_channels + s] == expected
                })
            })
    }

    /// 对交错样本做混合, 输出同样为交错格式
    pub fn apply(&self, input: &[f64], out: &mut Vec<f64>) {
        out.clear();
        for frame in input.chunks_exact(self.src_channels) {
            for row in self.coef.chunks_exact(self.src_channels) {
                out.push(row.iter().zip(frame).map(|(c, s)| c * s).sum());
            }
        }
    }
}
