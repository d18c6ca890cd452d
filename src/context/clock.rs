//! 播放时钟: 把宿主的墙上时间映射到媒体时间, 到达末尾时从头循环.

use log::info;
use mediadec_core::{MediaError, MediaResult};

use super::{DecoderContext, FrameStatus};

/// 播放时钟状态
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PlaybackClock {
    pub started: bool,
    /// 本轮播放开始时的墙上时间
    pub start_time: f64,
    /// 上一次成功推进时的媒体时间
    pub last_time: f64,
    pub loop_count: u32,
}

/// `play` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStatus {
    /// 取到了新的一帧
    Advanced { stream_index: usize },
    /// 当前帧仍然有效
    Unchanged,
    /// 到达末尾, 已回到开头
    Looped,
}

impl DecoderContext {
    /// 按墙上时间 `time` (秒) 推进播放
    ///
    /// 第一次调用记录起始时间. 之后当前位置不超过已播放时长时拉取一帧;
    /// 流结束则定位到 0 并开始新一轮.
    pub fn play(&mut self, time: f64) -> MediaResult<PlayStatus> {
        if !time.is_finite() {
            return Err(MediaError::InvalidArgument(format!("无效的播放时间: {time}")));
        }
        if !self.clock.started {
            self.clock = PlaybackClock {
                started: true,
                start_time: time,
                last_time: time,
                loop_count: 0,
            };
        }

        let elapsed = time - self.clock.start_time;
        if self.position > elapsed {
            self.clock.last_time = elapsed;
            return Ok(PlayStatus::Unchanged);
        }

        match self.next_frame()? {
            FrameStatus::Ready { stream_index, .. } => {
                self.clock.last_time = elapsed;
                Ok(PlayStatus::Advanced { stream_index })
            }
            FrameStatus::EndOfStream => {
                self.seek(0.0)?;
                self.clock.start_time += elapsed;
                self.clock.last_time = 0.0;
                self.clock.loop_count += 1;
                info!("播放到达末尾, 开始第 {} 次循环", self.clock.loop_count);
                Ok(PlayStatus::Looped)
            }
        }
    }

    /// 已循环的次数
    pub fn loop_count(&self) -> u32 {
        self.clock.loop_count
    }

    /// 上一次 `play` 成功时的媒体时间
    pub fn last_play_time(&self) -> f64 {
        self.clock.last_time
    }

    /// `play` 是否已经开始
    pub fn is_playing(&self) -> bool {
        self.clock.started
    }
}
