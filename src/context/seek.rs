//! 定位与重新同步.

use log::debug;
use mediadec_core::{MediaError, MediaResult, Timestamp};
use mediadec_format::SeekFlags;

use super::{DecoderContext, FrameStatus};

impl DecoderContext {
    /// 定位到 `time` 秒
    ///
    /// 由第一路选中的流 (视频, 音频, 字幕的顺序) 驱动容器定位到目标之前
    /// 最近的位置, 刷新解码器后再拉取 `resync_frames` 帧完成同步.
    /// 成功后 `position` 恰好等于 `time`; 失败时 `position`, 时长与图片判定都不变.
    pub fn seek(&mut self, time: f64) -> MediaResult<()> {
        if !time.is_finite() || time < 0.0 {
            return Err(MediaError::InvalidArgument(format!("无效的定位时间: {time}")));
        }
        let stream_index = self
            .selection
            .first_selected()
            .ok_or_else(|| MediaError::InvalidState("没有选中的流, 无法定位".into()))?;
        let time_base = self.stream(stream_index)?.time_base;
        let target = Timestamp::from_seconds(time, time_base);
        if !target.is_valid() {
            return Err(MediaError::Seek(format!(
                "流 #{stream_index} 的时间基无效: {time_base}"
            )));
        }

        debug!("定位到 {time:.3}s (流 #{stream_index}, 时间戳 {})", target.pts);
        self.input
            .seek(stream_index, target.pts, SeekFlags::default())?;
        self.reset_decoding();

        // 同步拉帧遇到流结束时会修正时长并可能确认为图片, 失败时一并撤销
        let saved = (self.position, self.duration, self.image);
        for pulled in 0..self.resync_frames {
            let result = match self.next_frame() {
                Ok(FrameStatus::Ready { .. }) => continue,
                Ok(FrameStatus::EndOfStream) => Err(MediaError::Seek(format!(
                    "定位到 {time:.3}s 后只取到 {pulled} 帧, 流已结束"
                ))),
                Err(e) => Err(e),
            };
            (self.position, self.duration, self.image) = saved;
            return result;
        }

        self.position = time;
        Ok(())
    }

    /// 容器定位后丢弃解码器与路由器中的残留数据
    fn reset_decoding(&mut self) {
        let slots = [self.video_decoder.as_mut(), self.audio_decoder.as_mut()];
        for slot in slots.into_iter().flatten() {
            slot.reset();
        }
        self.router.reset();
        self.current = None;
    }
}
