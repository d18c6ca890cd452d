//! 帧路由: 读包, 送入对应解码器, 取出一帧并记录其类型.
//!
//! 每次 [`DecoderContext::next_frame`] 先取解码器中已有的输出,
//! 没有输出时再从容器读包. 容器读完后给每个解码器送一次空包刷新,
//! 全部取空才报告流结束.

use log::{debug, info, trace};
use mediadec_codec::{Decoder, Frame, Packet};
use mediadec_core::{MediaError, MediaResult, MediaType, Rational, Timestamp};
use mediadec_format::Stream;

use super::{DecoderContext, ImageState};
use crate::engine::MediaEngine;

/// `next_frame` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// 取到一帧, 可以调用 `decode_frame`
    Ready {
        stream_index: usize,
        media_type: MediaType,
    },
    /// 流已结束
    EndOfStream,
}

impl FrameStatus {
    /// C 接口状态码: 0 取到帧, 1 流结束
    pub fn status_code(&self) -> i32 {
        match self {
            Self::Ready { .. } => 0,
            Self::EndOfStream => MediaError::STATUS_EOF,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// 一路已打开的解码器
pub(crate) struct DecoderSlot {
    pub stream_index: usize,
    pub time_base: Rational,
    decoder: Box<dyn Decoder>,
    /// 已收到刷新包
    flush_sent: bool,
    /// 输入结束且已取空
    finished: bool,
}

impl DecoderSlot {
    pub fn open(engine: &dyn MediaEngine, stream: &Stream) -> MediaResult<Self> {
        Ok(Self {
            stream_index: stream.index,
            time_base: stream.time_base,
            decoder: engine.open_decoder(stream)?,
            flush_sent: false,
            finished: false,
        })
    }

    /// 送刷新包, 解码器暂时拒收时返回 `false`
    fn send_flush(&mut self) -> MediaResult<bool> {
        match self.decoder.send_packet(&Packet::empty()) {
            Ok(()) | Err(MediaError::Eof) => {
                self.flush_sent = true;
                Ok(true)
            }
            Err(MediaError::NeedMoreData) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// 丢弃解码器内部状态, 重新开始接收数据包
    pub fn reset(&mut self) {
        self.decoder.flush();
        self.flush_sent = false;
        self.finished = false;
    }
}

/// 路由器的读包状态
#[derive(Default)]
pub(crate) struct RouterState {
    /// 解码器暂时拒收的数据包
    pub pending_packet: Option<Packet>,
    /// 容器已读完
    pub input_finished: bool,
}

impl RouterState {
    pub fn reset(&mut self) {
        self.pending_packet = None;
        self.input_finished = false;
    }
}

/// 最近一次取到的帧
pub(crate) struct CurrentFrame {
    pub stream_index: usize,
    pub frame: Frame,
}

impl DecoderContext {
    /// 拉取下一帧
    ///
    /// 返回 `Ready` 时帧已保存在上下文中, 由 [`decode_frame`](Self::decode_frame)
    /// 转换到输出缓冲区. 已确认为图片时直接返回 `EndOfStream`, 不再读取输入.
    pub fn next_frame(&mut self) -> MediaResult<FrameStatus> {
        if self.image == ImageState::Confirmed {
            return Ok(FrameStatus::EndOfStream);
        }

        loop {
            if let Some(status) = self.poll_decoders()? {
                return Ok(status);
            }
            if self.router.input_finished {
                if self.decoders_finished() {
                    return Ok(self.finish_stream());
                }
                continue;
            }
            self.feed_packet()?;
        }
    }

    /// 依次尝试从视频和音频解码器取一帧
    fn poll_decoders(&mut self) -> MediaResult<Option<FrameStatus>> {
        let input_finished = self.router.input_finished;
        let mut decoded = None;

        let slots = [self.video_decoder.as_mut(), self.audio_decoder.as_mut()];
        for slot in slots.into_iter().flatten() {
            if slot.finished {
                continue;
            }
            match slot.decoder.receive_frame() {
                Ok(frame) => {
                    decoded = Some((slot.stream_index, slot.time_base, frame));
                    break;
                }
                Err(MediaError::NeedMoreData | MediaError::Eof) if input_finished => {
                    if slot.flush_sent {
                        slot.finished = true;
                    } else if !slot.send_flush()? {
                        return Err(MediaError::Codec(format!(
                            "流 #{} 的解码器既不接收刷新包也不输出帧",
                            slot.stream_index
                        )));
                    }
                }
                Err(MediaError::NeedMoreData | MediaError::Eof) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(decoded.map(|(stream_index, time_base, frame)| {
            self.accept_frame(stream_index, time_base, frame)
        }))
    }

    /// 读一个数据包并送入所属解码器
    fn feed_packet(&mut self) -> MediaResult<()> {
        let (packet, retried) = match self.router.pending_packet.take() {
            Some(packet) => (packet, true),
            None => match self.input.read_packet() {
                Ok(packet) => (packet, false),
                Err(MediaError::Eof) => return self.drain_decoders(),
                Err(e) => return Err(e),
            },
        };

        let index = packet.stream_index;
        let slot = self
            .video_decoder
            .as_mut()
            .filter(|s| s.stream_index == index)
            .or(self.audio_decoder.as_mut().filter(|s| s.stream_index == index));
        let Some(slot) = slot else {
            trace!("丢弃未选中流 #{index} 的数据包");
            return Ok(());
        };

        match slot.decoder.send_packet(&packet) {
            Ok(()) | Err(MediaError::Eof) => Ok(()),
            Err(MediaError::NeedMoreData) if !retried => {
                self.router.pending_packet = Some(packet);
                Ok(())
            }
            Err(MediaError::NeedMoreData) => Err(MediaError::Codec(format!(
                "流 #{index} 的解码器既不接收数据包也不输出帧"
            ))),
            Err(e) => Err(e),
        }
    }

    /// 容器读完: 给每个解码器送刷新包
    ///
    /// 暂时拒收的解码器先取出已有的帧, 由 `poll_decoders` 重新送刷新包.
    fn drain_decoders(&mut self) -> MediaResult<()> {
        debug!("输入结束, 刷新解码器");
        self.router.input_finished = true;
        let slots = [self.video_decoder.as_mut(), self.audio_decoder.as_mut()];
        for slot in slots.into_iter().flatten() {
            if !slot.send_flush()? {
                debug!("流 #{} 的解码器暂未接收刷新包", slot.stream_index);
            }
        }
        Ok(())
    }

    fn decoders_finished(&self) -> bool {
        [self.video_decoder.as_ref(), self.audio_decoder.as_ref()]
            .into_iter()
            .flatten()
            .all(|slot| slot.finished)
    }

    fn accept_frame(&mut self, stream_index: usize, time_base: Rational, frame: Frame) -> FrameStatus {
        match &frame {
            Frame::Video(v) => {
                self.video.original_width = v.width;
                self.video.original_height = v.height;
            }
            Frame::Audio(a) => {
                self.audio.original_sample_rate = if a.sample_rate > 0 {
                    a.sample_rate
                } else {
                    self.fallback_sample_rate
                };
            }
        }

        let time_base = if time_base.is_valid() {
            time_base
        } else {
            frame.time_base()
        };
        let ts = Timestamp::new(frame.pts(), time_base);
        if ts.is_valid() {
            self.position = ts.to_seconds();
        }

        let media_type = frame.media_type();
        trace!("流 #{stream_index} 输出 {media_type} 帧, 位置 {ts}");
        self.current = Some(CurrentFrame {
            stream_index,
            frame,
        });
        FrameStatus::Ready {
            stream_index,
            media_type,
        }
    }

    fn finish_stream(&mut self) -> FrameStatus {
        self.duration = self.position;
        if self.duration == 0.0 && self.image != ImageState::Confirmed {
            info!("只有一帧且没有时长, 按图片处理");
            self.image = ImageState::Confirmed;
        }
        FrameStatus::EndOfStream
    }
}
