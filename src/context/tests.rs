use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mediadec_codec::{AudioFrame, CodecId, Decoder, Frame, Packet, VideoFrame};
use mediadec_core::{ChannelLayout, MediaError, MediaResult, MediaType, PixelFormat, Rational, SampleFormat};
use mediadec_format::{
    AudioStreamParams, InputFormat, SeekFlags, Stream, StreamParams, VideoStreamParams,
};
use mediadec_resample::{ResamplePlan, ResampleParams, Resampler, SoftwareResampler};
use mediadec_scale::{ScalePlan, ScaleParams, Scaler, SoftwareScaler};

use super::*;
use crate::engine::MediaEngine;
use crate::options::DecoderOptions;

const VIDEO_TB: Rational = Rational::new(1, 25);
const AUDIO_TB: Rational = Rational::new(1, 8000);

#[derive(Clone, Default)]
struct Counters {
    reads: Arc<AtomicUsize>,
    seeks: Arc<AtomicUsize>,
    plans_dropped: Arc<AtomicUsize>,
    decoders_dropped: Arc<AtomicUsize>,
    inputs_dropped: Arc<AtomicUsize>,
}

impl Counters {
    fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Busy {
    Never,
    Alternate,
    Always,
}

/// 按脚本输出数据包与帧的引擎
#[derive(Clone)]
struct ScriptedEngine {
    streams: Vec<Stream>,
    packets: Vec<Packet>,
    duration: Option<f64>,
    /// 音频帧报告的采样率
    audio_rate: u32,
    frames_per_packet: usize,
    /// 解码器延迟输出的帧数
    delay: usize,
    busy: Busy,
    fail_open: bool,
    fail_seek: bool,
    counters: Counters,
}

impl ScriptedEngine {
    fn new(streams: Vec<Stream>, packets: Vec<Packet>) -> Self {
        Self {
            streams,
            packets,
            duration: None,
            audio_rate: 8000,
            frames_per_packet: 1,
            delay: 0,
            busy: Busy::Never,
            fail_open: false,
            fail_seek: false,
            counters: Counters::default(),
        }
    }

    fn open(&self) -> DecoderContext {
        self.open_with(DecoderOptions::default())
    }

    fn open_with(&self, options: DecoderOptions) -> DecoderContext {
        DecoderContext::open_with("scripted://clip", Box::new(self.clone()), options).unwrap()
    }
}

impl MediaEngine for ScriptedEngine {
    fn open_input(&self, _url: &str) -> MediaResult<Box<dyn InputFormat>> {
        if self.fail_open {
            return Err(MediaError::FormatNotFound("scripted".into()));
        }
        Ok(Box::new(ScriptedInput {
            streams: self.streams.clone(),
            packets: self.packets.clone(),
            duration: self.duration,
            cursor: 0,
            fail_seek: self.fail_seek,
            counters: self.counters.clone(),
        }))
    }

    fn open_decoder(&self, stream: &Stream) -> MediaResult<Box<dyn Decoder>> {
        Ok(Box::new(ScriptedDecoder {
            media_type: stream.media_type,
            audio_rate: self.audio_rate,
            frames_per_packet: self.frames_per_packet,
            delay: self.delay,
            busy: self.busy,
            refuse_next: true,
            queue: VecDeque::new(),
            flushing: false,
            dropped: self.counters.decoders_dropped.clone(),
        }))
    }

    fn create_scaler(&self) -> Box<dyn Scaler> {
        Box::new(CountingScaler(self.counters.plans_dropped.clone()))
    }

    fn create_resampler(&self) -> Box<dyn Resampler> {
        Box::new(CountingResampler(self.counters.plans_dropped.clone()))
    }
}

struct ScriptedInput {
    streams: Vec<Stream>,
    packets: Vec<Packet>,
    duration: Option<f64>,
    cursor: usize,
    fail_seek: bool,
    counters: Counters,
}

impl InputFormat for ScriptedInput {
    fn format_name(&self) -> &str {
        "scripted"
    }

    fn streams(&self) -> &[Stream] {
        &self.streams
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn read_packet(&mut self) -> MediaResult<Packet> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        let packet = self.packets.get(self.cursor).cloned().ok_or(MediaError::Eof)?;
        self.cursor += 1;
        Ok(packet)
    }

    fn seek(&mut self, stream_index: usize, timestamp: i64, _flags: SeekFlags) -> MediaResult<()> {
        self.counters.seeks.fetch_add(1, Ordering::SeqCst);
        if self.fail_seek {
            return Err(MediaError::Seek("脚本要求定位失败".into()));
        }
        self.cursor = self
            .packets
            .iter()
            .rposition(|p| p.stream_index == stream_index && p.pts <= timestamp)
            .unwrap_or(0);
        Ok(())
    }
}

impl Drop for ScriptedInput {
    fn drop(&mut self) {
        self.counters.inputs_dropped.fetch_add(1, Ordering::SeqCst);
    }
}

/// 视频包的每个字节是一个灰度像素 (高度 1), 音频包是 s16 单声道采样
struct ScriptedDecoder {
    media_type: MediaType,
    audio_rate: u32,
    frames_per_packet: usize,
    delay: usize,
    busy: Busy,
    refuse_next: bool,
    queue: VecDeque<Frame>,
    flushing: bool,
    dropped: Arc<AtomicUsize>,
}

impl ScriptedDecoder {
    fn make_frame(&self, packet: &Packet, pts: i64) -> Frame {
        match self.media_type {
            MediaType::Video => {
                let width = packet.data.len() as u32;
                let mut frame = VideoFrame::new(width, 1, PixelFormat::Gray8);
                frame.data[0] = packet.data.to_vec();
                frame.linesize[0] = width as usize;
                frame.pts = pts;
                frame.time_base = packet.time_base;
                Frame::Video(frame)
            }
            _ => {
                let nb_samples = (packet.data.len() / 2) as u32;
                let mut frame = AudioFrame::new(
                    nb_samples,
                    self.audio_rate,
                    SampleFormat::S16,
                    ChannelLayout::MONO,
                );
                frame.data[0] = packet.data.to_vec();
                frame.pts = pts;
                frame.time_base = packet.time_base;
                Frame::Audio(frame)
            }
        }
    }
}

impl Decoder for ScriptedDecoder {
    fn codec_id(&self) -> CodecId {
        CodecId::None
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn send_packet(&mut self, packet: &Packet) -> MediaResult<()> {
        match self.busy {
            Busy::Always => return Err(MediaError::NeedMoreData),
            Busy::Alternate => {
                self.refuse_next = !self.refuse_next;
                if !self.refuse_next {
                    return Err(MediaError::NeedMoreData);
                }
            }
            Busy::Never => {}
        }
        if packet.is_empty() {
            self.flushing = true;
            return Ok(());
        }
        for k in 0..self.frames_per_packet {
            let frame = self.make_frame(packet, packet.pts + k as i64);
            self.queue.push_back(frame);
        }
        Ok(())
    }

    fn receive_frame(&mut self) -> MediaResult<Frame> {
        if self.queue.len() > self.delay || (self.flushing && !self.queue.is_empty()) {
            return self.queue.pop_front().ok_or(MediaError::NeedMoreData);
        }
        if self.flushing {
            Err(MediaError::Eof)
        } else {
            Err(MediaError::NeedMoreData)
        }
    }

    fn flush(&mut self) {
        self.queue.clear();
        self.flushing = false;
    }
}

impl Drop for ScriptedDecoder {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

struct CountingScaler(Arc<AtomicUsize>);

struct CountingScalePlan {
    inner: Box<dyn ScalePlan>,
    dropped: Arc<AtomicUsize>,
}

impl Scaler for CountingScaler {
    fn name(&self) -> &str {
        "counting"
    }

    fn build(&self, params: &ScaleParams) -> MediaResult<Box<dyn ScalePlan>> {
        Ok(Box::new(CountingScalePlan {
            inner: SoftwareScaler.build(params)?,
            dropped: self.0.clone(),
        }))
    }
}

impl ScalePlan for CountingScalePlan {
    fn params(&self) -> &ScaleParams {
        self.inner.params()
    }

    fn scale(
        &mut self,
        src_data: &[&[u8]],
        src_linesize: &[usize],
        dst: &mut [u8],
        dst_linesize: usize,
    ) -> MediaResult<()> {
        self.inner.scale(src_data, src_linesize, dst, dst_linesize)
    }
}

impl Drop for CountingScalePlan {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

struct CountingResampler(Arc<AtomicUsize>);

struct CountingResamplePlan {
    inner: Box<dyn ResamplePlan>,
    dropped: Arc<AtomicUsize>,
}

impl Resampler for CountingResampler {
    fn name(&self) -> &str {
        "counting"
    }

    fn build(&self, params: &ResampleParams) -> MediaResult<Box<dyn ResamplePlan>> {
        Ok(Box::new(CountingResamplePlan {
            inner: SoftwareResampler.build(params)?,
            dropped: self.0.clone(),
        }))
    }
}

impl ResamplePlan for CountingResamplePlan {
    fn params(&self) -> &ResampleParams {
        self.inner.params()
    }

    fn max_output_samples(&self, nb_samples: u32) -> u32 {
        self.inner.max_output_samples(nb_samples)
    }

    fn convert(
        &mut self,
        input: &[&[u8]],
        nb_samples: u32,
        output: &mut [u8],
        out_capacity: u32,
    ) -> MediaResult<u32> {
        self.inner.convert(input, nb_samples, output, out_capacity)
    }
}

impl Drop for CountingResamplePlan {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

fn video_stream(index: usize, duration: i64) -> Stream {
    Stream {
        index,
        media_type: MediaType::Video,
        codec_id: CodecId::RawVideo,
        time_base: VIDEO_TB,
        duration,
        start_time: 0,
        nb_frames: 0,
        params: StreamParams::Video(VideoStreamParams {
            width: 4,
            height: 1,
            pixel_format: PixelFormat::Gray8,
            frame_rate: Rational::new(25, 1),
        }),
    }
}

fn audio_stream(index: usize, duration: i64, sample_rate: u32) -> Stream {
    Stream {
        index,
        media_type: MediaType::Audio,
        codec_id: CodecId::PcmS16le,
        time_base: AUDIO_TB,
        duration,
        start_time: 0,
        nb_frames: 0,
        params: StreamParams::Audio(AudioStreamParams {
            sample_rate,
            channel_layout: if sample_rate > 0 {
                ChannelLayout::MONO
            } else {
                ChannelLayout::UNKNOWN
            },
            sample_format: SampleFormat::S16,
            bit_rate: 0,
        }),
    }
}

fn other_stream(index: usize, media_type: MediaType) -> Stream {
    Stream {
        index,
        media_type,
        codec_id: CodecId::None,
        time_base: VIDEO_TB,
        duration: -1,
        start_time: 0,
        nb_frames: 0,
        params: StreamParams::Other,
    }
}

fn video_packet(stream_index: usize, pts: i64, width: usize, value: u8) -> Packet {
    let mut packet = Packet::from_data(vec![value; width]);
    packet.stream_index = stream_index;
    packet.pts = pts;
    packet.dts = pts;
    packet.time_base = VIDEO_TB;
    packet
}

fn audio_packet(stream_index: usize, pts: i64, nb_samples: usize) -> Packet {
    let mut packet = Packet::from_data(vec![0u8; nb_samples * 2]);
    packet.stream_index = stream_index;
    packet.pts = pts;
    packet.dts = pts;
    packet.time_base = AUDIO_TB;
    packet
}

/// `count` 帧 4x1 视频, pts 0..count
fn video_clip(count: i64) -> ScriptedEngine {
    let packets = (0..count).map(|pts| video_packet(0, pts, 4, pts as u8)).collect();
    ScriptedEngine::new(vec![video_stream(0, count)], packets)
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

fn ready(stream_index: usize, media_type: MediaType) -> FrameStatus {
    FrameStatus::Ready {
        stream_index,
        media_type,
    }
}

#[test]
fn test_open_selects_streams_and_duration() {
    let mut engine = ScriptedEngine::new(
        vec![
            other_stream(0, MediaType::Data),
            video_stream(1, 10),
            audio_stream(2, 8000, 8000),
            other_stream(3, MediaType::Subtitle),
        ],
        Vec::new(),
    );
    engine.duration = Some(0.5);
    let ctx = engine.open();

    let info = ctx.playback_info();
    assert_eq!(info.stream_count, 4);
    assert_eq!(
        info.selection,
        StreamSelection {
            video: Some(1),
            audio: Some(2),
            subtitle: Some(3),
        }
    );
    assert_eq!(info.duration, 1.0);
    assert_eq!(info.position, 0.0);
    assert!(!ctx.is_image());

    let video = ctx.video_info();
    assert_eq!((video.original_width, video.original_height), (4, 1));
    assert_eq!(video.pixel_format, PixelFormat::Rgba);
    assert_eq!(video.bytes_per_frame, 16);
    assert!(ctx.video_buffer().is_none());

    let audio = ctx.audio_info();
    assert_eq!(audio.original_sample_rate, 8000);
    assert_eq!(audio.channel_count, 1);
    assert_eq!(audio.sample_format, SampleFormat::F32);
    assert_eq!(audio.bytes_per_sample, 4);
}

#[test]
fn test_open_failure_returns_no_context() {
    let mut engine = video_clip(1);
    engine.fail_open = true;
    let result =
        DecoderContext::open_with("missing", Box::new(engine), DecoderOptions::default());
    assert!(matches!(result, Err(MediaError::FormatNotFound(_))));
}

#[test]
fn test_open_rejects_invalid_options() {
    let mut options = DecoderOptions::default();
    options.audio.sample_format = SampleFormat::F32p;
    let result = DecoderContext::open_with("x", Box::new(video_clip(1)), options);
    assert!(matches!(result, Err(MediaError::Unsupported(_))));
}

#[test]
fn test_single_frame_becomes_image() {
    let engine = ScriptedEngine::new(vec![video_stream(0, -1)], vec![video_packet(0, 0, 4, 7)]);
    let mut ctx = engine.open();
    assert_eq!(ctx.image_state(), ImageState::Provisional);
    assert!(ctx.is_image());

    assert_eq!(ctx.next_frame().unwrap(), ready(0, MediaType::Video));
    ctx.decode_frame().unwrap();
    assert_eq!(&ctx.video_buffer().unwrap()[..4], &[7, 7, 7, 255]);

    assert_eq!(ctx.next_frame().unwrap(), FrameStatus::EndOfStream);
    assert_eq!(ctx.image_state(), ImageState::Confirmed);
    assert_eq!(ctx.duration(), 0.0);

    let reads = Counters::get(&engine.counters.reads);
    for _ in 0..3 {
        assert_eq!(ctx.next_frame().unwrap().status_code(), 1);
    }
    assert_eq!(Counters::get(&engine.counters.reads), reads);
    // 最后一帧仍可重复转换
    ctx.decode_frame().unwrap();
}

#[test]
fn test_known_duration_is_not_image() {
    let engine = video_clip(3);
    let ctx = engine.open();
    assert_eq!(ctx.image_state(), ImageState::NotImage);
}

#[test]
fn test_next_frame_routes_and_discards_unselected() {
    let engine = ScriptedEngine::new(
        vec![
            video_stream(0, 2),
            audio_stream(1, 800, 8000),
            audio_stream(2, 800, 8000),
        ],
        vec![
            audio_packet(2, 0, 10),
            video_packet(0, 0, 4, 1),
            audio_packet(2, 10, 10),
            audio_packet(1, 400, 10),
            video_packet(0, 1, 4, 2),
        ],
    );
    let mut ctx = engine.open();
    assert_eq!(ctx.next_frame().unwrap(), ready(0, MediaType::Video));
    assert_eq!(ctx.next_frame().unwrap(), ready(1, MediaType::Audio));
    assert_close(ctx.position(), 0.05);
    assert_eq!(ctx.current_frame(), Some((1, MediaType::Audio)));
    assert_eq!(ctx.next_frame().unwrap(), ready(0, MediaType::Video));
    assert_eq!(ctx.position(), 0.04);
    assert_eq!(ctx.next_frame().unwrap(), FrameStatus::EndOfStream);
    assert_eq!(ctx.duration(), 0.04);
    assert!(!ctx.is_image());
}

#[test]
fn test_multiple_frames_per_packet_are_drained() {
    let mut engine = video_clip(2);
    engine.frames_per_packet = 3;
    let mut ctx = engine.open();
    for _ in 0..6 {
        assert!(ctx.next_frame().unwrap().is_ready());
    }
    assert_eq!(ctx.next_frame().unwrap(), FrameStatus::EndOfStream);
}

#[test]
fn test_delayed_frames_flushed_at_end_of_input() {
    let mut engine = video_clip(4);
    engine.delay = 2;
    let mut ctx = engine.open();
    let mut positions = Vec::new();
    while ctx.next_frame().unwrap().is_ready() {
        positions.push(ctx.position());
    }
    assert_eq!(positions.len(), 4);
    for (pts, position) in positions.into_iter().enumerate() {
        assert_close(position, pts as f64 * 0.04);
    }
}

#[test]
fn test_busy_decoder_keeps_frames_at_end_of_input() {
    let mut engine = video_clip(4);
    engine.delay = 2;
    engine.busy = Busy::Alternate;
    let mut ctx = engine.open();
    let mut positions = Vec::new();
    while ctx.next_frame().unwrap().is_ready() {
        positions.push(ctx.position());
    }
    assert_eq!(positions.len(), 4);
    for (pts, position) in positions.into_iter().enumerate() {
        assert_close(position, pts as f64 * 0.04);
    }
}

#[test]
fn test_refused_packet_is_resent() {
    let mut engine = video_clip(3);
    engine.busy = Busy::Alternate;
    let mut ctx = engine.open();
    let mut count = 0;
    while ctx.next_frame().unwrap().is_ready() {
        count += 1;
    }
    assert_eq!(count, 3);
}

#[test]
fn test_stuck_decoder_is_an_error() {
    let mut engine = video_clip(3);
    engine.busy = Busy::Always;
    let mut ctx = engine.open();
    assert!(matches!(ctx.next_frame(), Err(MediaError::Codec(_))));
}

#[test]
fn test_audio_sample_rate_fallback() {
    let mut engine = ScriptedEngine::new(
        vec![audio_stream(0, -1, 0)],
        vec![audio_packet(0, 0, 64)],
    );
    engine.audio_rate = 0;
    let mut ctx = engine.open();
    assert_eq!(ctx.audio_info().original_sample_rate, 0);
    assert!(!ctx.is_image());

    assert_eq!(ctx.next_frame().unwrap(), ready(0, MediaType::Audio));
    assert_eq!(ctx.audio_info().original_sample_rate, 44100);

    ctx.decode_frame().unwrap();
    let info = ctx.audio_info();
    assert_eq!(info.original_channel_layout, ChannelLayout::MONO);
    assert_eq!(info.decoded_sample_rate, 44100);
    assert_eq!(info.sample_count_per_channel, 64);
    assert_eq!(ctx.audio_samples().map(<[u8]>::len), Some(64 * 4));
}

#[test]
fn test_decode_frame_requires_frame() {
    let mut ctx = video_clip(1).open();
    assert!(matches!(ctx.decode_frame(), Err(MediaError::InvalidState(_))));
}

#[test]
fn test_pixel_plan_rebuilt_only_on_change() {
    let engine = ScriptedEngine::new(
        vec![video_stream(0, 4)],
        vec![
            video_packet(0, 0, 4, 10),
            video_packet(0, 1, 4, 20),
            video_packet(0, 2, 8, 30),
            video_packet(0, 3, 8, 40),
        ],
    );
    let mut ctx = engine.open();
    for _ in 0..2 {
        ctx.next_frame().unwrap();
        ctx.decode_frame().unwrap();
    }
    assert_eq!(ctx.conversion_stats().pixel_builds, 1);

    for _ in 0..2 {
        ctx.next_frame().unwrap();
        ctx.decode_frame().unwrap();
    }
    let stats = ctx.conversion_stats();
    assert_eq!((stats.pixel_builds, stats.pixel_releases), (2, 1));
    assert_eq!(Counters::get(&engine.counters.plans_dropped), 1);
    // 输出尺寸固定为第一帧
    assert_eq!(ctx.video_info().decoded_width, 4);
    assert_eq!(ctx.video_buffer().unwrap().len(), 16);
    assert_eq!(&ctx.video_buffer().unwrap()[..4], &[40, 40, 40, 255]);
}

#[test]
fn test_sample_capacity_never_shrinks() {
    let engine = ScriptedEngine::new(
        vec![audio_stream(0, -1, 8000)],
        [100, 40, 250, 10, 250]
            .iter()
            .enumerate()
            .map(|(i, &n)| audio_packet(0, i as i64 * 250, n))
            .collect(),
    );
    let mut ctx = engine.open();
    let mut capacities = Vec::new();
    while ctx.next_frame().unwrap().is_ready() {
        ctx.decode_frame().unwrap();
        let info = ctx.audio_info();
        assert!(info.sample_count_per_channel <= info.sample_capacity_per_channel);
        capacities.push(info.sample_capacity_per_channel);
    }
    assert_eq!(capacities, vec![100, 100, 250, 250, 250]);
    assert_eq!(ctx.conversion_stats().sample_builds, 1);
}

#[test]
fn test_seek_sets_exact_position() {
    let engine = video_clip(10);
    let mut ctx = engine.open();
    ctx.seek(0.13).unwrap();
    assert_eq!(ctx.position(), 0.13);
    assert_eq!(Counters::get(&engine.counters.seeks), 1);
    // 同步拉取了 pts 3 与 4, 下一帧是 pts 5
    ctx.next_frame().unwrap();
    assert_close(ctx.position(), 0.2);
}

#[test]
fn test_seek_failure_keeps_position() {
    let mut engine = video_clip(10);
    engine.fail_seek = true;
    let mut ctx = engine.open();
    ctx.next_frame().unwrap();
    ctx.next_frame().unwrap();
    let before = ctx.position();
    assert!(matches!(ctx.seek(0.2), Err(MediaError::Seek(_))));
    assert_eq!(ctx.position(), before);
}

#[test]
fn test_seek_resync_past_end_fails() {
    let mut ctx = video_clip(5).open();
    let duration = ctx.duration();
    assert!(matches!(ctx.seek(0.17), Err(MediaError::Seek(_))));
    assert_eq!(ctx.position(), 0.0);
    assert_eq!(ctx.duration(), duration);
    assert_eq!(ctx.image_state(), ImageState::NotImage);

    ctx.seek(0.0).unwrap();
    assert!(ctx.next_frame().unwrap().is_ready());
    assert_eq!(ctx.position(), 0.0);
}

#[test]
fn test_seek_resync_frames_configurable() {
    let engine = video_clip(5);
    let options = DecoderOptions {
        resync_frames: 0,
        ..Default::default()
    };
    let mut ctx = engine.open_with(options);
    ctx.seek(0.16).unwrap();
    assert_eq!(ctx.position(), 0.16);
    assert_eq!(Counters::get(&engine.counters.reads), 0);
    assert_eq!(ctx.current_frame(), None);
}

#[test]
fn test_seek_rejects_bad_input() {
    let mut ctx = video_clip(5).open();
    assert!(matches!(ctx.seek(f64::NAN), Err(MediaError::InvalidArgument(_))));
    assert!(matches!(ctx.seek(-1.0), Err(MediaError::InvalidArgument(_))));

    let engine = ScriptedEngine::new(vec![other_stream(0, MediaType::Data)], Vec::new());
    let mut ctx = engine.open();
    assert!(matches!(ctx.seek(0.0), Err(MediaError::InvalidState(_))));
}

#[test]
fn test_confirmed_image_cannot_seek() {
    let engine = ScriptedEngine::new(vec![video_stream(0, -1)], vec![video_packet(0, 0, 4, 1)]);
    let mut ctx = engine.open();
    ctx.next_frame().unwrap();
    ctx.next_frame().unwrap();
    assert_eq!(ctx.image_state(), ImageState::Confirmed);
    assert!(ctx.seek(0.0).is_err());
}

#[test]
fn test_play_waits_for_clock() {
    let mut ctx = video_clip(10).open();
    assert_eq!(ctx.play(100.0).unwrap(), PlayStatus::Advanced { stream_index: 0 });
    assert!(ctx.is_playing());
    // pts 0 仍不晚于已播放时长 0
    assert_eq!(ctx.play(100.0).unwrap(), PlayStatus::Advanced { stream_index: 0 });
    assert_eq!(ctx.position(), 0.04);
    assert_eq!(ctx.play(100.01).unwrap(), PlayStatus::Unchanged);
    assert_eq!(ctx.play(100.05).unwrap(), PlayStatus::Advanced { stream_index: 0 });
    assert!((ctx.last_play_time() - 0.05).abs() < 1e-9);
    assert!(ctx.play(f64::INFINITY).is_err());
}

#[test]
fn test_play_loops_once_per_traversal() {
    let mut ctx = video_clip(5).open();
    let mut loops = 0;
    let mut max_position: f64 = 0.0;
    for step in 0..=100 {
        let status = ctx.play(step as f64 * 0.01).unwrap();
        max_position = max_position.max(ctx.position());
        if status == PlayStatus::Looped {
            loops += 1;
            assert_eq!(ctx.loop_count(), loops);
            assert_eq!(ctx.position(), 0.0);
            assert_eq!(ctx.last_play_time(), 0.0);
        }
    }
    assert!(loops >= 3, "只循环了 {loops} 次");
    assert!(max_position <= 0.16 + 1e-9);
    assert_close(ctx.duration(), 0.16);
}

#[test]
fn test_play_loop_seek_failure_keeps_clock() {
    let mut engine = video_clip(3);
    engine.fail_seek = true;
    let mut ctx = engine.open();
    for time in [0.0, 1.0, 2.0] {
        assert!(matches!(ctx.play(time), Ok(PlayStatus::Advanced { .. })));
    }
    assert_eq!(ctx.last_play_time(), 2.0);

    assert!(matches!(ctx.play(3.0), Err(MediaError::Seek(_))));
    assert_eq!(ctx.loop_count(), 0);
    assert_eq!(ctx.last_play_time(), 2.0);
    // 再次到达末尾仍然报错, 不会累加循环次数
    assert!(matches!(ctx.play(4.0), Err(MediaError::Seek(_))));
    assert_eq!(ctx.loop_count(), 0);
}

#[test]
fn test_set_output_only_before_allocation() {
    let mut ctx = video_clip(3).open();
    ctx.set_video_output(Some(2), Some(2), PixelFormat::Rgb24).unwrap();
    ctx.set_audio_output(Some(48000), Some(2), SampleFormat::S16).unwrap();
    assert!(ctx.set_video_output(None, None, PixelFormat::Nv12).is_err());

    ctx.next_frame().unwrap();
    ctx.decode_frame().unwrap();
    let info = ctx.video_info();
    assert_eq!((info.decoded_width, info.decoded_height), (2, 2));
    assert_eq!(info.bytes_per_frame, 12);
    assert_eq!(ctx.video_buffer().unwrap().len(), 12);
    assert!(matches!(
        ctx.set_video_output(Some(4), Some(4), PixelFormat::Rgba),
        Err(MediaError::InvalidState(_))
    ));
    // 音频缓冲区尚未分配
    ctx.set_audio_output(None, None, SampleFormat::F32).unwrap();
}

#[test]
fn test_close_releases_everything() {
    let engine = ScriptedEngine::new(
        vec![video_stream(0, 1), audio_stream(1, 80, 8000)],
        vec![video_packet(0, 0, 4, 1), audio_packet(1, 0, 80)],
    );
    let ctx = engine.open();
    ctx.close();
    assert_eq!(Counters::get(&engine.counters.decoders_dropped), 2);
    assert_eq!(Counters::get(&engine.counters.inputs_dropped), 1);
    assert_eq!(Counters::get(&engine.counters.plans_dropped), 0);

    let mut ctx = engine.open();
    while ctx.next_frame().unwrap().is_ready() {
        ctx.decode_frame().unwrap();
    }
    let stats = ctx.conversion_stats();
    assert_eq!((stats.pixel_builds, stats.sample_builds), (1, 1));
    ctx.close();
    assert_eq!(Counters::get(&engine.counters.plans_dropped), 2);
    assert_eq!(Counters::get(&engine.counters.decoders_dropped), 4);
    assert_eq!(Counters::get(&engine.counters.inputs_dropped), 2);
}
