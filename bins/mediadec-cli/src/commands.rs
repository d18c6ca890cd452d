//! 子命令实现.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use mediadec::{DecoderContext, FrameStatus, PlayStatus};
use mediadec_core::MediaType;
use mediadec_format::{Stream, StreamParams};
use serde::Serialize;

// ============================================================
// JSON 输出结构体
// ============================================================

/// 完整探测结果
#[derive(Serialize)]
struct ProbeOutput {
    filename: String,
    format_name: String,
    playback: PlaybackOutput,
    streams: Vec<StreamOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<VideoOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<AudioOutput>,
}

#[derive(Serialize)]
struct PlaybackOutput {
    stream_count: usize,
    video_stream: Option<usize>,
    audio_stream: Option<usize>,
    subtitle_stream: Option<usize>,
    duration: f64,
    is_image: bool,
}

#[derive(Serialize)]
struct StreamOutput {
    index: usize,
    codec_type: String,
    codec_name: String,
    time_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pix_fmt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_fmt: Option<String>,
}

#[derive(Serialize)]
struct VideoOutput {
    original_width: u32,
    original_height: u32,
    pixel_format: String,
    bytes_per_frame: usize,
}

#[derive(Serialize)]
struct AudioOutput {
    original_sample_rate: u32,
    original_channels: u32,
    sample_format: String,
    bytes_per_sample: u32,
}

fn stream_output(stream: &Stream) -> StreamOutput {
    let mut out = StreamOutput {
        index: stream.index,
        codec_type: stream.media_type.to_string(),
        codec_name: stream.codec_id.name().to_string(),
        time_base: stream.time_base.to_string(),
        duration: stream.duration_seconds(),
        width: None,
        height: None,
        pix_fmt: None,
        sample_rate: None,
        channels: None,
        sample_fmt: None,
    };
    match &stream.params {
        StreamParams::Video(v) => {
            out.width = Some(v.width);
            out.height = Some(v.height);
            out.pix_fmt = Some(v.pixel_format.to_string());
        }
        StreamParams::Audio(a) => {
            out.sample_rate = Some(a.sample_rate);
            out.channels = Some(a.channel_layout.channels);
            out.sample_fmt = Some(a.sample_format.to_string());
        }
        StreamParams::Subtitle | StreamParams::Other => {}
    }
    out
}

/// 显示播放, 视频与音频信息
pub fn probe(input: &str, ctx: &DecoderContext, json: bool) -> Result<()> {
    let playback = ctx.playback_info();
    let selection = playback.selection;
    let video = ctx.video_info();
    let audio = ctx.audio_info();
    let output = ProbeOutput {
        filename: input.to_string(),
        format_name: ctx.format_name().to_string(),
        playback: PlaybackOutput {
            stream_count: playback.stream_count,
            video_stream: selection.video,
            audio_stream: selection.audio,
            subtitle_stream: selection.subtitle,
            duration: playback.duration,
            is_image: ctx.is_image(),
        },
        streams: ctx.streams().iter().map(stream_output).collect(),
        video: selection.video.map(|_| VideoOutput {
            original_width: video.original_width,
            original_height: video.original_height,
            pixel_format: video.pixel_format.to_string(),
            bytes_per_frame: video.bytes_per_frame,
        }),
        audio: selection.audio.map(|_| AudioOutput {
            original_sample_rate: audio.original_sample_rate,
            original_channels: audio.original_channel_layout.channels,
            sample_format: audio.sample_format.to_string(),
            bytes_per_sample: audio.bytes_per_sample,
        }),
    };

    if json {
        let text = serde_json::to_string_pretty(&output).context("无法序列化探测结果")?;
        println!("{text}");
        return Ok(());
    }

    println!("输入: {} ({})", output.filename, output.format_name);
    println!(
        "  流数: {}, 时长: {:.3}s{}",
        output.playback.stream_count,
        output.playback.duration,
        if output.playback.is_image { ", 静态图片" } else { "" },
    );
    for s in &output.streams {
        let mut line = format!("  流 #{}: {} {} tb={}", s.index, s.codec_type, s.codec_name, s.time_base);
        if let (Some(w), Some(h)) = (s.width, s.height) {
            line.push_str(&format!(", {w}x{h}"));
        }
        if let Some(rate) = s.sample_rate {
            line.push_str(&format!(", {rate} Hz"));
        }
        if let Some(ch) = s.channels {
            line.push_str(&format!(", {ch} 声道"));
        }
        println!("{line}");
    }
    if let Some(v) = &output.video {
        println!(
            "  视频输出: {}x{} {}, 每帧 {} 字节",
            v.original_width, v.original_height, v.pixel_format, v.bytes_per_frame
        );
    }
    if let Some(a) = &output.audio {
        println!(
            "  音频输出: {} Hz, {} 声道, {}",
            a.original_sample_rate, a.original_channels, a.sample_format
        );
    }
    Ok(())
}

fn create_output(path: Option<&Path>) -> Result<Option<BufWriter<File>>> {
    path.map(|p| {
        File::create(p)
            .map(BufWriter::new)
            .with_context(|| format!("无法创建输出文件 {}", p.display()))
    })
    .transpose()
}

/// 逐帧解码并写出转换后的原始数据
pub fn decode(
    ctx: &mut DecoderContext,
    video_out: Option<&Path>,
    audio_out: Option<&Path>,
    max_frames: Option<u64>,
) -> Result<()> {
    let mut video_writer = create_output(video_out)?;
    let mut audio_writer = create_output(audio_out)?;
    let (mut video_frames, mut audio_frames) = (0u64, 0u64);

    while max_frames.is_none_or(|max| video_frames + audio_frames < max) {
        let FrameStatus::Ready { media_type, .. } = ctx.next_frame().context("读取帧失败")? else {
            break;
        };
        ctx.decode_frame().context("转换帧失败")?;
        match media_type {
            MediaType::Video => {
                video_frames += 1;
                if let (Some(w), Some(buf)) = (video_writer.as_mut(), ctx.video_buffer()) {
                    w.write_all(buf).context("写入视频帧失败")?;
                }
            }
            MediaType::Audio => {
                audio_frames += 1;
                if let (Some(w), Some(buf)) = (audio_writer.as_mut(), ctx.audio_samples()) {
                    w.write_all(buf).context("写入音频采样失败")?;
                }
            }
            _ => {}
        }
    }

    for w in [video_writer.as_mut(), audio_writer.as_mut()].into_iter().flatten() {
        w.flush().context("写入输出文件失败")?;
    }

    let video = ctx.video_info();
    let audio = ctx.audio_info();
    info!("解码完成: 视频 {video_frames} 帧, 音频 {audio_frames} 帧");
    println!("视频帧: {video_frames}, 输出 {}x{} {}", video.decoded_width, video.decoded_height, video.pixel_format);
    println!(
        "音频帧: {audio_frames}, 输出 {} Hz {} 声道 {}",
        audio.decoded_sample_rate, audio.channel_count, audio.sample_format
    );
    println!("位置: {:.3}s / 时长: {:.3}s", ctx.position(), ctx.duration());
    Ok(())
}

/// 用模拟时钟驱动播放
pub fn play(ctx: &mut DecoderContext, seconds: f64, fps: f64) -> Result<()> {
    anyhow::ensure!(seconds >= 0.0 && seconds.is_finite(), "无效的播放时长: {seconds}");
    anyhow::ensure!(fps > 0.0 && fps.is_finite(), "无效的时钟刷新率: {fps}");

    let ticks = (seconds * fps).ceil() as u64;
    let mut advanced = 0u64;
    for tick in 0..=ticks {
        let time = tick as f64 / fps;
        match ctx.play(time).with_context(|| format!("{time:.3}s 时播放失败"))? {
            PlayStatus::Advanced { .. } => {
                advanced += 1;
                ctx.decode_frame().context("转换帧失败")?;
            }
            PlayStatus::Looped => info!("{time:.3}s: 第 {} 次循环", ctx.loop_count()),
            PlayStatus::Unchanged => {}
        }
    }

    println!(
        "模拟 {seconds:.3}s: 推进 {advanced} 帧, 循环 {} 次, 当前位置 {:.3}s",
        ctx.loop_count(),
        ctx.position()
    );
    Ok(())
}

/// 定位到指定时间
pub fn seek(ctx: &mut DecoderContext, time: f64) -> Result<()> {
    ctx.seek(time).with_context(|| format!("无法定位到 {time}s"))?;
    let current = ctx
        .current_frame()
        .map(|(index, media_type)| format!("流 #{index} 的{media_type}帧"))
        .unwrap_or_else(|| "无".to_string());
    println!("位置: {:.3}s, 当前帧: {current}", ctx.position());
    Ok(())
}
