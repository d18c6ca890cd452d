//! # mediadec-ffi
//!
//! mediadec C FFI 导出层.
//!
//! 把 [`DecoderContext`] 导出为 C 兼容的状态码接口,
//! 编译为 DLL (Windows) / SO (Linux) / dylib (macOS) 供 C/C++ 等语言调用.
//!
//! # 命名规范
//!
//! 所有导出函数以 `mediadec_` 前缀命名, 例如:
//! - `mediadec_open()` - 打开媒体, 失败返回空指针
//! - `mediadec_next_frame()` - 拉取下一帧
//!
//! # 状态码
//!
//! - `0`: 成功
//! - `1`: 流结束 (不是错误)
//! - 负数: 错误, 数值与 `MediaError::status_code()` 一致
//!
//! # 内存管理
//!
//! - 上下文由 `mediadec_open()` 分配, 必须通过 `mediadec_close()` 释放
//! - 信息结构体中的缓冲区指针归上下文所有, 在下一次 `decode_frame` 或 `close` 之前有效
//! - 未选中的流索引在 C 结构体中为 `-1`

use std::ffi::{CStr, c_char};
use std::ptr;

use log::warn;
use mediadec::DecoderContext;
use mediadec_core::{MediaError, MediaResult, PixelFormat, SampleFormat};

/// 空上下文指针对应的状态码
const STATUS_NULL: i32 = -1;

/// 播放信息
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct MediadecPlaybackInfo {
    pub stream_count: u32,
    pub selected_video_stream: i32,
    pub selected_audio_stream: i32,
    pub selected_subtitle_stream: i32,
    pub duration: f64,
    pub position: f64,
}

/// 视频信息
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MediadecVideoInfo {
    pub original_width: u32,
    pub original_height: u32,
    pub decoded_width: u32,
    pub decoded_height: u32,
    /// 见 [`pixel_format_code`]
    pub decoded_pixel_format: u32,
    pub frame_buffer: *const u8,
    pub bytes_per_frame: u32,
}

/// 音频信息
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MediadecAudioInfo {
    pub original_sample_rate: u32,
    pub original_channel_mask: u64,
    pub decoded_sample_rate: u32,
    pub decoded_channel_mask: u64,
    /// 见 [`sample_format_code`]
    pub decoded_sample_format: u32,
    pub bytes_per_sample: u32,
    pub frame_buffer: *const u8,
    pub sample_capacity_per_channel: u32,
    pub sample_count_per_channel: u32,
    pub channel_count: u32,
}

/// 像素格式的 C 枚举值
///
/// 0 未知, 1 R8, 2 R8G8B8, 3 R8G8B8A8, 4 R16G16B16, 5 R16G16B16A16,
/// 6 R16G16B16A16_FLOAT, 7 R32G32B32A32_FLOAT.
pub fn pixel_format_code(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Gray8 => 1,
        PixelFormat::Rgb24 => 2,
        PixelFormat::Rgba => 3,
        PixelFormat::Rgb48le => 4,
        PixelFormat::Rgba64le => 5,
        PixelFormat::Rgbaf16le => 6,
        PixelFormat::Rgbaf32le => 7,
        _ => 0,
    }
}

pub fn pixel_format_from_code(code: u32) -> Option<PixelFormat> {
    Some(match code {
        1 => PixelFormat::Gray8,
        2 => PixelFormat::Rgb24,
        3 => PixelFormat::Rgba,
        4 => PixelFormat::Rgb48le,
        5 => PixelFormat::Rgba64le,
        6 => PixelFormat::Rgbaf16le,
        7 => PixelFormat::Rgbaf32le,
        _ => return None,
    })
}

/// 采样格式的 C 枚举值
///
/// 0 未知, 1 UINT8, 2 INT16, 3 INT32, 4 FLOAT, 5 DOUBLE.
pub fn sample_format_code(format: SampleFormat) -> u32 {
    match format {
        SampleFormat::U8 => 1,
        SampleFormat::S16 => 2,
        SampleFormat::S32 => 3,
        SampleFormat::F32 => 4,
        SampleFormat::F64 => 5,
        _ => 0,
    }
}

pub fn sample_format_from_code(code: u32) -> Option<SampleFormat> {
    Some(match code {
        1 => SampleFormat::U8,
        2 => SampleFormat::S16,
        3 => SampleFormat::S32,
        4 => SampleFormat::F32,
        5 => SampleFormat::F64,
        _ => return None,
    })
}

fn status(result: MediaResult<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            warn!("mediadec 调用失败: {e}");
            e.status_code()
        }
    }
}

fn stream_index(index: Option<usize>) -> i32 {
    index.and_then(|i| i32::try_from(i).ok()).unwrap_or(-1)
}

fn clamp_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn nonzero(value: u32) -> Option<u32> {
    (value > 0).then_some(value)
}

/// 获取 mediadec 版本号字符串
///
/// 返回的字符串指针为静态分配, 无需释放.
#[unsafe(no_mangle)]
pub extern "C" fn mediadec_version() -> *const c_char {
    c"0.1.0".as_ptr()
}

/// 打开媒体, 失败时返回空指针
///
/// # Safety
///
/// `url` 必须为空或指向以 `\0` 结尾的字符串.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_open(url: *const c_char) -> *mut DecoderContext {
    if url.is_null() {
        return ptr::null_mut();
    }
    // 安全: 调用方保证 url 以 \0 结尾
    let url = unsafe { CStr::from_ptr(url) };
    let Ok(url) = url.to_str() else {
        warn!("mediadec_open: URL 不是有效的 UTF-8");
        return ptr::null_mut();
    };
    match DecoderContext::open(url) {
        Ok(ctx) => Box::into_raw(Box::new(ctx)),
        Err(e) => {
            warn!("mediadec_open: 无法打开 {url}: {e}");
            ptr::null_mut()
        }
    }
}

/// 是否按图片处理, 返回 1 或 0
///
/// # Safety
///
/// `ctx` 必须为空或来自 `mediadec_open()` 且尚未关闭.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_is_image(ctx: *const DecoderContext) -> i32 {
    // 安全: 调用方保证指针有效
    match unsafe { ctx.as_ref() } {
        Some(ctx) => i32::from(ctx.is_image()),
        None => 0,
    }
}

/// 按墙上时间推进播放
///
/// # Safety
///
/// `ctx` 必须为空或来自 `mediadec_open()` 且尚未关闭.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_play(ctx: *mut DecoderContext, time: f64) -> i32 {
    // 安全: 调用方保证指针有效且没有其他引用
    let Some(ctx) = (unsafe { ctx.as_mut() }) else {
        return STATUS_NULL;
    };
    status(ctx.play(time).map(|_| ()))
}

/// 拉取下一帧, 0 取到帧, 1 流结束
///
/// 取到帧时, `stream_index` 非空则写入帧所属的流索引.
///
/// # Safety
///
/// `ctx` 必须为空或来自 `mediadec_open()` 且尚未关闭;
/// `stream_index` 必须为空或指向可写的 `u32`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_next_frame(ctx: *mut DecoderContext, stream_index: *mut u32) -> i32 {
    // 安全: 调用方保证指针有效且没有其他引用
    let Some(ctx) = (unsafe { ctx.as_mut() }) else {
        return STATUS_NULL;
    };
    match ctx.next_frame() {
        Ok(frame_status) => {
            if let mediadec::FrameStatus::Ready { stream_index: index, .. } = frame_status {
                // 安全: 调用方保证 stream_index 可写
                if let Some(out) = unsafe { stream_index.as_mut() } {
                    *out = clamp_u32(index);
                }
            }
            frame_status.status_code()
        }
        Err(e) => status(Err(e)),
    }
}

/// 把当前帧转换到输出缓冲区
///
/// # Safety
///
/// `ctx` 必须为空或来自 `mediadec_open()` 且尚未关闭.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_decode_frame(ctx: *mut DecoderContext) -> i32 {
    // 安全: 调用方保证指针有效且没有其他引用
    let Some(ctx) = (unsafe { ctx.as_mut() }) else {
        return STATUS_NULL;
    };
    status(ctx.decode_frame())
}

/// 定位到 `time` 秒
///
/// # Safety
///
/// `ctx` 必须为空或来自 `mediadec_open()` 且尚未关闭.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_seek(ctx: *mut DecoderContext, time: f64) -> i32 {
    // 安全: 调用方保证指针有效且没有其他引用
    let Some(ctx) = (unsafe { ctx.as_mut() }) else {
        return STATUS_NULL;
    };
    status(ctx.seek(time))
}

/// 关闭上下文并把调用方的指针置空, 总是返回 0
///
/// # Safety
///
/// `ctx` 必须为空, 或指向空指针, 或指向来自 `mediadec_open()` 且尚未关闭的指针.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_close(ctx: *mut *mut DecoderContext) -> i32 {
    // 安全: 调用方保证指针有效
    let Some(slot) = (unsafe { ctx.as_mut() }) else {
        return 0;
    };
    let raw = std::mem::replace(slot, ptr::null_mut());
    if !raw.is_null() {
        // 安全: raw 来自 Box::into_raw, 置空后不会再次释放
        let ctx = unsafe { Box::from_raw(raw) };
        ctx.close();
    }
    0
}

/// 读取播放信息
///
/// # Safety
///
/// `ctx` 必须为空或来自 `mediadec_open()` 且尚未关闭; `out` 必须为空或可写.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_get_playback_info(
    ctx: *const DecoderContext,
    out: *mut MediadecPlaybackInfo,
) -> i32 {
    // 安全: 调用方保证指针有效
    let (Some(ctx), Some(out)) = (unsafe { ctx.as_ref() }, unsafe { out.as_mut() }) else {
        return STATUS_NULL;
    };
    let info = ctx.playback_info();
    *out = MediadecPlaybackInfo {
        stream_count: clamp_u32(info.stream_count),
        selected_video_stream: stream_index(info.selection.video),
        selected_audio_stream: stream_index(info.selection.audio),
        selected_subtitle_stream: stream_index(info.selection.subtitle),
        duration: info.duration,
        position: info.position,
    };
    0
}

/// 读取视频信息
///
/// # Safety
///
/// `ctx` 必须为空或来自 `mediadec_open()` 且尚未关闭; `out` 必须为空或可写.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_get_video_info(
    ctx: *const DecoderContext,
    out: *mut MediadecVideoInfo,
) -> i32 {
    // 安全: 调用方保证指针有效
    let (Some(ctx), Some(out)) = (unsafe { ctx.as_ref() }, unsafe { out.as_mut() }) else {
        return STATUS_NULL;
    };
    let info = ctx.video_info();
    *out = MediadecVideoInfo {
        original_width: info.original_width,
        original_height: info.original_height,
        decoded_width: info.decoded_width,
        decoded_height: info.decoded_height,
        decoded_pixel_format: pixel_format_code(info.pixel_format),
        frame_buffer: ctx.video_buffer().map_or(ptr::null(), <[u8]>::as_ptr),
        bytes_per_frame: clamp_u32(info.bytes_per_frame),
    };
    0
}

/// 读取音频信息
///
/// # Safety
///
/// `ctx` 必须为空或来自 `mediadec_open()` 且尚未关闭; `out` 必须为空或可写.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_get_audio_info(
    ctx: *const DecoderContext,
    out: *mut MediadecAudioInfo,
) -> i32 {
    // 安全: 调用方保证指针有效
    let (Some(ctx), Some(out)) = (unsafe { ctx.as_ref() }, unsafe { out.as_mut() }) else {
        return STATUS_NULL;
    };
    let info = ctx.audio_info();
    *out = MediadecAudioInfo {
        original_sample_rate: info.original_sample_rate,
        original_channel_mask: info.original_channel_layout.mask.bits(),
        decoded_sample_rate: info.decoded_sample_rate,
        decoded_channel_mask: info.decoded_channel_layout.mask.bits(),
        decoded_sample_format: sample_format_code(info.sample_format),
        bytes_per_sample: info.bytes_per_sample,
        frame_buffer: ctx.audio_buffer().map_or(ptr::null(), <[u8]>::as_ptr),
        sample_capacity_per_channel: info.sample_capacity_per_channel,
        sample_count_per_channel: info.sample_count_per_channel,
        channel_count: info.channel_count,
    };
    0
}

/// 设置视频输出, 宽高为 0 表示跟随源
///
/// # Safety
///
/// `ctx` 必须为空或来自 `mediadec_open()` 且尚未关闭.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_set_video_output(
    ctx: *mut DecoderContext,
    width: u32,
    height: u32,
    pixel_format: u32,
) -> i32 {
    // 安全: 调用方保证指针有效且没有其他引用
    let Some(ctx) = (unsafe { ctx.as_mut() }) else {
        return STATUS_NULL;
    };
    let Some(format) = pixel_format_from_code(pixel_format) else {
        return status(Err(MediaError::Unsupported(format!(
            "未知像素格式代码: {pixel_format}"
        ))));
    };
    status(ctx.set_video_output(nonzero(width), nonzero(height), format))
}

/// 设置音频输出, 采样率或声道数为 0 表示跟随源
///
/// # Safety
///
/// `ctx` 必须为空或来自 `mediadec_open()` 且尚未关闭.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mediadec_set_audio_output(
    ctx: *mut DecoderContext,
    sample_rate: u32,
    channels: u32,
    sample_format: u32,
) -> i32 {
    // 安全: 调用方保证指针有效且没有其他引用
    let Some(ctx) = (unsafe { ctx.as_mut() }) else {
        return STATUS_NULL;
    };
    let Some(format) = sample_format_from_code(sample_format) else {
        return status(Err(MediaError::Unsupported(format!(
            "未知采样格式代码: {sample_format}"
        ))));
    };
    status(ctx.set_audio_output(nonzero(sample_rate), nonzero(channels), format))
}
