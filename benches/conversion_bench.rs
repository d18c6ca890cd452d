//! mediadec 格式转换性能基准测试.
//!
//! 覆盖逐帧解码路径上最重的两步: 像素格式转换/缩放与音频重采样.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mediadec::convert::{PixelConversionCache, SampleConversionCache};
use mediadec::core::{ChannelLayout, PixelFormat, SampleFormat};
use mediadec::resample::{ResampleParams, SoftwareResampler};
use mediadec::scale::{ScaleAlgorithm, ScaleParams, SoftwareScaler};

/// 创建 YUV420P 测试图像的三个平面
fn make_yuv420p(width: u32, height: u32) -> Vec<Vec<u8>> {
    let (w, h) = (width as usize, height as usize);
    let y: Vec<u8> = (0..w * h).map(|i| (i % 256) as u8).collect();
    let u = vec![128u8; (w / 2) * (h / 2)];
    let v = vec![128u8; (w / 2) * (h / 2)];
    vec![y, u, v]
}

/// 创建 S16 交错音频
fn make_s16(nb_samples: u32, channels: u32) -> Vec<u8> {
    (0..nb_samples * channels)
        .flat_map(|i| (((i % 256) as i16).wrapping_mul(100)).to_le_bytes())
        .collect()
}

fn bench_pixel(c: &mut Criterion, name: &str, dst_width: u32, dst_height: u32) {
    let (width, height) = (1280u32, 720u32);
    let planes = make_yuv420p(width, height);
    let src: Vec<&[u8]> = planes.iter().map(Vec::as_slice).collect();
    let linesize = [width as usize, width as usize / 2, width as usize / 2];

    let mut cache = PixelConversionCache::new(Box::new(SoftwareScaler));
    let params = ScaleParams {
        src_width: width,
        src_height: height,
        src_format: PixelFormat::Yuv420p,
        dst_width,
        dst_height,
        dst_format: PixelFormat::Rgba,
        algorithm: ScaleAlgorithm::Bilinear,
    };
    cache.set_parameters(&params).unwrap();
    let dst_linesize = dst_width as usize * 4;
    let mut dst = vec![0u8; dst_linesize * dst_height as usize];

    c.bench_function(name, |b| {
        b.iter(|| {
            cache
                .convert(black_box(&src), &linesize, &mut dst, dst_linesize)
                .unwrap();
        });
    });
}

fn bench_yuv420p_to_rgba(c: &mut Criterion) {
    bench_pixel(c, "yuv420p_to_rgba_720p", 1280, 720);
}

fn bench_yuv420p_scale_to_rgba(c: &mut Criterion) {
    bench_pixel(c, "yuv420p_scale_to_rgba_720p_to_360p", 640, 360);
}

fn bench_resample(c: &mut Criterion) {
    let nb_samples = 1024u32;
    let input = make_s16(nb_samples, 2);
    let mut cache = SampleConversionCache::new(Box::new(SoftwareResampler));
    cache
        .set_parameters(&ResampleParams {
            src_sample_rate: 44100,
            src_channel_layout: ChannelLayout::STEREO,
            src_sample_format: SampleFormat::S16,
            dst_sample_rate: 48000,
            dst_channel_layout: ChannelLayout::STEREO,
            dst_sample_format: SampleFormat::F32,
        })
        .unwrap();
    let capacity = cache.max_output_samples(nb_samples).unwrap();
    let mut output = vec![0u8; capacity as usize * 2 * 4];

    c.bench_function("resample_s16_44100_to_f32_48000_stereo", |b| {
        b.iter(|| {
            cache
                .convert(&[black_box(input.as_slice())], nb_samples, &mut output, capacity)
                .unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_yuv420p_to_rgba,
    bench_yuv420p_scale_to_rgba,
    bench_resample
);
criterion_main!(benches);
