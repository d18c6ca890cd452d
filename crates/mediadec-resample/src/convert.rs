//! 采样格式转换.
//!
//! 所有格式先解码为归一化 f64 (-1.0 ~ 1.0) 交错样本, 混合与插值之后再编码.

use mediadec_core::{MediaError, MediaResult, SampleFormat};

/// 把一帧输入解码为 f64 交错样本
///
/// 平面格式每个声道一个平面, 交错格式只使用第一个平面.
pub fn decode_samples(
    planes: &[&[u8]],
    format: SampleFormat,
    nb_samples: usize,
    channels: usize,
    out: &mut Vec<f64>,
) -> MediaResult<()> {
    let bps = format.bytes_per_sample() as usize;
    if bps == 0 {
        return Err(MediaError::InvalidArgument("无效的采样格式".into()));
    }
    out.clear();
    out.reserve(nb_samples * channels);

    if format.is_planar() {
        if planes.len() < channels {
            return Err(MediaError::InvalidArgument(format!(
                "平面数量不足: 期望 {channels}, 实际 {}",
                planes.len()
            )));
        }
        let needed = nb_samples * bps;
        if let Some(short) = planes[..channels].iter().position(|p| p.len() < needed) {
            return Err(MediaError::InvalidArgument(format!(
                "声道 {short} 数据不足: 期望 {needed} 字节"
            )));
        }
        for s in 0..nb_samples {
            let offset = s * bps;
            for plane in &planes[..channels] {
                out.push(decode_sample(&plane[offset..offset + bps], format)?);
            }
        }
    } else {
        let needed = nb_samples * channels * bps;
        let data = planes.first().copied().unwrap_or_default();
        if data.len() < needed {
            return Err(MediaError::InvalidArgument(format!(
                "数据不足: 期望 {needed} 字节, 实际 {} 字节",
                data.len()
            )));
        }
        for chunk in data[..needed].chunks_exact(bps) {
            out.push(decode_sample(chunk, format)?);
        }
    }
    Ok(())
}

/// 把 f64 交错样本编码到输出缓冲区, 返回写入的字节数
pub fn encode_samples(samples: &[f64], format: SampleFormat, out: &mut [u8]) -> MediaResult<usize> {
    let bps = format.bytes_per_sample() as usize;
    let needed = samples.len() * bps;
    if bps == 0 || format.is_planar() {
        return Err(MediaError::Unsupported(format!(
            "不支持的输出采样格式: {format}"
        )));
    }
    if out.len() < needed {
        return Err(MediaError::InvalidArgument(format!(
            "输出缓冲区不足: 期望 {needed} 字节, 实际 {} 字节",
            out.len()
        )));
    }
    for (&value, dst) in samples.iter().zip(out.chunks_exact_mut(bps)) {
        encode_sample(value, format, dst);
    }
    Ok(needed)
}

/// 将原始字节解码为归一化 f64 样本
fn decode_sample(data: &[u8], format: SampleFormat) -> MediaResult<f64> {
    match format.to_interleaved() {
        SampleFormat::U8 => Ok((f64::from(data[0]) - 128.0) / 128.0),
        SampleFormat::S16 => Ok(f64::from(i16::from_le_bytes([data[0], data[1]])) / 32768.0),
        SampleFormat::S32 => {
            let v = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
            Ok(f64::from(v) / 2_147_483_648.0)
        }
        SampleFormat::F32 => Ok(f64::from(f32::from_le_bytes([
            data[0], data[1], data[2], data[3],
        ]))),
        SampleFormat::F64 => Ok(f64::from_le_bytes([
            data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
        ])),
        _ => Err(MediaError::Unsupported(format!("不支持的采样格式: {format}"))),
    }
}

/// 将归一化 f64 样本编码为原始字节, `out` 长度等于采样字节数
fn encode_sample(value: f64, format: SampleFormat, out: &mut [u8]) {
    match format {
        SampleFormat::U8 => {
            out[0] = ((value * 128.0) + 128.0).round().clamp(0.0, 255.0) as u8;
        }
        SampleFormat::S16 => {
            let v = (value * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
            out.copy_from_slice(&v.to_le_bytes());
        }
        SampleFormat::S32 => {
            let v = (value * 2_147_483_648.0)
                .round()
                .clamp(-2_147_483_648.0, 2_147_483_647.0) as i32;
            out.copy_from_slice(&v.to_le_bytes());
        }
        SampleFormat::F32 => out.copy_from_slice(&(value as f32).to_le_bytes()),
        SampleFormat::F64 => out.copy_from_slice(&value.to_le_bytes()),
        // 调用方已排除平面与无效格式
        _ => {}
    }
}
