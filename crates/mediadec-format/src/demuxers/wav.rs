//! WAV (RIFF WAVE) 解封装器.
//!
//! ```text
//! RIFF header:  "RIFF" + file_size-8 + "WAVE"
//! fmt  chunk:   "fmt " + chunk_size + audio_format + channels + sample_rate
//!              + byte_rate + block_align + bits_per_sample
//! data chunk:   "data" + data_size + PCM samples...
//! ```

use log::{debug, warn};
use mediadec_codec::{CodecId, Packet};
use mediadec_core::{ChannelLayout, MediaError, MediaResult, MediaType, Rational, SampleFormat};

use crate::demuxer::{Demuxer, SeekFlags};
use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::probe::{FormatProbe, ProbeScore, SCORE_EXTENSION, SCORE_MAX, extension_matches};
use crate::stream::{AudioStreamParams, Stream, StreamParams};

const WAV_FORMAT_PCM: u16 = 0x0001;
const WAV_FORMAT_IEEE_FLOAT: u16 = 0x0003;
const WAV_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// 每个数据包包含的采样数 (每声道)
const SAMPLES_PER_PACKET: u32 = 4096;

/// WAV 解封装器
pub struct WavDemuxer {
    streams: Vec<Stream>,
    /// data 块在文件中的起始偏移
    data_offset: u64,
    /// data 块的大小 (字节)
    data_size: u64,
    /// 当前读取位置 (相对于 data 块起始)
    data_pos: u64,
    packet_size: usize,
    block_align: u16,
    sample_rate: u32,
}

impl WavDemuxer {
    /// 工厂函数
    pub fn create() -> MediaResult<Box<dyn Demuxer>> {
        Ok(Box::new(Self {
            streams: Vec::new(),
            data_offset: 0,
            data_size: 0,
            data_pos: 0,
            packet_size: 0,
            block_align: 0,
            sample_rate: 0,
        }))
    }

    fn resolve_codec_id(audio_format: u16, bits_per_sample: u16) -> MediaResult<CodecId> {
        match (audio_format, bits_per_sample) {
            (WAV_FORMAT_PCM, 8) => Ok(CodecId::PcmU8),
            (WAV_FORMAT_PCM, 16) => Ok(CodecId::PcmS16le),
            (WAV_FORMAT_PCM, 24) => Ok(CodecId::PcmS24le),
            (WAV_FORMAT_PCM, 32) => Ok(CodecId::PcmS32le),
            (WAV_FORMAT_IEEE_FLOAT, 32) => Ok(CodecId::PcmF32le),
            (WAV_FORMAT_PCM | WAV_FORMAT_IEEE_FLOAT, bits) => {
                Err(MediaError::Unsupported(format!("不支持的 WAV 位深: {bits}")))
            }
            (fmt, _) => Err(MediaError::Unsupported(format!(
                "不支持的 WAV 格式码: 0x{fmt:04X}"
            ))),
        }
    }

    fn resolve_sample_format(codec_id: CodecId) -> SampleFormat {
        match codec_id {
            CodecId::PcmU8 => SampleFormat::U8,
            CodecId::PcmS16le => SampleFormat::S16,
            CodecId::PcmS24le | CodecId::PcmS32le => SampleFormat::S32,
            CodecId::PcmF32le => SampleFormat::F32,
            _ => SampleFormat::None,
        }
    }
}

impl Demuxer for WavDemuxer {
    fn format_id(&self) -> FormatId {
        FormatId::Wav
    }

    fn open(&mut self, io: &mut IoContext) -> MediaResult<()> {
        if &io.read_tag()? != b"RIFF" {
            return Err(MediaError::InvalidData("不是有效的 RIFF 文件".into()));
        }
        let _riff_size = io.read_u32_le()?;
        if &io.read_tag()? != b"WAVE" {
            return Err(MediaError::InvalidData("不是有效的 WAVE 文件".into()));
        }

        let mut fmt: Option<(u16, u16, u32, u16, u16)> = None;
        loop {
            let chunk_id = match io.read_tag() {
                Ok(tag) => tag,
                Err(MediaError::Eof) => {
                    return Err(MediaError::InvalidData("未找到 data 块".into()));
                }
                Err(e) => return Err(e),
            };
            let chunk_size = io.read_u32_le()?;

            match &chunk_id {
                b"fmt " => {
                    if chunk_size < 16 {
                        return Err(MediaError::InvalidData("fmt 块大小不足 16 字节".into()));
                    }
                    let mut audio_format = io.read_u16_le()?;
                    let channels = io.read_u16_le()?;
                    let sample_rate = io.read_u32_le()?;
                    let _byte_rate = io.read_u32_le()?;
                    let block_align = io.read_u16_le()?;
                    let bits_per_sample = io.read_u16_le()?;
                    let mut consumed = 16u32;

                    // WAVE_FORMAT_EXTENSIBLE: 真实格式码在子格式 GUID 的前两个字节
                    if audio_format == WAV_FORMAT_EXTENSIBLE && chunk_size >= 40 {
                        let _cb_size = io.read_u16_le()?;
                        let _valid_bits = io.read_u16_le()?;
                        let _channel_mask = io.read_u32_le()?;
                        audio_format = io.read_u16_le()?;
                        consumed += 10;
                    }
                    io.skip((chunk_size - consumed) as usize)?;

                    debug!(
                        "fmt: format={audio_format}, channels={channels}, rate={sample_rate}, \
                         block_align={block_align}, bits={bits_per_sample}"
                    );
                    fmt = Some((audio_format, channels, sample_rate, block_align, bits_per_sample));
                }
                b"data" => {
                    if fmt.is_none() {
                        return Err(MediaError::InvalidData("data 块出现在 fmt 块之前".into()));
                    }
                    self.data_offset = io.position()?;
                    self.data_size = u64::from(chunk_size);
                    // 截断的文件按实际大小处理
                    if let Some(size) = io.size() {
                        self.data_size = self.data_size.min(size.saturating_sub(self.data_offset));
                    }
                    break;
                }
                _ => {
                    warn!(
                        "跳过未知块: '{}', 大小={chunk_size}",
                        String::from_utf8_lossy(&chunk_id)
                    );
                    io.skip(chunk_size as usize)?;
                }
            }
            // 块按偶数对齐
            if chunk_size % 2 != 0 {
                io.skip(1)?;
            }
        }

        let Some((audio_format, channels, sample_rate, block_align, bits_per_sample)) = fmt else {
            return Err(MediaError::InvalidData("未找到 fmt 块".into()));
        };
        if channels == 0 || block_align == 0 || sample_rate == 0 {
            return Err(MediaError::InvalidData("fmt 块参数为 0".into()));
        }

        let codec_id = Self::resolve_codec_id(audio_format, bits_per_sample)?;
        let total_samples = self.data_size / u64::from(block_align);
        self.streams = vec![Stream {
            index: 0,
            media_type: MediaType::Audio,
            codec_id,
            time_base: Rational::new(1, sample_rate as i32),
            duration: total_samples as i64,
            start_time: 0,
            nb_frames: total_samples,
            params: StreamParams::Audio(AudioStreamParams {
                sample_rate,
                channel_layout: ChannelLayout::from_channels(u32::from(channels)),
                sample_format: Self::resolve_sample_format(codec_id),
                bit_rate: u64::from(sample_rate)
                    * u64::from(channels)
                    * u64::from(bits_per_sample),
            }),
        }];
        self.block_align = block_align;
        self.sample_rate = sample_rate;
        self.data_pos = 0;
        self.packet_size = usize::from(block_align) * SAMPLES_PER_PACKET as usize;

        debug!(
            "WAV 打开完成: {sample_rate} Hz, {channels} 声道, {bits_per_sample} 位, 总采样数={total_samples}"
        );
        Ok(())
    }

    fn streams(&self) -> &[Stream] {
        &self.streams
    }

    fn read_packet(&mut self, io: &mut IoContext) -> MediaResult<Packet> {
        let ba = u64::from(self.block_align);
        let remaining = self.data_size.saturating_sub(self.data_pos);
        let read_size = (remaining.min(self.packet_size as u64) / ba) * ba;
        if read_size == 0 {
            return Err(MediaError::Eof);
        }

        let data = io.read_bytes(read_size as usize)?;
        let mut pkt = Packet::from_data(data);
        pkt.stream_index = 0;
        pkt.pts = (self.data_pos / ba) as i64;
        pkt.dts = pkt.pts;
        pkt.duration = (read_size / ba) as i64;
        pkt.time_base = Rational::new(1, self.sample_rate as i32);
        pkt.is_keyframe = true;
        pkt.pos = (self.data_offset + self.data_pos) as i64;

        self.data_pos += read_size;
        Ok(pkt)
    }

    fn seek(
        &mut self,
        io: &mut IoContext,
        _stream_index: usize,
        timestamp: i64,
        _flags: SeekFlags,
    ) -> MediaResult<()> {
        if !io.is_seekable() {
            return Err(MediaError::Unsupported("输入不支持随机访问".into()));
        }
        let ba = u64::from(self.block_align);
        let offset = (timestamp.max(0) as u64).saturating_mul(ba).min(self.data_size);
        let aligned = (offset / ba) * ba;

        io.seek(std::io::SeekFrom::Start(self.data_offset + aligned))?;
        self.data_pos = aligned;
        debug!("WAV seek: 采样 {} (字节偏移 {aligned})", aligned / ba);
        Ok(())
    }

    fn duration(&self) -> Option<f64> {
        self.streams.first().and_then(Stream::duration_seconds)
    }
}

/// WAV 格式探测器
pub struct WavProbe;

impl FormatProbe for WavProbe {
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore> {
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE" {
            return Some(SCORE_MAX);
        }
        extension_matches(FormatId::Wav, filename).then_some(SCORE_EXTENSION)
    }

    fn format_id(&self) -> FormatId {
        FormatId::Wav
    }
}
