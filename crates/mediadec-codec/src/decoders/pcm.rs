//! PCM 音频解码器.
//!
//! 把未压缩 PCM 数据转换为交错格式的 AudioFrame. 大数据包按
//! [`MAX_FRAME_SAMPLES`] 切分成多帧, 调用方需要反复 `receive_frame()` 取完.

use std::collections::VecDeque;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::debug;
use mediadec_core::{ChannelLayout, MediaError, MediaResult, NOPTS_VALUE, SampleFormat};

use crate::codec_id::CodecId;
use crate::codec_parameters::{CodecParameters, CodecParamsType};
use crate::decoder::Decoder;
use crate::frame::{AudioFrame, Frame};
use crate::packet::Packet;

/// 单帧最多包含的采样数 (每声道)
pub const MAX_FRAME_SAMPLES: u32 = 4096;

/// PCM 变体描述
struct PcmFormatDesc {
    codec_id: CodecId,
    /// 码流中每个样本的字节数
    bytes_per_sample: u32,
    /// 输出的采样格式
    output_format: SampleFormat,
    /// 把码流字节转换为输出格式字节
    decode_fn: DecodeFn,
}

type DecodeFn = fn(&[u8], &mut Vec<u8>);

fn decode_copy(src: &[u8], dst: &mut Vec<u8>) {
    dst.extend_from_slice(src);
}

fn decode_s16be(src: &[u8], dst: &mut Vec<u8>) {
    let mut buf = [0u8; 2];
    for chunk in src.chunks_exact(2) {
        LittleEndian::write_i16(&mut buf, BigEndian::read_i16(chunk));
        dst.extend_from_slice(&buf);
    }
}

/// 24 位符号扩展到 32 位, 数值左移 8 位保持满量程
fn decode_s24le(src: &[u8], dst: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    for chunk in src.chunks_exact(3) {
        let v = LittleEndian::read_i24(chunk);
        LittleEndian::write_i32(&mut buf, v << 8);
        dst.extend_from_slice(&buf);
    }
}

fn pcm_format_desc(codec_id: CodecId) -> Option<PcmFormatDesc> {
    let desc = |bytes_per_sample, output_format, decode_fn: DecodeFn| PcmFormatDesc {
        codec_id,
        bytes_per_sample,
        output_format,
        decode_fn,
    };
    Some(match codec_id {
        CodecId::PcmU8 => desc(1, SampleFormat::U8, decode_copy),
        CodecId::PcmS16le => desc(2, SampleFormat::S16, decode_copy),
        CodecId::PcmS16be => desc(2, SampleFormat::S16, decode_s16be),
        CodecId::PcmS24le => desc(3, SampleFormat::S32, decode_s24le),
        CodecId::PcmS32le => desc(4, SampleFormat::S32, decode_copy),
        CodecId::PcmF32le => desc(4, SampleFormat::F32, decode_copy),
        _ => return None,
    })
}

/// PCM 音频解码器
pub struct PcmDecoder {
    desc: PcmFormatDesc,
    sample_rate: u32,
    channel_layout: ChannelLayout,
    /// 每个样本块的字节数 (每样本字节数 * 声道数)
    block_align: u32,
    /// 待取出的帧
    pending: VecDeque<Frame>,
    opened: bool,
    flushing: bool,
}

impl PcmDecoder {
    fn create(codec_id: CodecId) -> MediaResult<Box<dyn Decoder>> {
        let desc = pcm_format_desc(codec_id)
            .ok_or_else(|| MediaError::CodecNotFound(format!("不支持的 PCM 格式: {codec_id}")))?;
        Ok(Box::new(Self {
            desc,
            sample_rate: 0,
            channel_layout: ChannelLayout::UNKNOWN,
            block_align: 0,
            pending: VecDeque::new(),
            opened: false,
            flushing: false,
        }))
    }

    pub fn new_u8() -> MediaResult<Box<dyn Decoder>> {
        Self::create(CodecId::PcmU8)
    }

    pub fn new_s16le() -> MediaResult<Box<dyn Decoder>> {
        Self::create(CodecId::PcmS16le)
    }

    pub fn new_s16be() -> MediaResult<Box<dyn Decoder>> {
        Self::create(CodecId::PcmS16be)
    }

    pub fn new_s24le() -> MediaResult<Box<dyn Decoder>> {
        Self::create(CodecId::PcmS24le)
    }

    pub fn new_s32le() -> MediaResult<Box<dyn Decoder>> {
        Self::create(CodecId::PcmS32le)
    }

    pub fn new_f32le() -> MediaResult<Box<dyn Decoder>> {
        Self::create(CodecId::PcmF32le)
    }
}

impl Decoder for PcmDecoder {
    fn codec_id(&self) -> CodecId {
        self.desc.codec_id
    }

    fn name(&self) -> &str {
        self.desc.codec_id.name()
    }

    fn open(&mut self, params: &CodecParameters) -> MediaResult<()> {
        let CodecParamsType::Audio(audio) = &params.params else {
            return Err(MediaError::InvalidArgument("PCM 解码器需要音频参数".into()));
        };
        if audio.channel_layout.channels == 0 {
            return Err(MediaError::InvalidArgument("声道数不能为 0".into()));
        }

        self.sample_rate = audio.sample_rate;
        self.channel_layout = audio.channel_layout;
        self.block_align = self.desc.bytes_per_sample * audio.channel_layout.channels;
        self.pending.clear();
        self.opened = true;
        self.flushing = false;

        debug!(
            "打开 {} 解码器: {} Hz, {} 声道, 输出格式={}",
            self.name(),
            self.sample_rate,
            self.channel_layout.channels,
            self.desc.output_format,
        );
        Ok(())
    }

    fn send_packet(&mut self, packet: &Packet) -> MediaResult<()> {
        if !self.opened {
            return Err(MediaError::Codec("解码器未打开, 请先调用 open()".into()));
        }
        if !self.pending.is_empty() {
            return Err(MediaError::NeedMoreData);
        }
        if packet.is_empty() {
            self.flushing = true;
            return Ok(());
        }

        let block_align = self.block_align as usize;
        if packet.data.len() % block_align != 0 {
            return Err(MediaError::InvalidData(format!(
                "数据大小 {} 不是 block_align {} 的整数倍",
                packet.data.len(),
                block_align,
            )));
        }

        let chunk_bytes = MAX_FRAME_SAMPLES as usize * block_align;
        let mut pts = packet.pts;
        for chunk in packet.data.chunks(chunk_bytes) {
            let nb_samples = (chunk.len() / block_align) as u32;
            let mut frame = AudioFrame::new(
                nb_samples,
                self.sample_rate,
                self.desc.output_format,
                self.channel_layout,
            );
            frame.pts = pts;
            frame.time_base = packet.time_base;
            frame.duration = i64::from(nb_samples);

            let out_len = nb_samples as usize
                * self.channel_layout.channels as usize
                * self.desc.output_format.bytes_per_sample() as usize;
            let mut decoded = Vec::with_capacity(out_len);
            (self.desc.decode_fn)(chunk, &mut decoded);
            frame.data[0] = decoded;
            self.pending.push_back(Frame::Audio(frame));

            if pts != NOPTS_VALUE {
                pts += i64::from(nb_samples);
            }
        }
        Ok(())
    }

    fn receive_frame(&mut self) -> MediaResult<Frame> {
        if let Some(frame) = self.pending.pop_front() {
            return Ok(frame);
        }
        if self.flushing {
            return Err(MediaError::Eof);
        }
        Err(MediaError::NeedMoreData)
    }

    fn flush(&mut self) {
        self.pending.clear();
        self.flushing = false;
    }
}
