//! PNM 静态图片解封装器 (P5 灰度 / P6 RGB, 8 位).
//!
//! 整张图片作为唯一一个数据包输出. 容器不记录时长, 流时长为未知,
//! 解码上下文据此把它当作静态图片处理.

use log::debug;
use mediadec_codec::{CodecId, Packet};
use mediadec_core::{MediaError, MediaResult, MediaType, PixelFormat, Rational};

use crate::demuxer::{Demuxer, SeekFlags};
use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::probe::{FormatProbe, ProbeScore, SCORE_EXTENSION, SCORE_MAX, extension_matches};
use crate::stream::{Stream, StreamParams, VideoStreamParams};

/// 头部数字字段的最大位数
const MAX_TOKEN_LEN: usize = 10;

/// PNM 解封装器
pub struct PnmDemuxer {
    streams: Vec<Stream>,
    data_offset: u64,
    frame_size: usize,
    /// 唯一的一帧是否已经读出
    consumed: bool,
}

impl PnmDemuxer {
    /// 工厂函数
    pub fn create() -> MediaResult<Box<dyn Demuxer>> {
        Ok(Box::new(Self {
            streams: Vec::new(),
            data_offset: 0,
            frame_size: 0,
            consumed: false,
        }))
    }
}

/// 读取一个头部数字, 跳过前导空白与 `#` 注释, 吞掉结尾的单个空白字符
fn read_header_number(io: &mut IoContext) -> MediaResult<u32> {
    let mut b = io.read_u8()?;
    loop {
        if b == b'#' {
            while b != b'\n' {
                b = io.read_u8()?;
            }
        } else if !b.is_ascii_whitespace() {
            break;
        }
        b = io.read_u8()?;
    }

    let mut digits = String::new();
    while b.is_ascii_digit() {
        if digits.len() >= MAX_TOKEN_LEN {
            return Err(MediaError::InvalidData("PNM 头部数字过长".into()));
        }
        digits.push(char::from(b));
        b = io.read_u8()?;
    }
    if digits.is_empty() || !b.is_ascii_whitespace() {
        return Err(MediaError::InvalidData("PNM 头部格式错误".into()));
    }
    digits
        .parse()
        .map_err(|_| MediaError::InvalidData(format!("无效 PNM 数字: {digits}")))
}

impl Demuxer for PnmDemuxer {
    fn format_id(&self) -> FormatId {
        FormatId::Pnm
    }

    fn open(&mut self, io: &mut IoContext) -> MediaResult<()> {
        let magic = [io.read_u8()?, io.read_u8()?];
        let pixel_format = match &magic {
            b"P5" => PixelFormat::Gray8,
            b"P6" => PixelFormat::Rgb24,
            _ => return Err(MediaError::InvalidData("不是 P5/P6 PNM 文件".into())),
        };
        let width = read_header_number(io)?;
        let height = read_header_number(io)?;
        let maxval = read_header_number(io)?;
        if width == 0 || height == 0 {
            return Err(MediaError::InvalidData("PNM 宽高为 0".into()));
        }
        if maxval == 0 || maxval > 255 {
            return Err(MediaError::Unsupported(format!("不支持的 PNM maxval: {maxval}")));
        }

        self.frame_size = pixel_format
            .frame_size(width, height)
            .ok_or_else(|| MediaError::InvalidData("PNM 尺寸溢出".into()))?;
        self.data_offset = io.position()?;
        if let Some(size) = io.size() {
            let available = size.saturating_sub(self.data_offset);
            if available < self.frame_size as u64 {
                return Err(MediaError::InvalidData(format!(
                    "PNM 数据不足: {width}x{height} 需要 {} 字节, 实际 {available} 字节",
                    self.frame_size
                )));
            }
        }
        self.consumed = false;
        self.streams = vec![Stream {
            index: 0,
            media_type: MediaType::Video,
            codec_id: CodecId::RawVideo,
            time_base: Rational::new(1, 1),
            duration: -1,
            start_time: 0,
            nb_frames: 1,
            params: StreamParams::Video(VideoStreamParams {
                width,
                height,
                pixel_format,
                frame_rate: Rational::UNDEFINED,
            }),
        }];

        debug!("PNM 打开完成: {width}x{height} {pixel_format}, maxval={maxval}");
        Ok(())
    }

    fn streams(&self) -> &[Stream] {
        &self.streams
    }

    fn read_packet(&mut self, io: &mut IoContext) -> MediaResult<Packet> {
        if self.consumed {
            return Err(MediaError::Eof);
        }
        let data = io.read_bytes(self.frame_size)?;
        self.consumed = true;

        let mut pkt = Packet::from_data(data);
        pkt.stream_index = 0;
        pkt.pts = 0;
        pkt.dts = 0;
        pkt.time_base = Rational::new(1, 1);
        pkt.is_keyframe = true;
        pkt.pos = self.data_offset as i64;
        Ok(pkt)
    }

    fn seek(
        &mut self,
        io: &mut IoContext,
        _stream_index: usize,
        timestamp: i64,
        _flags: SeekFlags,
    ) -> MediaResult<()> {
        // 只有时间戳 0 处有一帧, 其余位置都在图片之后
        if timestamp <= 0 {
            io.seek(std::io::SeekFrom::Start(self.data_offset))?;
            self.consumed = false;
        } else {
            self.consumed = true;
        }
        Ok(())
    }

    fn duration(&self) -> Option<f64> {
        None
    }
}

/// PNM 格式探测器
pub struct PnmProbe;

impl FormatProbe for PnmProbe {
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore> {
        let magic_ok = data.len() >= 3
            && data[0] == b'P'
            && matches!(data[1], b'5' | b'6')
            && data[2].is_ascii_whitespace();
        if magic_ok {
            return Some(SCORE_MAX);
        }
        extension_matches(FormatId::Pnm, filename).then_some(SCORE_EXTENSION)
    }

    fn format_id(&self) -> FormatId {
        FormatId::Pnm
    }
}
