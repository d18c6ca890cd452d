//! YUV4MPEG2 (Y4M) 解封装器.
//!
//! ```text
//! YUV4MPEG2 W<宽> H<高> F<帧率分子>:<分母> C<色彩空间> ...\n
//! FRAME[参数]\n <一帧原始平面数据>
//! FRAME[参数]\n ...
//! ```
//!
//! 每帧大小固定, 因此可以按帧号直接定位. 时间基为帧率的倒数, pts 即帧号.

use log::{debug, warn};
use mediadec_codec::{CodecId, Packet};
use mediadec_core::{MediaError, MediaResult, MediaType, PixelFormat, Rational};

use crate::demuxer::{Demuxer, SeekFlags};
use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::probe::{FormatProbe, ProbeScore, SCORE_EXTENSION, SCORE_MAX, extension_matches};
use crate::stream::{Stream, StreamParams, VideoStreamParams};

const MAGIC: &[u8] = b"YUV4MPEG2";
const FRAME_TAG: &[u8] = b"FRAME";
const MAX_HEADER_LEN: usize = 1024;

/// Y4M 流头部
#[derive(Debug, Clone, PartialEq)]
struct Y4mHeader {
    width: u32,
    height: u32,
    frame_rate: Rational,
    pixel_format: PixelFormat,
}

impl Y4mHeader {
    fn parse(line: &[u8]) -> MediaResult<Self> {
        let text = std::str::from_utf8(line)
            .map_err(|_| MediaError::InvalidData("Y4M 头部不是 ASCII".into()))?;
        let mut tokens = text.split_ascii_whitespace();
        if tokens.next().map(str::as_bytes) != Some(MAGIC) {
            return Err(MediaError::InvalidData("缺少 YUV4MPEG2 标识".into()));
        }

        let mut width = 0u32;
        let mut height = 0u32;
        let mut frame_rate = Rational::new(25, 1);
        let mut colorspace = "420jpeg";
        let mut full_range = false;
        for token in tokens {
            let Some((key, value)) = token.split_at_checked(1) else {
                continue;
            };
            match key {
                "W" => width = parse_num(value, "宽度")?,
                "H" => height = parse_num(value, "高度")?,
                "F" => {
                    let (num, den) = value
                        .split_once(':')
                        .ok_or_else(|| MediaError::InvalidData(format!("无效帧率: {value}")))?;
                    frame_rate = Rational::new(parse_num(num, "帧率")?, parse_num(den, "帧率")?);
                }
                "C" => colorspace = value,
                "X" => full_range |= value.eq_ignore_ascii_case("COLORRANGE=FULL"),
                // 隔行, 宽高比等参数不影响解码
                _ => {}
            }
        }
        if width == 0 || height == 0 {
            return Err(MediaError::InvalidData("Y4M 头部缺少宽高".into()));
        }
        if frame_rate.num <= 0 || frame_rate.den <= 0 {
            warn!("Y4M 帧率 {frame_rate} 无效, 使用 25/1");
            frame_rate = Rational::new(25, 1);
        }

        let pixel_format = match (colorspace, full_range) {
            ("420" | "420jpeg" | "420paldv" | "420mpeg2", false) => PixelFormat::Yuv420p,
            ("420" | "420jpeg" | "420paldv" | "420mpeg2", true) => PixelFormat::Yuvj420p,
            ("422", false) => PixelFormat::Yuv422p,
            ("422", true) => PixelFormat::Yuvj422p,
            ("444", false) => PixelFormat::Yuv444p,
            ("444", true) => PixelFormat::Yuvj444p,
            ("mono", _) => PixelFormat::Gray8,
            (other, _) => {
                return Err(MediaError::Unsupported(format!("不支持的 Y4M 色彩空间: {other}")));
            }
        };
        Ok(Self {
            width,
            height,
            frame_rate,
            pixel_format,
        })
    }
}

fn parse_num<T: std::str::FromStr>(value: &str, what: &str) -> MediaResult<T> {
    value
        .parse()
        .map_err(|_| MediaError::InvalidData(format!("无效{what}: {value}")))
}

/// Y4M 解封装器
pub struct Y4mDemuxer {
    streams: Vec<Stream>,
    time_base: Rational,
    /// 第一帧 FRAME 标记的文件偏移
    data_offset: u64,
    frame_size: usize,
    /// 单帧记录长度 (FRAME 行 + 数据)
    record_size: u64,
    /// 总帧数, 输入大小未知时为 None
    nb_frames: Option<u64>,
    /// 下一帧的帧号
    next_frame: u64,
}

impl Y4mDemuxer {
    /// 工厂函数
    pub fn create() -> MediaResult<Box<dyn Demuxer>> {
        Ok(Box::new(Self {
            streams: Vec::new(),
            time_base: Rational::UNDEFINED,
            data_offset: 0,
            frame_size: 0,
            record_size: 0,
            nb_frames: None,
            next_frame: 0,
        }))
    }
}

impl Demuxer for Y4mDemuxer {
    fn format_id(&self) -> FormatId {
        FormatId::Y4m
    }

    fn open(&mut self, io: &mut IoContext) -> MediaResult<()> {
        let header = Y4mHeader::parse(&io.read_line(MAX_HEADER_LEN)?)?;
        let frame_size = header
            .pixel_format
            .frame_size(header.width, header.height)
            .ok_or_else(|| MediaError::Unsupported(format!("无法计算 {} 帧大小", header.pixel_format)))?;
        self.data_offset = io.position()?;
        if let Some(size) = io.size() {
            let available = size.saturating_sub(self.data_offset);
            if available < frame_size as u64 {
                return Err(MediaError::InvalidData(format!(
                    "Y4M 数据不足一帧: {}x{} 需要 {frame_size} 字节, 实际 {available} 字节",
                    header.width, header.height
                )));
            }
        }
        self.frame_size = frame_size;

        // 以第一帧的 FRAME 行长度作为固定记录长度
        let frame_line_len = match io.read_line(MAX_HEADER_LEN) {
            Ok(line) => line.len() as u64 + 1,
            Err(MediaError::Eof) => FRAME_TAG.len() as u64 + 1,
            Err(e) => return Err(e),
        };
        io.seek(std::io::SeekFrom::Start(self.data_offset))?;
        self.record_size = frame_line_len + frame_size as u64;
        self.nb_frames = io
            .size()
            .map(|size| size.saturating_sub(self.data_offset) / self.record_size);

        self.time_base = header.frame_rate.invert();
        self.streams = vec![Stream {
            index: 0,
            media_type: MediaType::Video,
            codec_id: CodecId::RawVideo,
            time_base: self.time_base,
            duration: self.nb_frames.map_or(-1, |n| n as i64),
            start_time: 0,
            nb_frames: self.nb_frames.unwrap_or(0),
            params: StreamParams::Video(VideoStreamParams {
                width: header.width,
                height: header.height,
                pixel_format: header.pixel_format,
                frame_rate: header.frame_rate,
            }),
        }];
        self.next_frame = 0;

        debug!(
            "Y4M 打开完成: {}x{} {} @ {}, 帧数={:?}",
            header.width, header.height, header.pixel_format, header.frame_rate, self.nb_frames
        );
        Ok(())
    }

    fn streams(&self) -> &[Stream] {
        &self.streams
    }

    fn read_packet(&mut self, io: &mut IoContext) -> MediaResult<Packet> {
        let pos = io.position()?;
        let line = io.read_line(MAX_HEADER_LEN)?;
        if !line.starts_with(FRAME_TAG) {
            return Err(MediaError::InvalidData(format!(
                "偏移 {pos} 处缺少 FRAME 标记"
            )));
        }
        let data = match io.read_bytes(self.frame_size) {
            Ok(data) => data,
            Err(MediaError::Eof) => {
                warn!("Y4M 最后一帧不完整, 按流末尾处理");
                return Err(MediaError::Eof);
            }
            Err(e) => return Err(e),
        };

        let mut pkt = Packet::from_data(data);
        pkt.stream_index = 0;
        pkt.pts = self.next_frame as i64;
        pkt.dts = pkt.pts;
        pkt.duration = 1;
        pkt.time_base = self.time_base;
        pkt.is_keyframe = true;
        pkt.pos = pos as i64;
        self.next_frame += 1;
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
        let mut frame = timestamp.max(0) as u64;
        if let Some(n) = self.nb_frames {
            frame = frame.min(n);
        }
        io.seek(std::io::SeekFrom::Start(
            self.data_offset + frame * self.record_size,
        ))?;
        self.next_frame = frame;
        debug!("Y4M seek: 帧 {frame}");
        Ok(())
    }

    fn duration(&self) -> Option<f64> {
        self.streams.first().and_then(Stream::duration_seconds)
    }
}

/// Y4M 格式探测器
pub struct Y4mProbe;

impl FormatProbe for Y4mProbe {
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore> {
        if data.starts_with(MAGIC) {
            return Some(SCORE_MAX);
        }
        extension_matches(FormatId::Y4m, filename).then_some(SCORE_EXTENSION)
    }

    fn format_id(&self) -> FormatId {
        FormatId::Y4m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_y4m(header: &str, frames: &[u8], frame_size: usize) -> Vec<u8> {
        let mut buf = format!("{header}\n").into_bytes();
        for &value in frames {
            buf.extend_from_slice(b"FRAME\n");
            buf.extend(std::iter::repeat_n(value, frame_size));
        }
        buf
    }

    fn open(data: Vec<u8>) -> (Box<dyn Demuxer>, IoContext) {
        let mut io = IoContext::from_memory(data);
        let mut demuxer = Y4mDemuxer::create().unwrap();
        demuxer.open(&mut io).unwrap();
        (demuxer, io)
    }

    #[test]
    fn test_header_parse() {
        let header = Y4mHeader::parse(b"YUV4MPEG2 W4 H2 F30000:1001 Ip A1:1 C444").unwrap();
        assert_eq!(header.width, 4);
        assert_eq!(header.height, 2);
        assert_eq!(header.frame_rate, Rational::new(30000, 1001));
        assert_eq!(header.pixel_format, PixelFormat::Yuv444p);
    }

    #[test]
    fn test_header_defaults_and_full_range() {
        let header = Y4mHeader::parse(b"YUV4MPEG2 W2 H2 XCOLORRANGE=FULL").unwrap();
        assert_eq!(header.pixel_format, PixelFormat::Yuvj420p);
        assert_eq!(header.frame_rate, Rational::new(25, 1));
        assert!(Y4mHeader::parse(b"YUV4MPEG2 W2").is_err());
        assert!(Y4mHeader::parse(b"YUV4MPEG2 W2 H2 C411").is_err());
    }

    #[test]
    fn test_frames_and_duration() {
        let (mut demuxer, mut io) = open(build_y4m("YUV4MPEG2 W2 H2 F10:1 C420", &[1, 2, 3], 6));
        let stream = &demuxer.streams()[0];
        assert_eq!(stream.time_base, Rational::new(1, 10));
        assert_eq!(stream.duration, 3);
        assert!((demuxer.duration().unwrap() - 0.3).abs() < 1e-9);

        for expected in 0..3u8 {
            let pkt = demuxer.read_packet(&mut io).unwrap();
            assert_eq!(pkt.pts, i64::from(expected));
            assert_eq!(pkt.data[0], expected + 1);
        }
        assert!(matches!(demuxer.read_packet(&mut io), Err(MediaError::Eof)));
    }

    #[test]
    fn test_seek_by_frame_index() {
        let (mut demuxer, mut io) =
            open(build_y4m("YUV4MPEG2 W2 H2 F10:1 Cmono", &[10, 20, 30, 40], 4));
        demuxer.seek(&mut io, 0, 2, SeekFlags::default()).unwrap();
        let pkt = demuxer.read_packet(&mut io).unwrap();
        assert_eq!(pkt.pts, 2);
        assert_eq!(pkt.data[0], 30);

        // 超出末尾时停在末尾
        demuxer.seek(&mut io, 0, 99, SeekFlags::default()).unwrap();
        assert!(matches!(demuxer.read_packet(&mut io), Err(MediaError::Eof)));
    }

    #[test]
    fn test_rejects_frame_larger_than_input() {
        let mut io = IoContext::from_memory(b"YUV4MPEG2 W60000 H60000 C444\nFRAME\n\0\0".to_vec());
        let mut demuxer = Y4mDemuxer::create().unwrap();
        assert!(matches!(demuxer.open(&mut io), Err(MediaError::InvalidData(_))));
    }
}
