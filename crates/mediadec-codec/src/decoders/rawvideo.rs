//! RAW 视频解码器.
//!
//! 不做解压缩, 仅按像素格式把数据包拆分为各个平面.

use log::debug;
use mediadec_core::{MediaError, MediaResult, PixelFormat};

use crate::codec_id::CodecId;
use crate::codec_parameters::{CodecParameters, CodecParamsType};
use crate::decoder::Decoder;
use crate::frame::{Frame, VideoFrame};
use crate::packet::Packet;

/// 单个平面的布局
#[derive(Debug, Clone, Copy)]
struct PlaneLayout {
    linesize: usize,
    rows: usize,
}

/// RAW 视频解码器
pub struct RawVideoDecoder {
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    /// 每帧总字节数
    frame_size: usize,
    planes: Vec<PlaneLayout>,
    output_frame: Option<Frame>,
    opened: bool,
    flushing: bool,
}

impl RawVideoDecoder {
    pub fn create() -> MediaResult<Box<dyn Decoder>> {
        Ok(Box::new(Self {
            width: 0,
            height: 0,
            pixel_format: PixelFormat::None,
            frame_size: 0,
            planes: Vec::new(),
            output_frame: None,
            opened: false,
            flushing: false,
        }))
    }
}

impl Decoder for RawVideoDecoder {
    fn codec_id(&self) -> CodecId {
        CodecId::RawVideo
    }

    fn name(&self) -> &str {
        "rawvideo"
    }

    fn open(&mut self, params: &CodecParameters) -> MediaResult<()> {
        let CodecParamsType::Video(video) = &params.params else {
            return Err(MediaError::InvalidArgument(
                "rawvideo 解码器需要视频参数".into(),
            ));
        };
        if video.width == 0 || video.height == 0 {
            return Err(MediaError::InvalidArgument("宽度和高度不能为 0".into()));
        }

        let pf = video.pixel_format;
        let frame_size = pf
            .frame_size(video.width, video.height)
            .ok_or_else(|| MediaError::Unsupported(format!("无法计算 {pf} 的帧大小")))?;
        let planes = (0..pf.plane_count() as usize)
            .map(|i| {
                let linesize = pf.plane_linesize(i, video.width);
                let rows = pf.plane_height(i, video.height);
                linesize
                    .zip(rows)
                    .map(|(linesize, rows)| PlaneLayout { linesize, rows })
                    .ok_or_else(|| MediaError::Unsupported(format!("无法计算 {pf} 平面 {i}")))
            })
            .collect::<MediaResult<Vec<_>>>()?;

        self.width = video.width;
        self.height = video.height;
        self.pixel_format = pf;
        self.frame_size = frame_size;
        self.planes = planes;
        self.output_frame = None;
        self.opened = true;
        self.flushing = false;

        debug!(
            "打开 rawvideo 解码器: {}x{}, 格式={}, 帧大小={}",
            self.width, self.height, self.pixel_format, self.frame_size,
        );
        Ok(())
    }

    fn send_packet(&mut self, packet: &Packet) -> MediaResult<()> {
        if !self.opened {
            return Err(MediaError::Codec("解码器未打开, 请先调用 open()".into()));
        }
        if self.output_frame.is_some() {
            return Err(MediaError::NeedMoreData);
        }
        if packet.is_empty() {
            self.flushing = true;
            return Ok(());
        }
        if packet.data.len() != self.frame_size {
            return Err(MediaError::InvalidData(format!(
                "数据大小 {} 与预期帧大小 {} 不匹配",
                packet.data.len(),
                self.frame_size,
            )));
        }

        let mut frame = VideoFrame::new(self.width, self.height, self.pixel_format);
        frame.pts = packet.pts;
        frame.time_base = packet.time_base;
        frame.duration = packet.duration;
        frame.is_keyframe = true;

        let mut offset = 0usize;
        for (i, plane) in self.planes.iter().enumerate() {
            let plane_size = plane.linesize * plane.rows;
            frame.data[i] = packet.data[offset..offset + plane_size].to_vec();
            frame.linesize[i] = plane.linesize;
            offset += plane_size;
        }

        self.output_frame = Some(Frame::Video(frame));
        Ok(())
    }

    fn receive_frame(&mut self) -> MediaResult<Frame> {
        if let Some(frame) = self.output_frame.take() {
            return Ok(frame);
        }
        if self.flushing {
            return Err(MediaError::Eof);
        }
        Err(MediaError::NeedMoreData)
    }

    fn flush(&mut self) {
        self.output_frame = None;
        self.flushing = false;
    }
}
