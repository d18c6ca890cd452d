//! 视频帧后处理: 像素格式/尺寸转换到视频输出缓冲区.

use log::debug;
use mediadec_codec::VideoFrame;
use mediadec_core::{MediaError, MediaResult, PixelFormat};
use mediadec_scale::{ScaleAlgorithm, ScaleParams, Scaler};

use crate::buffer::FrameBuffer;
use crate::convert::PixelConversionCache;
use crate::options::VideoOutputOptions;

/// 视频输出状态
pub(crate) struct VideoOutput {
    /// 最近一帧的源尺寸
    pub original_width: u32,
    pub original_height: u32,
    /// 输出尺寸, 未设置时固定为第一帧的源尺寸
    pub decoded_width: Option<u32>,
    pub decoded_height: Option<u32>,
    pub pixel_format: PixelFormat,
    pub algorithm: ScaleAlgorithm,
    pub cache: PixelConversionCache,
    pub buffer: FrameBuffer,
}

impl VideoOutput {
    pub fn new(scaler: Box<dyn Scaler>, options: &VideoOutputOptions) -> Self {
        Self {
            original_width: 0,
            original_height: 0,
            decoded_width: options.width,
            decoded_height: options.height,
            pixel_format: options.pixel_format,
            algorithm: options.algorithm,
            cache: PixelConversionCache::new(scaler),
            buffer: FrameBuffer::new(),
        }
    }

    /// 一帧输出的字节数, 尺寸未知时为 0
    pub fn bytes_per_frame(&self) -> usize {
        let width = self.decoded_width.unwrap_or(self.original_width);
        let height = self.decoded_height.unwrap_or(self.original_height);
        if width == 0 || height == 0 {
            return 0;
        }
        self.pixel_format.frame_size(width, height).unwrap_or(0)
    }

    /// 把一帧转换到输出缓冲区
    ///
    /// 出错时已有的输出尺寸与缓冲区保持不变.
    pub fn process(&mut self, frame: &VideoFrame) -> MediaResult<()> {
        let dst_width = self.decoded_width.unwrap_or(frame.width);
        let dst_height = self.decoded_height.unwrap_or(frame.height);
        let bpp = self.pixel_format.bytes_per_pixel().ok_or_else(|| {
            MediaError::Unsupported(format!("输出像素格式没有固定像素大小: {}", self.pixel_format))
        })?;
        let dst_linesize = (bpp as usize)
            .checked_mul(dst_width as usize)
            .ok_or_else(|| MediaError::InvalidArgument(format!("输出宽度过大: {dst_width}")))?;
        let bytes = self
            .pixel_format
            .frame_size(dst_width, dst_height)
            .ok_or_else(|| {
                MediaError::InvalidArgument(format!("输出尺寸过大: {dst_width}x{dst_height}"))
            })?;
        if self.buffer.is_allocated() && self.buffer.len() != bytes {
            return Err(MediaError::InvalidState(format!(
                "视频输出缓冲区已固定为 {} 字节, 无法容纳 {bytes} 字节",
                self.buffer.len()
            )));
        }

        let params = ScaleParams {
            src_width: frame.width,
            src_height: frame.height,
            src_format: frame.pixel_format,
            dst_width,
            dst_height,
            dst_format: self.pixel_format,
            algorithm: self.algorithm,
        };
        self.cache.set_parameters(&params)?;

        if !self.buffer.is_allocated() {
            self.buffer.grow_to(bytes)?;
            debug!(
                "分配视频输出缓冲区: {dst_width}x{dst_height} {}, {bytes} 字节",
                self.pixel_format
            );
        }
        self.decoded_width = Some(dst_width);
        self.decoded_height = Some(dst_height);

        let planes: Vec<&[u8]> = frame.data.iter().map(Vec::as_slice).collect();
        self.cache.convert(
            &planes,
            &frame.linesize,
            self.buffer.as_mut_slice(),
            dst_linesize,
        )
    }

    /// 更改输出配置, 只能在缓冲区分配之前进行
    pub fn configure(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
        pixel_format: PixelFormat,
    ) -> MediaResult<()> {
        if self.buffer.is_allocated() {
            return Err(MediaError::InvalidState(
                "视频输出缓冲区已分配, 不能再修改输出格式".into(),
            ));
        }
        crate::options::validate_video_output(width, height, pixel_format)?;
        self.decoded_width = width;
        self.decoded_height = height;
        self.pixel_format = pixel_format;
        Ok(())
    }

    pub fn release(&mut self) {
        self.cache.release();
        self.buffer.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadec_scale::SoftwareScaler;

    fn gray_frame(width: u32, height: u32, value: u8) -> VideoFrame {
        let mut frame = VideoFrame::new(width, height, PixelFormat::Gray8);
        frame.data[0] = vec![value; (width * height) as usize];
        frame.linesize[0] = width as usize;
        frame
    }

    fn output(options: VideoOutputOptions) -> VideoOutput {
        VideoOutput::new(Box::new(SoftwareScaler), &options)
    }

    #[test]
    fn test_pins_first_frame_size() {
        let mut out = output(VideoOutputOptions::default());
        assert_eq!(out.bytes_per_frame(), 0);
        out.process(&gray_frame(4, 2, 9)).unwrap();
        assert_eq!((out.decoded_width, out.decoded_height), (Some(4), Some(2)));
        assert_eq!(out.buffer.len(), 4 * 2 * 4);
        assert_eq!(&out.buffer.as_slice().unwrap()[..4], &[9, 9, 9, 255]);

        // 之后尺寸变化的帧缩放到固定的输出尺寸
        out.process(&gray_frame(8, 4, 20)).unwrap();
        assert_eq!(out.buffer.len(), 32);
        assert_eq!(out.cache.builds(), 2);
        assert_eq!(out.cache.releases(), 1);
    }

    #[test]
    fn test_requested_size_and_format() {
        let mut out = output(VideoOutputOptions {
            width: Some(2),
            height: Some(2),
            pixel_format: PixelFormat::Rgb24,
            ..Default::default()
        });
        out.process(&gray_frame(4, 4, 50)).unwrap();
        assert_eq!(out.buffer.as_slice().unwrap(), &[50; 12]);
        assert_eq!(out.bytes_per_frame(), 12);
    }

    #[test]
    fn test_unsupported_format_leaves_state() {
        let mut out = output(VideoOutputOptions::default());
        out.pixel_format = PixelFormat::Yuv420p;
        assert!(matches!(
            out.process(&gray_frame(2, 2, 0)),
            Err(MediaError::Unsupported(_))
        ));
        assert!(!out.buffer.is_allocated());
        assert_eq!(out.decoded_width, None);
        assert_eq!(out.cache.builds(), 0);
    }

    #[test]
    fn test_configure_after_allocation_fails() {
        let mut out = output(VideoOutputOptions::default());
        out.configure(Some(2), Some(2), PixelFormat::Gray8).unwrap();
        out.process(&gray_frame(2, 2, 1)).unwrap();
        assert!(matches!(
            out.configure(None, None, PixelFormat::Rgba),
            Err(MediaError::InvalidState(_))
        ));
        out.release();
        assert!(!out.buffer.is_allocated());
    }
}
