//! 压缩数据包 (Packet).

use bytes::Bytes;
use mediadec_core::{NOPTS_VALUE, Rational};

/// 压缩数据包
///
/// 从容器中读取的一段压缩数据, 需要送入所属流的解码器.
#[derive(Debug, Clone)]
pub struct Packet {
    /// 压缩数据
    pub data: Bytes,
    /// 显示时间戳 (PTS)
    pub pts: i64,
    /// 解码时间戳 (DTS)
    pub dts: i64,
    /// 数据包时长 (以 time_base 为单位)
    pub duration: i64,
    /// 时间基
    pub time_base: Rational,
    /// 所属流的索引
    pub stream_index: usize,
    /// 是否为关键帧
    pub is_keyframe: bool,
    /// 在容器中的字节偏移量 (-1 表示未知)
    pub pos: i64,
}

impl Packet {
    /// 创建空数据包 (flush packet)
    pub fn empty() -> Self {
        Self {
            data: Bytes::new(),
            pts: NOPTS_VALUE,
            dts: NOPTS_VALUE,
            duration: 0,
            time_base: Rational::UNDEFINED,
            stream_index: 0,
            is_keyframe: false,
            pos: -1,
        }
    }

    /// 从数据创建数据包
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::empty()
        }
    }

    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否为空包
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
