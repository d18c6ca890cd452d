//! 统一错误类型定义.
//!
//! 所有 mediadec crate 共用同一个错误类型, 可以在引擎、转换缓存与解码上下文之间
//! 直接用 `?` 传播. C 风格接口通过 [`MediaError::status_code`] 把错误折算为状态码.

use thiserror::Error;

/// mediadec 统一错误类型
#[derive(Debug, Error)]
pub enum MediaError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作或格式
    #[error("不支持: {0}")]
    Unsupported(String),

    /// 编解码器错误
    #[error("编解码器错误: {0}")]
    Codec(String),

    /// 容器格式错误
    #[error("格式错误: {0}")]
    Format(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据不足, 需要更多输入
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 内存分配失败
    #[error("内存分配失败: {0}")]
    OutOfMemory(String),

    /// 未找到指定的编解码器
    #[error("未找到编解码器: {0}")]
    CodecNotFound(String),

    /// 未找到指定的容器格式
    #[error("未找到容器格式: {0}")]
    FormatNotFound(String),

    /// 未找到指定的流
    #[error("未找到流: 索引 {0}")]
    StreamNotFound(usize),

    /// 无效数据 (损坏的码流等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 当前状态下不允许该操作
    #[error("状态错误: {0}")]
    InvalidState(String),

    /// 定位失败
    #[error("定位失败: {0}")]
    Seek(String),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

impl MediaError {
    /// 流末尾状态码 (正数, 不是错误)
    pub const STATUS_EOF: i32 = 1;

    /// 折算为 C 风格状态码
    ///
    /// `Eof` 返回 [`Self::STATUS_EOF`], 其余变体各自对应一个互不相同的负数.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::Eof => Self::STATUS_EOF,
            Self::InvalidArgument(_) => -1,
            Self::Unsupported(_) => -2,
            Self::Codec(_) => -3,
            Self::Format(_) => -4,
            Self::Io(_) => -5,
            Self::NeedMoreData => -6,
            Self::OutOfMemory(_) => -7,
            Self::CodecNotFound(_) => -8,
            Self::FormatNotFound(_) => -9,
            Self::StreamNotFound(_) => -10,
            Self::InvalidData(_) => -11,
            Self::InvalidState(_) => -12,
            Self::Seek(_) => -13,
            Self::Internal(_) => -14,
        }
    }

    /// 是否为流末尾
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }
}

/// mediadec 统一 Result 类型
pub type MediaResult<T> = Result<T, MediaError>;
