//! 解码器 trait 定义.

use mediadec_core::MediaResult;

use crate::codec_id::CodecId;
use crate::codec_parameters::CodecParameters;
use crate::frame::Frame;
use crate::packet::Packet;

/// 解码器 trait
///
/// 解码流程:
/// 1. 调用 `send_packet()` 送入压缩数据
/// 2. 反复调用 `receive_frame()` 取出解码后的帧, 直到返回 `NeedMoreData`
/// 3. 输入耗尽时送入空包 (flush), 继续取帧直到返回 `Eof`
/// 4. 定位 (seek) 之后调用 `flush()` 丢弃内部状态
pub trait Decoder: Send {
    /// 获取解码器标识
    fn codec_id(&self) -> CodecId;

    /// 获取解码器名称
    fn name(&self) -> &str;

    /// 使用参数配置解码器
    fn open(&mut self, _params: &CodecParameters) -> MediaResult<()> {
        Ok(())
    }

    /// 送入一个压缩数据包, 空包表示刷新
    ///
    /// # 返回
    /// - `Ok(())`: 数据包已接受
    /// - `Err(MediaError::NeedMoreData)`: 内部缓冲区已满, 需要先取出帧
    fn send_packet(&mut self, packet: &Packet) -> MediaResult<()>;

    /// 取出一帧解码数据
    ///
    /// # 返回
    /// - `Ok(frame)`: 成功取出一帧
    /// - `Err(MediaError::NeedMoreData)`: 需要送入更多数据包
    /// - `Err(MediaError::Eof)`: 刷新后所有帧已取出
    fn receive_frame(&mut self) -> MediaResult<Frame>;

    /// 清空内部状态 (用于 seek 后)
    fn flush(&mut self);
}
