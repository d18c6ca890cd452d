//! 解码器注册表, 按 [`CodecId`] 查找并实例化解码器.

use std::collections::HashMap;

use mediadec_core::{MediaError, MediaResult};

use crate::codec_id::CodecId;
use crate::decoder::Decoder;

/// 解码器工厂函数类型
pub type DecoderFactory = fn() -> MediaResult<Box<dyn Decoder>>;

/// 解码器注册条目
struct DecoderEntry {
    /// 解码器名称
    name: String,
    /// 工厂函数
    factory: DecoderFactory,
}

/// 解码器注册表
///
/// 同一 CodecId 可以注册多个实现, 先注册的优先.
pub struct CodecRegistry {
    decoders: HashMap<CodecId, Vec<DecoderEntry>>,
}

impl CodecRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// 注册一个解码器
    pub fn register_decoder(
        &mut self,
        codec_id: CodecId,
        name: impl Into<String>,
        factory: DecoderFactory,
    ) {
        self.decoders
            .entry(codec_id)
            .or_default()
            .push(DecoderEntry {
                name: name.into(),
                factory,
            });
    }

    /// 创建指定 CodecId 的解码器实例
    pub fn create_decoder(&self, codec_id: CodecId) -> MediaResult<Box<dyn Decoder>> {
        let entry = self
            .decoders
            .get(&codec_id)
            .and_then(|entries| entries.first())
            .ok_or_else(|| MediaError::CodecNotFound(format!("未找到 {codec_id} 的解码器")))?;
        (entry.factory)()
    }

    /// 获取所有已注册的解码器名称
    pub fn list_decoders(&self) -> Vec<(CodecId, &str)> {
        let mut result: Vec<(CodecId, &str)> = self
            .decoders
            .iter()
            .flat_map(|(id, entries)| entries.iter().map(move |e| (*id, e.name.as_str())))
            .collect();
        result.sort_by_key(|(_, name)| *name);
        result
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all_decoders() {
        let mut registry = CodecRegistry::new();
        crate::register_all(&mut registry);
        // rawvideo + 6 种 PCM
        assert_eq!(registry.list_decoders().len(), 7);
    }

    #[test]
    fn test_create_decoder_by_codec_id() {
        let mut registry = CodecRegistry::new();
        crate::register_all(&mut registry);
        for id in [
            CodecId::RawVideo,
            CodecId::PcmU8,
            CodecId::PcmS16le,
            CodecId::PcmS16be,
            CodecId::PcmS24le,
            CodecId::PcmS32le,
            CodecId::PcmF32le,
        ] {
            let dec = registry.create_decoder(id);
            assert!(dec.is_ok(), "创建 {id} 解码器失败");
            assert_eq!(dec.unwrap().codec_id(), id);
        }
    }

    #[test]
    fn test_unregistered_codec_is_error() {
        let registry = CodecRegistry::new();
        assert!(matches!(
            registry.create_decoder(CodecId::Text),
            Err(MediaError::CodecNotFound(_))
        ));
    }
}
