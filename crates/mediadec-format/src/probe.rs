//! 格式探测.
//!
//! 通过文件头部魔数和扩展名识别容器格式.

use crate::format_id::FormatId;

/// 探测置信度, 数值越高越可信
pub type ProbeScore = u32;

/// 仅根据扩展名
pub const SCORE_EXTENSION: ProbeScore = 50;

/// 魔数完全匹配
pub const SCORE_MAX: ProbeScore = 100;

/// 探测结果
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// 识别出的格式
    pub format_id: FormatId,
    /// 置信度
    pub score: ProbeScore,
}

/// 格式探测器 trait
pub trait FormatProbe {
    /// 根据文件头部数据探测格式
    ///
    /// 返回 `None` 表示不是此格式.
    fn probe(&self, data: &[u8], filename: Option<&str>) -> Option<ProbeScore>;

    /// 此探测器对应的格式
    fn format_id(&self) -> FormatId;
}

/// 文件扩展名是否属于该格式
pub fn extension_matches(format_id: FormatId, filename: Option<&str>) -> bool {
    let Some(ext) = filename
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
    else {
        return false;
    };
    format_id
        .extensions()
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_matches_case_insensitive() {
        assert!(extension_matches(FormatId::Wav, Some("/tmp/A.WAV")));
        assert!(extension_matches(FormatId::Pnm, Some("x.ppm")));
        assert!(!extension_matches(FormatId::Y4m, Some("x.wav")));
        assert!(!extension_matches(FormatId::Y4m, None));
    }
}
