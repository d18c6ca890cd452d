//! 流选择.

use mediadec_core::MediaType;
use mediadec_format::Stream;
use serde::Serialize;

/// 打开时选中的流
///
/// 每种媒体类型最多选中一路, 打开后不再改变.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamSelection {
    pub video: Option<usize>,
    pub audio: Option<usize>,
    pub subtitle: Option<usize>,
}

impl StreamSelection {
    /// 按出现顺序选出第一路视频, 音频与字幕流
    pub fn select(streams: &[Stream]) -> Self {
        let mut selection = Self::default();
        for stream in streams {
            let slot = match stream.media_type {
                MediaType::Video => &mut selection.video,
                MediaType::Audio => &mut selection.audio,
                MediaType::Subtitle => &mut selection.subtitle,
                MediaType::Data => continue,
            };
            if slot.is_none() {
                *slot = Some(stream.index);
            }
        }
        selection
    }

    /// 指定媒体类型选中的流
    pub fn get(&self, media_type: MediaType) -> Option<usize> {
        match media_type {
            MediaType::Video => self.video,
            MediaType::Audio => self.audio,
            MediaType::Subtitle => self.subtitle,
            MediaType::Data => None,
        }
    }

    /// 按视频, 音频, 字幕的顺序返回第一路选中的流
    pub fn first_selected(&self) -> Option<usize> {
        MediaType::SELECTABLE.iter().find_map(|&t| self.get(t))
    }
}
