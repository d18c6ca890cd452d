//! 静态图片判定.
//!
//! 打开时: 有视频, 没有音频, 且无法得到时长, 暂定为图片.
//! 读到末尾时: 时长仍为 0 说明只有一帧, 确认为图片, 之后不再读取输入.

use serde::Serialize;

use super::selection::StreamSelection;

/// 图片判定状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageState {
    /// 未知或不是图片
    #[default]
    NotImage,
    /// 暂定为图片
    Provisional,
    /// 已确认只有一帧
    Confirmed,
}

impl ImageState {
    /// 打开时的初步判定
    pub fn detect(selection: &StreamSelection, duration: f64) -> Self {
        if selection.video.is_some() && selection.audio.is_none() && duration <= 0.0 {
            Self::Provisional
        } else {
            Self::NotImage
        }
    }

    pub fn is_image(self) -> bool {
        matches!(self, Self::Provisional | Self::Confirmed)
    }

    /// 与 C 接口一致的数值: 0 未知, 1 暂定, 2 确认
    pub fn as_raw(self) -> i32 {
        match self {
            Self::NotImage => 0,
            Self::Provisional => 1,
            Self::Confirmed => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        let video_only = StreamSelection {
            video: Some(0),
            ..Default::default()
        };
        assert_eq!(ImageState::detect(&video_only, 0.0), ImageState::Provisional);
        assert_eq!(ImageState::detect(&video_only, 2.5), ImageState::NotImage);

        let with_audio = StreamSelection {
            audio: Some(1),
            ..video_only
        };
        assert_eq!(ImageState::detect(&with_audio, 0.0), ImageState::NotImage);
        assert_eq!(
            ImageState::detect(&StreamSelection::default(), 0.0),
            ImageState::NotImage
        );
    }

    #[test]
    fn test_is_image() {
        assert!(!ImageState::NotImage.is_image());
        assert!(ImageState::Provisional.is_image());
        assert!(ImageState::Confirmed.is_image());
        assert_eq!(ImageState::Confirmed.as_raw(), 2);
    }
}
