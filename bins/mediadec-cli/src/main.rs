//! mediadec - 拉取式媒体解码命令行工具
//!
//! 打开媒体文件, 按 [`mediadec::DecoderContext`] 的拉取接口逐帧解码,
//! 用于探测, 导出转换后的原始帧, 模拟播放循环与定位.

mod commands;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::error;
use mediadec::{DecoderContext, DecoderOptions, DefaultEngine};

#[derive(Parser, Debug)]
#[command(name = "mediadec", version, about = "拉取式媒体解码工具")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON 格式的解码配置文件
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 显示播放, 视频与音频信息
    Probe {
        input: String,

        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },

    /// 逐帧解码并写出转换后的原始数据
    Decode {
        input: String,

        /// 视频帧输出文件
        #[arg(long)]
        video_out: Option<PathBuf>,

        /// 音频采样输出文件
        #[arg(long)]
        audio_out: Option<PathBuf>,

        /// 最多解码的帧数
        #[arg(long)]
        max_frames: Option<u64>,
    },

    /// 用模拟时钟驱动播放
    Play {
        input: String,

        /// 模拟的播放时长 (秒)
        #[arg(long)]
        seconds: f64,

        /// 时钟刷新率
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
    },

    /// 定位到指定时间
    Seek {
        input: String,

        /// 目标时间 (秒)
        time: f64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init("mediadec", cli.verbose) {
        eprintln!("警告: 日志初始化失败: {e:#}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("错误: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = load_options(cli.options.as_deref())?;
    match cli.command {
        Command::Probe { input, json } => {
            let ctx = open(&input, options)?;
            commands::probe(&input, &ctx, json)
        }
        Command::Decode {
            input,
            video_out,
            audio_out,
            max_frames,
        } => {
            let mut ctx = open(&input, options)?;
            commands::decode(
                &mut ctx,
                video_out.as_deref(),
                audio_out.as_deref(),
                max_frames,
            )
        }
        Command::Play {
            input,
            seconds,
            fps,
        } => {
            let mut ctx = open(&input, options)?;
            commands::play(&mut ctx, seconds, fps)
        }
        Command::Seek { input, time } => {
            let mut ctx = open(&input, options)?;
            commands::seek(&mut ctx, time)
        }
    }
}

fn load_options(path: Option<&Path>) -> Result<DecoderOptions> {
    let Some(path) = path else {
        return Ok(DecoderOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取配置文件 {}", path.display()))?;
    let options: DecoderOptions = serde_json::from_str(&text)
        .with_context(|| format!("配置文件格式错误 {}", path.display()))?;
    options.validate().context("配置无效")?;
    Ok(options)
}

fn open(input: &str, options: DecoderOptions) -> Result<DecoderContext> {
    DecoderContext::open_with(input, Box::new(DefaultEngine::new()), options)
        .with_context(|| format!("无法打开 {input}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["mediadec", "-vv", "play", "clip.y4m", "--seconds", "2.5"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Play { seconds, fps, .. } => {
                assert_eq!(seconds, 2.5);
                assert_eq!(fps, 60.0);
            }
            other => panic!("意外的子命令: {other:?}"),
        }

        let cli = Cli::parse_from(["mediadec", "seek", "a.wav", "1.5", "--options", "o.json"]);
        assert_eq!(cli.options, Some(PathBuf::from("o.json")));
        assert!(matches!(cli.command, Command::Seek { time, .. } if time == 1.5));
    }

    #[test]
    fn test_load_options() {
        assert_eq!(load_options(None).unwrap(), DecoderOptions::default());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "audio": {{ "sample_rate": 48000 }} }}"#).unwrap();
        let options = load_options(Some(file.path())).unwrap();
        assert_eq!(options.audio.sample_rate, Some(48000));

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, r#"{{ "resync_frames": "two" }}"#).unwrap();
        assert!(load_options(Some(bad.path())).is_err());
    }
}
