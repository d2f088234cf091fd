use super::frame_sampler::{MAX_INTERVAL, MIN_INTERVAL, SamplingParams};
use super::pipeline::{ConversionOutcome, PipelineOptions, convert_video};
use crate::config::Config;
use crate::tools::{
    is_supported_video, parent_directory, validate_directory_exists, validate_file_exists,
    with_header_extension,
};
use anyhow::Result;
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rust_i18n::t;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 影片轉 OLED 動畫產生器
///
/// 互動詢問影片、輸出路徑與取樣間隔，執行轉換並以進度條顯示。
pub struct OledAnimationGenerator {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl OledAnimationGenerator {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    pub fn run(&self) -> Result<ConversionOutcome> {
        println!("{}", style(t!("oled.title")).cyan().bold());

        let video_path = self.prompt_video_path()?;
        if !is_supported_video(&video_path) {
            println!(
                "{}",
                style(t!(
                    "oled.unsupported_extension",
                    path = video_path.display()
                ))
                .yellow()
            );
        }

        let output_path = self.prompt_output_path()?;
        let interval = self.prompt_interval()?;

        // 上一次的 Ctrl-C 不影響這次轉換
        self.shutdown_signal.store(false, Ordering::SeqCst);

        let progress_bar = ProgressBar::new(0);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        progress_bar.set_message(t!("oled.converting").to_string());

        let mut on_progress = |index: u64, total: u64, saved: usize| {
            progress_bar.set_length(total.max(index + 1));
            progress_bar.set_position(index + 1);
            progress_bar.set_message(
                t!("oled.progress", index = index, total = total, saved = saved).to_string(),
            );
            info!("處理進度: {index}/{total} 幀 (已保存 {saved} 幀)");
        };

        let options = PipelineOptions {
            sampling: SamplingParams::new(interval),
            decoder: self.config.settings.decoder_paths(),
            progress: Some(&mut on_progress),
            shutdown_signal: Some(self.shutdown_signal.as_ref()),
        };
        let result = convert_video(&video_path, &output_path, options);
        progress_bar.finish_and_clear();

        if let Ok(report) = &result {
            println!(
                "{}",
                style(t!(
                    "oled.summary",
                    stride = report.stride,
                    read = report.frames_read
                ))
                .dim()
            );
        }

        let outcome = ConversionOutcome::from(&result);
        if outcome.success {
            println!("{} {}", style(t!("oled.done")).green().bold(), outcome.message);
        } else {
            println!("{} {}", style(t!("oled.failed")).red().bold(), outcome.message);
        }

        Ok(outcome)
    }

    fn prompt_video_path(&self) -> Result<PathBuf> {
        let path: String = Input::new()
            .with_prompt(t!("oled.prompt_video"))
            .validate_with(|input: &String| -> Result<(), String> {
                validate_file_exists(Path::new(input.trim())).map_err(|e| e.to_string())
            })
            .interact_text()?;
        Ok(PathBuf::from(path.trim()))
    }

    fn prompt_output_path(&self) -> Result<PathBuf> {
        let default_path = self.config.settings.default_output_path.display().to_string();
        let path: String = Input::new()
            .with_prompt(t!("oled.prompt_output"))
            .default(default_path)
            .validate_with(|input: &String| -> Result<(), String> {
                let path = with_header_extension(Path::new(input.trim()));
                validate_directory_exists(parent_directory(&path)).map_err(|e| e.to_string())
            })
            .interact_text()?;
        Ok(with_header_extension(Path::new(path.trim())))
    }

    fn prompt_interval(&self) -> Result<f64> {
        let interval: f64 = Input::new()
            .with_prompt(t!("oled.prompt_interval", min = MIN_INTERVAL, max = MAX_INTERVAL))
            .default(self.config.settings.interval())
            .validate_with(|value: &f64| -> Result<(), String> {
                if (MIN_INTERVAL..=MAX_INTERVAL).contains(value) {
                    Ok(())
                } else {
                    Err(t!("oled.interval_out_of_range", min = MIN_INTERVAL, max = MAX_INTERVAL)
                        .to_string())
                }
            })
            .interact_text()?;
        Ok(interval)
    }
}
