use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{AccelCategory, AccelConfig, BurnConfig};
use crate::encode::{self, runner};
use crate::encoding;
use crate::error::EngineError;
use crate::fonts::{self, FontAsset, ResolvedFont};
use crate::matcher::{self, SubtitleMatch};
use crate::probe;
use crate::scan::{self, LanguageGroup, VideoAsset};
use crate::state::{JobState, JobTracker, RunOutcome};

/// Single-instance control surface over the batch pipeline. At most one run
/// is in flight; front ends poll `status()` for progress and logs.
pub struct Engine {
    tracker: Arc<JobTracker>,
    fonts_dir: PathBuf,
}

impl Engine {
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Self {
        Self {
            tracker: Arc::new(JobTracker::new()),
            fonts_dir: fonts_dir.into(),
        }
    }

    /// Validate roots, discover the work, and launch the background run.
    /// Returns as soon as the run task is spawned.
    pub fn start(&self, config: BurnConfig) -> Result<(), EngineError> {
        if self.tracker.is_running() {
            return Err(EngineError::AlreadyRunning);
        }

        if !config.video_root.is_dir() {
            return Err(EngineError::Configuration(format!(
                "video root does not exist: {}",
                config.video_root.display()
            )));
        }
        if !config.subtitle_root.is_dir() {
            return Err(EngineError::Configuration(format!(
                "subtitle root does not exist: {}",
                config.subtitle_root.display()
            )));
        }

        let videos = scan::discover_videos(&config.video_root);
        if videos.is_empty() {
            let message = format!(
                "no video files found in {}",
                config.video_root.display()
            );
            self.tracker.record_error(&message);
            return Err(EngineError::DiscoveryEmpty(message));
        }

        let groups = scan::discover_languages(&config.subtitle_root);
        if groups.is_empty() {
            let message = format!(
                "no language directories with subtitles found in {}",
                config.subtitle_root.display()
            );
            self.tracker.record_error(&message);
            return Err(EngineError::DiscoveryEmpty(message));
        }

        let total = videos.len() * groups.len();
        self.tracker.reset(total);
        self.tracker.log(format!(
            "Starting batch: {} videos x {} languages = {} tasks",
            videos.len(),
            groups.len(),
            total
        ));
        log_style_summary(&self.tracker, &config);
        info!(
            "Batch run started: {} videos, {} languages",
            videos.len(),
            groups.len()
        );

        let tracker = self.tracker.clone();
        tokio::spawn(async move {
            let inner = tokio::spawn(run_batch(tracker.clone(), config, videos, groups));
            if let Err(e) = inner.await {
                // The loop panicked; the run must still reach a terminal
                // state with is_running cleared.
                error!("Batch task aborted: {}", e);
                tracker.log(format!("Batch aborted unexpectedly: {}", e));
                tracker.finish(RunOutcome::Failed(format!("batch task aborted: {}", e)));
            }
        });

        Ok(())
    }

    /// Raise the stop flag and terminate any in-flight ffmpeg child. The run
    /// task observes the flag and winds down.
    pub async fn request_stop(&self) -> Result<(), EngineError> {
        if !self.tracker.is_running() {
            return Err(EngineError::NotRunning);
        }

        self.tracker.request_stop();
        self.tracker.log("Stop requested, terminating current task".to_string());
        info!("Stop requested");
        runner::terminate(self.tracker.process_slot()).await;
        Ok(())
    }

    pub fn status(&self) -> JobState {
        self.tracker.snapshot()
    }

    pub fn list_font_assets(&self) -> Vec<FontAsset> {
        fonts::list_font_assets(&self.fonts_dir)
    }

    pub fn recommend_font(&self, language_code: &str) -> Vec<String> {
        fonts::recommend(language_code)
    }
}

fn log_style_summary(tracker: &JobTracker, config: &BurnConfig) {
    let style = &config.style;
    let mut parts = Vec::new();
    if let Some(size) = style.font_size {
        parts.push(format!("size {}", size));
    }
    if let Some(margin) = style.margin_v {
        parts.push(format!("margin {}", margin));
    }
    if let Some(alignment) = style.alignment {
        parts.push(format!("alignment {}", alignment));
    }
    if let Some(font) = &style.font {
        parts.push(format!("font {}", font));
    } else if style.auto_font {
        parts.push("auto font".to_string());
    }
    if !parts.is_empty() {
        tracker.log(format!("Subtitle style: {}", parts.join(", ")));
    }
    if config.accel.enabled {
        tracker.log(format!(
            "Hardware acceleration enabled ({:?})",
            config.accel.category
        ));
    }
}

async fn run_batch(
    tracker: Arc<JobTracker>,
    config: BurnConfig,
    videos: Vec<VideoAsset>,
    groups: Vec<LanguageGroup>,
) {
    // Resolve Auto once for the whole run; per-task probing would be waste.
    let category = if config.accel.enabled {
        probe::resolve_category(config.accel.category)
    } else {
        AccelCategory::Cpu
    };
    let accel = AccelConfig {
        enabled: config.accel.enabled,
        category,
        quality: config.accel.quality,
    };

    'languages: for group in &groups {
        if tracker.stop_requested() {
            break;
        }

        tracker.log(format!("Processing language: {}", group.code));

        let resolved_font = if config.style.auto_font && config.style.font.is_none() {
            let resolved = fonts::resolve_available(&group.code, &config.fonts_dir);
            match &resolved {
                ResolvedFont::File(path) => tracker.log(format!(
                    "Font for {}: {} (file)",
                    group.code,
                    path.display()
                )),
                ResolvedFont::Name(name) => {
                    tracker.log(format!("Font for {}: {}", group.code, name))
                }
            }
            Some(resolved)
        } else {
            None
        };

        for video in &videos {
            if tracker.stop_requested() {
                break 'languages;
            }

            let task_label = format!("{} [{}]", video.base, group.code);
            tracker.set_current(Some(task_label.clone()));

            run_task(
                &tracker,
                &config,
                &accel,
                video,
                group,
                resolved_font.as_ref(),
                &task_label,
            )
            .await;

            tracker.advance();
            let (completed, total) = tracker.progress();
            tracker.log(format!(
                "Progress: {}/{} ({}%)",
                completed,
                total,
                completed * 100 / total.max(1)
            ));
        }
    }

    if tracker.stop_requested() {
        tracker.log("Batch stopped".to_string());
        tracker.finish(RunOutcome::Stopped);
    } else {
        tracker.log("Batch complete".to_string());
        tracker.finish(RunOutcome::Completed);
    }
}

async fn run_task(
    tracker: &JobTracker,
    config: &BurnConfig,
    accel: &AccelConfig,
    video: &VideoAsset,
    group: &LanguageGroup,
    resolved_font: Option<&ResolvedFont>,
    task_label: &str,
) {
    // Step 1: resolve the subtitle file for this pair
    let subtitle_path = match matcher::match_subtitle(video, group) {
        SubtitleMatch::Matched(path) => path,
        SubtitleMatch::Unmatched(_) => {
            tracker.log(format!(
                "No subtitle for {} in {}, skipping",
                video.base, group.code
            ));
            return;
        }
    };

    // Step 2: normalize subtitle encoding, best effort
    match encoding::normalize_to_utf8(&subtitle_path, Some(&group.code)) {
        Ok(source) if source != "utf-8" => {
            tracker.log(format!(
                "Converted {} from {} to UTF-8",
                subtitle_path.display(),
                source
            ));
        }
        Ok(_) => {}
        Err(e) => {
            // Proceed with the original bytes; ffmpeg may still cope.
            warn!("Encoding repair failed for {}: {}", subtitle_path.display(), e);
            tracker.log(format!(
                "Encoding repair failed for {}: {}",
                subtitle_path.display(),
                e
            ));
        }
    }

    // Step 3: build the output path and ensure its directory exists
    let output_path = config
        .output_root
        .join(&group.code)
        .join(format!("{}_{}{}", video.base, group.code, video.ext));

    if let Some(parent) = output_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracker.log(format!(
                "Failed to create output directory {}: {}",
                parent.display(),
                e
            ));
            return;
        }
    }

    // Step 4: build and run the ffmpeg command
    let args = encode::build_command(
        &video.path,
        &subtitle_path,
        &output_path,
        &config.style,
        accel,
        resolved_font,
    );

    tracker.log(format!("Burning {}", task_label));
    match runner::run_encode(&args, tracker.process_slot()).await {
        Ok(outcome) if outcome.status.success() => {
            tracker.log(format!("Done: {}", output_path.display()));
        }
        Ok(outcome) => {
            if tracker.stop_requested() {
                tracker.log(format!("Terminated: {}", task_label));
            } else {
                tracker.log(format!(
                    "ffmpeg failed for {} ({})",
                    task_label, outcome.status
                ));
                if !outcome.stderr_tail.is_empty() {
                    tracker.log(outcome.stderr_tail);
                }
            }
        }
        Err(e) => {
            tracker.log(format!("Failed to launch ffmpeg for {}: {}", task_label, e));
        }
    }
}
