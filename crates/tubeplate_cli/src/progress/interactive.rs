use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tubeplate::sync::SyncProgress;
use uuid::Uuid;

#[derive(Default)]
struct ProgressState {
    /// Fetch spinners by channel.
    fetch_bars: HashMap<Uuid, ProgressBar>,
    /// Single bar for the description push.
    push_bar: Option<ProgressBar>,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    pub fn handle(&self, event: SyncProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            SyncProgress::ReconcileStarted { channel_id, title } => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.enable_steady_tick(Duration::from_millis(100));
                pb.set_prefix(format!("{:20}", truncate(&title, 20)));
                pb.set_message("Fetching uploads...");
                state.fetch_bars.insert(channel_id, pb);
            }

            SyncProgress::FetchedPage {
                channel_id,
                page,
                total_so_far,
                ..
            } => {
                if let Some(pb) = state.fetch_bars.get(&channel_id) {
                    pb.set_message(format!("Page {} ({} videos)", page, total_so_far));
                }
            }

            SyncProgress::ReconcileComplete {
                channel_id,
                inserted,
                updated,
                deleted,
            } => {
                if let Some(pb) = state.fetch_bars.remove(&channel_id) {
                    pb.finish_with_message(format!(
                        "✓ +{} ~{} -{}",
                        inserted, updated, deleted
                    ));
                }
            }

            SyncProgress::DispatchStarted { pending, .. } => {
                let pb = self.multi.add(ProgressBar::new(pending as u64));
                pb.set_style(Self::bar_style());
                pb.set_prefix(format!("{:20}", "Updating"));
                pb.set_message("Pushing descriptions...");
                state.push_bar = Some(pb);
            }

            SyncProgress::VideoUpdated { .. } => {
                if let Some(pb) = &state.push_bar {
                    pb.inc(1);
                }
            }

            SyncProgress::VideoFailed { video_id, error } => {
                if let Some(pb) = &state.push_bar {
                    pb.inc(1);
                }
                let _ = self.multi.println(format!("  ✗ {}: {}", video_id, error));
            }

            SyncProgress::DispatchComplete {
                updated,
                skipped,
                failed,
            } => {
                if let Some(pb) = state.push_bar.take() {
                    pb.finish_with_message(format!(
                        "✓ {} updated, {} skipped, {} failed",
                        updated, skipped, failed
                    ));
                }
            }

            SyncProgress::Warning { message } => {
                let _ = self.multi.println(format!("  ⚠ {}", message));
            }

            _ => {}
        }
    }

    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for (_, pb) in state.fetch_bars.drain() {
            pb.abandon();
        }
        if let Some(pb) = state.push_bar.take() {
            pb.abandon();
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .expect("Invalid template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .expect("Invalid template")
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
