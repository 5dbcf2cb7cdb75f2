//! Progress bar utilities for corpus processing and model fitting.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a progress bar for processing recordings.
pub fn create_recording_progress(total_recordings: usize, enabled: bool) -> Option<ProgressBar> {
    if !enabled || total_recordings == 0 {
        return None;
    }

    let pb = ProgressBar::new(total_recordings as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} recordings ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    Some(pb)
}

/// Create a progress bar for the cross-validation fits of one task and family.
pub fn create_fit_progress(total_fits: usize, label: &str, enabled: bool) -> Option<ProgressBar> {
    if !enabled || total_fits == 0 {
        return None;
    }

    let pb = ProgressBar::new(total_fits as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} fits - {label}"
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Finish a progress bar with a message.
pub fn finish_progress(pb: Option<ProgressBar>, message: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(message.to_string());
    }
}

/// Increment a progress bar.
pub fn inc_progress(pb: Option<&ProgressBar>) {
    if let Some(pb) = pb {
        pb.inc(1);
    }
}
