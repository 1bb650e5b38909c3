//! Common utilities and helpers

use std::time::Duration;

pub mod time;

/// Utility functions for clipbatch
pub struct Utils;

impl Utils {
    /// Format elapsed time for display
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        let milliseconds = duration.subsec_millis();

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }

    /// Whether a path looks like a video file the workers accept
    pub fn is_video_file(path: &std::path::Path) -> bool {
        const EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "mkv", "avi", "webm", "mts", "m2ts", "mpg", "mpeg", "wmv", "flv"];
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}
