//! Time parsing and formatting utilities

use crate::domain::errors::DomainError;

/// Time parser for seconds, `MM:SS(.ms)` and `HH:MM:SS(.ms)`
pub struct TimeParser;

impl TimeParser {
    /// Parse time string to seconds
    pub fn parse_time(time_str: &str) -> Result<f64, DomainError> {
        let time_str = time_str.trim();
        let invalid = || {
            DomainError::BadArgs(format!(
                "Invalid time format: {}. Expected seconds, MM:SS.ms or HH:MM:SS.ms",
                time_str
            ))
        };

        let parts: Vec<&str> = time_str.split(':').collect();
        if parts.len() > 3 || parts.iter().any(|part| part.trim().is_empty()) {
            return Err(invalid());
        }

        let (whole, seconds_part) = parts.split_at(parts.len() - 1);
        let seconds: f64 = seconds_part[0].parse().map_err(|_| invalid())?;
        if !seconds.is_finite() || seconds < 0.0 || (!whole.is_empty() && seconds >= 60.0) {
            return Err(invalid());
        }

        let mut total = 0.0;
        for (i, part) in whole.iter().enumerate() {
            let value: u32 = part.parse().map_err(|_| invalid())?;
            // Minutes are bounded only when hours are present
            if i > 0 && value >= 60 {
                return Err(invalid());
            }
            total = total * 60.0 + value as f64;
        }

        Ok(total * 60.0 + seconds)
    }

    /// Parse a `start-end` range, e.g. `1:05-1:12.5`
    pub fn parse_range(range: &str) -> Result<(f64, f64), DomainError> {
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| DomainError::BadArgs(format!("Invalid range {}, expected start-end", range)))?;
        let start = Self::parse_time(start)?;
        let end = Self::parse_time(end)?;
        if start >= end {
            return Err(DomainError::InvalidTimeRange(format!(
                "start ({}) must be less than end ({})",
                start, end
            )));
        }
        Ok((start, end))
    }

    /// Format seconds as `HH:MM:SS.mmm`
    pub fn format_time(seconds: f64) -> String {
        let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        let millis = total_ms % 1000;
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
    }
}
