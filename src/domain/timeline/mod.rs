//! Trim window and cut segments over a media file's duration
//!
//! A [`Timeline`] is an immutable snapshot. Every edit takes the current
//! snapshot and a proposed value and returns a new, clamped snapshot, so the
//! invariants below hold after any sequence of edits:
//!
//! - `0 <= trim.start < effective_end <= duration`
//! - every cut lies inside `[trim.start, effective_end]`
//! - every cut is at least [`MIN_SEGMENT_SECONDS`] long
//! - cuts never overlap one another

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Minimum length of a cut segment and minimum trim window gap
pub const MIN_SEGMENT_SECONDS: f64 = 0.1;

/// Minimum half-width of a newly created cut segment
pub const MIN_NEW_SEGMENT_HALF_WIDTH: f64 = 0.5;

/// Half-width of a new cut segment as a share of the trim window
pub const NEW_SEGMENT_WIDTH_RATIO: f64 = 0.05;

/// Tolerance for float comparisons on bounds computed by the clamps
const EPSILON: f64 = 1e-9;

/// Selected output window; `end == None` tracks the file's duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start: f64,
    pub end: Option<f64>,
}

impl TrimWindow {
    pub fn effective_end(&self, duration: f64) -> f64 {
        self.end.unwrap_or(duration)
    }
}

impl Default for TrimWindow {
    fn default() -> Self {
        Self { start: 0.0, end: None }
    }
}

/// A sub-range excised from the trimmed output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutSegment {
    pub id: u64,
    pub start: f64,
    pub end: f64,
}

impl CutSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    fn overlaps(&self, start: f64, end: f64) -> bool {
        start < self.end - EPSILON && self.start < end - EPSILON
    }
}

/// Trim window plus cut segments for one media duration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    duration: f64,
    trim: TrimWindow,
    segments: Vec<CutSegment>,
    #[serde(skip)]
    next_id: u64,
}

impl Timeline {
    /// Create an untrimmed timeline with no cuts
    pub fn new(duration: f64) -> Result<Self, DomainError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(DomainError::BadArgs(format!(
                "Timeline duration must be positive, got {}",
                duration
            )));
        }

        Ok(Self {
            duration,
            trim: TrimWindow::default(),
            segments: Vec::new(),
            next_id: 1,
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn trim(&self) -> TrimWindow {
        self.trim
    }

    /// Cut segments in creation order
    pub fn segments(&self) -> &[CutSegment] {
        &self.segments
    }

    pub fn segment(&self, id: u64) -> Option<&CutSegment> {
        self.segments.iter().find(|segment| segment.id == id)
    }

    pub fn effective_end(&self) -> f64 {
        self.trim.effective_end(self.duration)
    }

    /// Length of the trim window, cuts not subtracted
    pub fn window_duration(&self) -> f64 {
        self.effective_end() - self.trim.start
    }

    /// Output length once the window is applied and every cut removed
    pub fn effective_duration(&self) -> f64 {
        let cut: f64 = self.segments.iter().map(CutSegment::duration).sum();
        (self.window_duration() - cut).max(0.0)
    }

    /// Move the window start, clamped to `[0, effective_end - 0.1]`
    #[must_use]
    pub fn with_trim_start(&self, t: f64) -> Self {
        if !t.is_finite() {
            return self.clone();
        }

        let upper = self.effective_end() - MIN_SEGMENT_SECONDS;
        let mut next = self.clone();
        next.trim.start = t.min(upper).max(0.0);
        next.reconcile_segments();
        next
    }

    /// Move the window end, clamped to `[start + 0.1, duration]`
    ///
    /// Once set, the end stays explicit even if it lands on the duration.
    #[must_use]
    pub fn with_trim_end(&self, t: f64) -> Self {
        if !t.is_finite() {
            return self.clone();
        }

        let lower = self.trim.start + MIN_SEGMENT_SECONDS;
        let mut next = self.clone();
        next.trim.end = Some(t.max(lower).min(self.duration));
        next.reconcile_segments();
        next
    }

    /// Add a cut segment centered in the trim window
    ///
    /// The half-width is 5% of the window (at least 0.5 s), kept 0.1 s away
    /// from both window edges. When the center is already covered by another
    /// cut, the new cut is centered in the widest free gap instead.
    pub fn with_cut_segment(&self) -> Result<Self, DomainError> {
        let lower = self.trim.start + MIN_SEGMENT_SECONDS;
        let upper = self.effective_end() - MIN_SEGMENT_SECONDS;
        let half = (self.window_duration() * NEW_SEGMENT_WIDTH_RATIO).max(MIN_NEW_SEGMENT_HALF_WIDTH);
        let center = (self.trim.start + self.effective_end()) / 2.0;

        let gaps = self.free_gaps(lower, upper);
        let place = |(gap_start, gap_end): (f64, f64), at: f64| {
            ((at - half).max(gap_start), (at + half).min(gap_end))
        };

        let centered = gaps
            .iter()
            .find(|(gap_start, gap_end)| *gap_start <= center && center <= *gap_end)
            .map(|gap| place(*gap, center))
            .filter(|(start, end)| end - start >= MIN_SEGMENT_SECONDS - EPSILON);

        let widest = || {
            gaps.iter()
                .copied()
                .fold(None, |best: Option<(f64, f64)>, gap| match best {
                    Some(b) if b.1 - b.0 >= gap.1 - gap.0 => Some(b),
                    _ => Some(gap),
                })
                .map(|gap| place(gap, (gap.0 + gap.1) / 2.0))
        };

        let (start, end) = centered
            .or_else(widest)
            .filter(|(start, end)| end - start >= MIN_SEGMENT_SECONDS - EPSILON)
            .ok_or_else(|| {
                DomainError::WindowTooNarrow(format!(
                    "no room for a {:.1}s cut in window {:.3}s..{:.3}s",
                    MIN_SEGMENT_SECONDS,
                    self.trim.start,
                    self.effective_end()
                ))
            })?;

        Ok(self.push_segment(start, end))
    }

    /// Add a cut segment with explicit bounds
    pub fn with_cut_range(&self, start: f64, end: f64) -> Result<Self, DomainError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(DomainError::BadArgs("Cut bounds must be finite".to_string()));
        }
        if start < self.trim.start - EPSILON || end > self.effective_end() + EPSILON {
            return Err(DomainError::InvalidTimeRange(format!(
                "cut {:.3}s..{:.3}s lies outside the trim window {:.3}s..{:.3}s",
                start,
                end,
                self.trim.start,
                self.effective_end()
            )));
        }
        if end - start < MIN_SEGMENT_SECONDS - EPSILON {
            return Err(DomainError::InvalidTimeRange(format!(
                "cut {:.3}s..{:.3}s is shorter than {:.1}s",
                start, end, MIN_SEGMENT_SECONDS
            )));
        }
        if let Some(other) = self.segments.iter().find(|other| other.overlaps(start, end)) {
            return Err(DomainError::InvalidTimeRange(format!(
                "cut {:.3}s..{:.3}s overlaps cut {:.3}s..{:.3}s",
                start, end, other.start, other.end
            )));
        }

        Ok(self.push_segment(start, end))
    }

    /// Drag a cut's start edge
    ///
    /// Clamped to stay 0.1 s before the cut's own end, inside the trim window,
    /// and after the end of the nearest cut on its left.
    pub fn with_segment_start(&self, id: u64, t: f64) -> Result<Self, DomainError> {
        let index = self.segment_index(id)?;
        if !t.is_finite() {
            return Ok(self.clone());
        }

        let segment = self.segments[index];
        let lower = self
            .segments
            .iter()
            .filter(|other| other.id != id && other.end <= segment.start + EPSILON)
            .map(|other| other.end)
            .fold(self.trim.start, f64::max);
        let upper = segment.end - MIN_SEGMENT_SECONDS;

        let mut next = self.clone();
        next.segments[index].start = t.min(upper).max(lower);
        Ok(next)
    }

    /// Drag a cut's end edge
    ///
    /// Clamped to stay 0.1 s after the cut's own start, inside the trim window,
    /// and before the start of the nearest cut on its right.
    pub fn with_segment_end(&self, id: u64, t: f64) -> Result<Self, DomainError> {
        let index = self.segment_index(id)?;
        if !t.is_finite() {
            return Ok(self.clone());
        }

        let segment = self.segments[index];
        let lower = segment.start + MIN_SEGMENT_SECONDS;
        let upper = self
            .segments
            .iter()
            .filter(|other| other.id != id && other.start >= segment.end - EPSILON)
            .map(|other| other.start)
            .fold(self.effective_end(), f64::min);

        let mut next = self.clone();
        next.segments[index].end = t.max(lower).min(upper);
        Ok(next)
    }

    /// Drop the most recently added cut; no-op without cuts
    #[must_use]
    pub fn without_last_segment(&self) -> Self {
        let mut next = self.clone();
        next.segments.pop();
        next
    }

    /// Ranges that survive the trim and the cuts, in time order
    ///
    /// With a frame rate, every bound is snapped to the nearest frame first.
    pub fn keep_ranges(&self, fps: Option<f64>) -> Vec<(f64, f64)> {
        let snap = |t: f64| match fps {
            Some(fps) => snap_to_frame(t, fps),
            None => t,
        };

        let mut cuts: Vec<(f64, f64)> = self
            .segments
            .iter()
            .map(|segment| (snap(segment.start), snap(segment.end)))
            .collect();
        cuts.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut ranges = vec![(snap(self.trim.start), snap(self.effective_end()))];
        for (cut_start, cut_end) in cuts {
            ranges = ranges
                .into_iter()
                .flat_map(|(start, end)| {
                    if cut_end <= start || cut_start >= end {
                        return vec![(start, end)];
                    }
                    let mut pieces = Vec::with_capacity(2);
                    if cut_start > start {
                        pieces.push((start, cut_start));
                    }
                    if cut_end < end {
                        pieces.push((cut_end, end));
                    }
                    pieces
                })
                .collect();
        }

        ranges.retain(|(start, end)| end > start);
        ranges
    }

    /// Check every invariant of the snapshot
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(DomainError::ValidationFailed(format!(
                "duration must be positive, got {}",
                self.duration
            )));
        }

        let start = self.trim.start;
        let end = self.effective_end();
        if !start.is_finite() || !end.is_finite() || start < 0.0 || start >= end || end > self.duration + EPSILON {
            return Err(DomainError::ValidationFailed(format!(
                "trim window {:.3}s..{:.3}s outside 0..{:.3}s",
                start, end, self.duration
            )));
        }

        for (i, segment) in self.segments.iter().enumerate() {
            if segment.start < start - EPSILON || segment.end > end + EPSILON {
                return Err(DomainError::ValidationFailed(format!(
                    "cut {} ({:.3}s..{:.3}s) outside trim window",
                    segment.id, segment.start, segment.end
                )));
            }
            if segment.duration() < MIN_SEGMENT_SECONDS - EPSILON {
                return Err(DomainError::ValidationFailed(format!(
                    "cut {} shorter than {:.1}s",
                    segment.id, MIN_SEGMENT_SECONDS
                )));
            }
            if let Some(other) = self.segments[i + 1..]
                .iter()
                .find(|other| other.overlaps(segment.start, segment.end))
            {
                return Err(DomainError::ValidationFailed(format!(
                    "cuts {} and {} overlap",
                    segment.id, other.id
                )));
            }
        }

        Ok(())
    }

    fn segment_index(&self, id: u64) -> Result<usize, DomainError> {
        self.segments
            .iter()
            .position(|segment| segment.id == id)
            .ok_or(DomainError::UnknownSegment(id))
    }

    fn push_segment(&self, start: f64, end: f64) -> Self {
        let mut next = self.clone();
        next.segments.push(CutSegment { id: next.next_id, start, end });
        next.next_id += 1;
        next
    }

    /// Uncovered sub-ranges of `[lower, upper]`
    fn free_gaps(&self, lower: f64, upper: f64) -> Vec<(f64, f64)> {
        let mut taken: Vec<(f64, f64)> = self.segments.iter().map(|s| (s.start, s.end)).collect();
        taken.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut gaps = Vec::new();
        let mut cursor = lower;
        for (start, end) in taken {
            let gap_end = start.min(upper);
            if gap_end > cursor {
                gaps.push((cursor, gap_end));
            }
            cursor = cursor.max(end);
        }
        if upper > cursor {
            gaps.push((cursor, upper));
        }
        gaps
    }

    /// Pull cuts back inside the trim window after it changed
    fn reconcile_segments(&mut self) {
        let start = self.trim.start;
        let end = self.effective_end();
        self.segments.retain_mut(|segment| {
            segment.start = segment.start.max(start);
            segment.end = segment.end.min(end);
            segment.duration() >= MIN_SEGMENT_SECONDS - EPSILON
        });
    }
}

/// Snap a time to the nearest frame boundary; no-op for non-positive rates
pub fn snap_to_frame(t: f64, fps: f64) -> f64 {
    if fps <= 0.0 || !fps.is_finite() {
        return t;
    }
    (t * fps).round() / fps
}
