//! Worker event protocol
//!
//! The worker writes one JSON object per line on stdout, discriminated by its
//! `"event"` field. [`decode`] turns a line into a [`WorkerEvent`] or nothing;
//! it never fails, so diagnostic output interleaved by the worker is skipped.

use serde::{Deserialize, Deserializer};

/// One decoded worker event
///
/// Optional fields default to neutral values (0, empty string, false). The
/// `?` counters of `file_complete` stay `None` when absent so the tracker can
/// tell "not reported" from zero.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkerEvent {
    Start {
        #[serde(default, deserialize_with = "null_as_default")]
        total_files: u32,
        #[serde(default, deserialize_with = "null_as_default")]
        hardware_acceleration: bool,
        #[serde(default)]
        ffmpeg_path: Option<String>,
    },
    Progress {
        #[serde(default, deserialize_with = "null_as_default")]
        current_file: u32,
        #[serde(default, deserialize_with = "null_as_default")]
        total_files: u32,
        #[serde(default, deserialize_with = "null_as_default")]
        filename: String,
    },
    FileStart {
        file: String,
        #[serde(default, deserialize_with = "null_as_default")]
        path: String,
    },
    FileComplete {
        file: String,
        #[serde(default, deserialize_with = "null_as_default")]
        success: bool,
        #[serde(default)]
        output_dir: Option<String>,
        #[serde(default)]
        segments_completed: Option<u32>,
        #[serde(default)]
        segments_total: Option<u32>,
        /// Single output file (GIF export)
        #[serde(default)]
        output: Option<String>,
        /// Human readable output size
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    FileError {
        file: String,
        #[serde(default, deserialize_with = "null_as_default")]
        error: String,
        #[serde(default)]
        segment: Option<u32>,
    },
    SegmentStart {
        file: String,
        #[serde(default, deserialize_with = "null_as_default")]
        segment: u32,
        #[serde(default, deserialize_with = "null_as_default")]
        total: u32,
    },
    SegmentComplete {
        file: String,
        #[serde(default, deserialize_with = "null_as_default")]
        segment: u32,
        #[serde(default, deserialize_with = "null_as_default")]
        total: u32,
        #[serde(default, deserialize_with = "null_as_default")]
        output: String,
    },
    Complete {
        #[serde(default, deserialize_with = "null_as_default")]
        total_files: u32,
        #[serde(default, deserialize_with = "null_as_default")]
        successful: u32,
        #[serde(default, deserialize_with = "null_as_default")]
        failed: u32,
    },
    Error {
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
    },
}

impl WorkerEvent {
    /// File id the event refers to, if it is a per-file event
    pub fn file_id(&self) -> Option<&str> {
        match self {
            WorkerEvent::FileStart { file, .. }
            | WorkerEvent::FileComplete { file, .. }
            | WorkerEvent::FileError { file, .. }
            | WorkerEvent::SegmentStart { file, .. }
            | WorkerEvent::SegmentComplete { file, .. } => Some(file),
            _ => None,
        }
    }

    /// Discriminator as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            WorkerEvent::Start { .. } => "start",
            WorkerEvent::Progress { .. } => "progress",
            WorkerEvent::FileStart { .. } => "file_start",
            WorkerEvent::FileComplete { .. } => "file_complete",
            WorkerEvent::FileError { .. } => "file_error",
            WorkerEvent::SegmentStart { .. } => "segment_start",
            WorkerEvent::SegmentComplete { .. } => "segment_complete",
            WorkerEvent::Complete { .. } => "complete",
            WorkerEvent::Error { .. } => "error",
        }
    }
}

/// Decode one line of worker output
pub fn decode(line: &str) -> Option<WorkerEvent> {
    let line = line.trim();
    if !line.starts_with('{') {
        return None;
    }
    serde_json::from_str(line).ok()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_start() {
        let event = decode(r#"{"event":"start","total_files":3,"hardware_acceleration":true}"#);
        assert_eq!(
            event,
            Some(WorkerEvent::Start {
                total_files: 3,
                hardware_acceleration: true,
                ffmpeg_path: None,
            })
        );
    }

    #[test]
    fn test_decode_file_complete_with_counters() {
        let event = decode(
            r#"{"event":"file_complete","file":"a.mp4","success":true,"output_dir":"/out/a","segments_completed":2,"segments_total":3}"#,
        )
        .unwrap();

        match event {
            WorkerEvent::FileComplete {
                file,
                success,
                output_dir,
                segments_completed,
                segments_total,
                ..
            } => {
                assert_eq!(file, "a.mp4");
                assert!(success);
                assert_eq!(output_dir.as_deref(), Some("/out/a"));
                assert_eq!(segments_completed, Some(2));
                assert_eq!(segments_total, Some(3));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_optional_fields_default_to_neutral_values() {
        assert_eq!(
            decode(r#"{"event":"file_complete","file":"a.mp4"}"#),
            Some(WorkerEvent::FileComplete {
                file: "a.mp4".to_string(),
                success: false,
                output_dir: None,
                segments_completed: None,
                segments_total: None,
                output: None,
                size: None,
                error: None,
            })
        );
        assert_eq!(
            decode(r#"{"event":"segment_start","file":"a.mp4"}"#),
            Some(WorkerEvent::SegmentStart { file: "a.mp4".to_string(), segment: 0, total: 0 })
        );
        assert_eq!(
            decode(r#"{"event":"error","message":null}"#),
            Some(WorkerEvent::Error { message: String::new() })
        );
        assert_eq!(
            decode(r#"{"event":"complete"}"#),
            Some(WorkerEvent::Complete { total_files: 0, successful: 0, failed: 0 })
        );
    }

    #[test]
    fn test_missing_file_id_is_rejected() {
        assert_eq!(decode(r#"{"event":"file_start","path":"/x/a.mp4"}"#), None);
        assert_eq!(decode(r#"{"event":"segment_complete","segment":1,"total":2}"#), None);
    }

    #[test]
    fn test_malformed_lines_yield_nothing() {
        let lines = [
            "",
            "   ",
            "frame=  120 fps= 30 q=28.0 size=    512kB",
            "{not json",
            r#"{"file":"a.mp4"}"#,
            r#"{"event":"unknown_thing","file":"a.mp4"}"#,
            r#"{"event":42}"#,
            r#"{"event":"segment_start","file":"a.mp4","segment":-1}"#,
            "[1,2,3]",
            "null",
        ];
        for line in lines {
            assert_eq!(decode(line), None, "line {:?} should not decode", line);
        }
    }

    #[test]
    fn test_surrounding_whitespace_and_extra_fields() {
        let event = decode("  {\"event\":\"file_start\",\"file\":\"b.mov\",\"path\":\"/in/b.mov\",\"extra\":1}\r\n");
        assert_eq!(
            event,
            Some(WorkerEvent::FileStart { file: "b.mov".to_string(), path: "/in/b.mov".to_string() })
        );
    }

    #[test]
    fn test_decode_is_deterministic() {
        let line = r#"{"event":"progress","current_file":2,"total_files":5,"filename":"c.mkv"}"#;
        assert_eq!(decode(line), decode(line));
        assert_eq!(decode(line).unwrap().name(), "progress");
    }

    proptest! {
        /// Any text decodes to at most one event, the same one every time
        #[test]
        fn decode_is_total_and_repeatable(line in ".*") {
            prop_assert_eq!(decode(&line), decode(&line));
        }

        /// Near-miss records: known and unknown tags, missing or odd fields
        #[test]
        fn decode_tolerates_event_shaped_lines(
            tag in "(start|progress|file_start|file_complete|file_error|segment_start|segment_complete|complete|error|[a-z_]{0,12})",
            file in prop::option::of("[a-z]{1,6}\\.mp4"),
            counter in prop::option::of(any::<i64>()),
            trailer in "[ ,}\\]a-z0-9\"]{0,4}",
        ) {
            let mut line = format!(r#"{{"event":"{}""#, tag);
            if let Some(file) = &file {
                line.push_str(&format!(r#","file":"{}""#, file));
            }
            if let Some(counter) = counter {
                line.push_str(&format!(r#","segment":{},"total_files":{}"#, counter, counter));
            }
            line.push_str(&trailer);

            let first = decode(&line);
            prop_assert_eq!(&first, &decode(&line));
            if let Some(event) = first {
                prop_assert_eq!(event.name(), tag.as_str());
                if event.file_id().is_some() {
                    prop_assert_eq!(event.file_id(), file.as_deref());
                }
            }
        }
    }

    #[test]
    fn test_file_id() {
        let event = decode(r#"{"event":"file_error","file":"a.mp4","error":"boom","segment":2}"#).unwrap();
        assert_eq!(event.file_id(), Some("a.mp4"));
        assert_eq!(decode(r#"{"event":"complete","total_files":1,"successful":1,"failed":0}"#).unwrap().file_id(), None);
    }
}
