//! Recorded contact traces: one JSON object per line.
//!
//! ```text
//! # comment lines and blank lines are skipped
//! {"t": 0, "contacts": [{"id": 1, "x": 100.0, "y": 200.0}]}
//! {"t": 16, "contacts": [{"id": 1, "x": 104.0, "y": 200.0}]}
//! {"t": 33, "contacts": []}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;
use crate::tracker::ContactSample;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    /// Milliseconds since the start of the recording.
    pub t: u64,
    #[serde(default)]
    pub contacts: Vec<ContactSample>,
}

pub fn read_trace(path: &Path) -> Result<Vec<TraceFrame>, TraceError> {
    let file = File::open(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trace(BufReader::new(file)).map_err(|e| match e {
        TraceError::Io { source, .. } => TraceError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

pub fn parse_trace(reader: impl BufRead) -> Result<Vec<TraceFrame>, TraceError> {
    let mut frames: Vec<TraceFrame> = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| TraceError::Io {
            path: "<input>".into(),
            source,
        })?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let frame: TraceFrame = serde_json::from_str(text).map_err(|source| TraceError::Parse {
            line: line_no,
            source,
        })?;
        if let Some(previous) = frames.last() {
            if frame.t < previous.t {
                return Err(TraceError::OutOfOrder {
                    line: line_no,
                    t: frame.t,
                    previous: previous.t,
                });
            }
        }
        frames.push(frame);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let text = concat!(
            "# recorded pinch\n\n",
            "{\"t\":0,\"contacts\":[{\"id\":1,\"x\":1.0,\"y\":2.0}]}\n",
            "  \n{\"t\":16}\n",
        );
        let frames = parse_trace(text.as_bytes()).expect("valid trace");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].contacts[0], ContactSample { id: 1, x: 1.0, y: 2.0 });
        assert!(frames[1].contacts.is_empty());
    }

    #[test]
    fn reports_the_failing_line() {
        let text = "{\"t\":0}\n{\"t\":\"soon\"}\n";
        match parse_trace(text.as_bytes()) {
            Err(TraceError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_time_going_backwards() {
        let text = "{\"t\":20}\n# gap\n{\"t\":10}\n";
        match parse_trace(text.as_bytes()) {
            Err(TraceError::OutOfOrder { line, t, previous }) => {
                assert_eq!((line, t, previous), (3, 10, 20));
            }
            other => panic!("expected ordering error, got {other:?}"),
        }
    }
}
