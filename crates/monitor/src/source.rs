//! Landmark frame sources
//!
//! Landmark extraction runs outside this process. Frames arrive as JSON
//! lines, one per processed video frame:
//!
//! ```text
//! {"t_ms": 1033, "landmarks": [[x, y], ...68 points...]}
//! {"t_ms": 1066, "landmarks": null}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use dms::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed frame on line {line}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One frame from the landmark provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Capture time in milliseconds since the session began
    pub t_ms: u64,
    /// 68-point facial layout, or `None` when no face was detected
    pub landmarks: Option<Vec<(f64, f64)>>,
}

impl FrameInput {
    pub fn points(&self) -> Option<Vec<Point>> {
        self.landmarks
            .as_ref()
            .map(|pts| pts.iter().copied().map(Point::from).collect())
    }
}

/// Blocking producer of landmark frames
pub trait LandmarkSource: Send + 'static {
    /// Next frame, or `None` at end of stream
    fn next_frame(&mut self) -> Result<Option<FrameInput>, SourceError>;
}

/// Replays frames from a JSON-lines stream
pub struct JsonLinesSource<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead + Send + 'static> LandmarkSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<FrameInput>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }

            return serde_json::from_str(text)
                .map(Some)
                .map_err(|source| SourceError::Parse {
                    line: self.line,
                    source,
                });
        }
    }
}

/// Frames held in memory
pub struct VecSource {
    frames: std::vec::IntoIter<FrameInput>,
}

impl VecSource {
    pub fn new(frames: Vec<FrameInput>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl LandmarkSource for VecSource {
    fn next_frame(&mut self) -> Result<Option<FrameInput>, SourceError> {
        Ok(self.frames.next())
    }
}
