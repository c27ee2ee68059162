//! Size-rotated log sink
//!
//! The sink owns the current log segment and the running size counter. It
//! performs the decode → filter → write → rotate sequence for one frame at
//! a time; callers serialize access through a mutex, so records never
//! interleave and rotation only ever happens between records.

use crate::config::LogConfig;
use crate::error::Result;
use crate::filter::Matcher;
use crate::types::{to_hex_string, Frame};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Appending writer over the current log segment
pub struct LogSink {
    dir: PathBuf,
    stem: String,
    threshold_bytes: u64,
    hex_mode: bool,
    file: File,
    path: PathBuf,
    /// Bytes in the current segment, including any pre-existing content of
    /// a reused file; strictly increases until rotation
    bytes_written: u64,
}

impl LogSink {
    /// Open the first log segment eagerly
    ///
    /// The configured file path contributes its directory and stem; each
    /// segment is named `<stem>_<YYYYMMDD_HHMMSS>.log` and opened in append
    /// mode, so a name collision (two rotations within one second) reuses
    /// the file and the size counter picks up its current length.
    pub fn open(cfg: &LogConfig) -> Result<Self> {
        let base = Path::new(&cfg.file_path);
        let dir = base.parent().map(PathBuf::from).unwrap_or_default();
        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "serial".to_string());

        let (file, path, bytes_written) = Self::open_segment(&dir, &stem)?;
        tracing::info!("Logging to {}", path.display());

        Ok(Self {
            dir,
            stem,
            threshold_bytes: cfg.rotation_threshold_bytes(),
            hex_mode: cfg.hex_mode,
            file,
            path,
            bytes_written,
        })
    }

    fn open_segment(dir: &Path, stem: &str) -> Result<(File, PathBuf, u64)> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{stem}_{timestamp}.log"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok((file, path, size))
    }

    /// Decode, filter and persist one frame
    ///
    /// Returns the decoded text when the frame matched and was written,
    /// `None` when it was filtered out. Filtered frames are not written and
    /// do not count toward the rotation threshold. Each written record is
    /// flushed before returning.
    pub fn log(&mut self, frame: &Frame, matcher: &Matcher) -> Result<Option<String>> {
        let text = self.decode(&frame.payload);
        if !matcher.matches(&text) {
            return Ok(None);
        }

        let record = format!(
            "[{}] {}: {}\n",
            frame.format_timestamp(),
            frame.direction,
            text
        );
        self.file.write_all(record.as_bytes())?;
        self.file.flush()?;
        self.bytes_written += record.len() as u64;

        if self.bytes_written > self.threshold_bytes {
            self.rotate()?;
        }

        Ok(Some(text))
    }

    /// Render payload bytes for logging
    ///
    /// Hex mode renders unconditionally; otherwise invalid UTF-8 sequences
    /// are replaced, never fatal.
    fn decode(&self, payload: &[u8]) -> String {
        if self.hex_mode {
            to_hex_string(payload)
        } else {
            String::from_utf8_lossy(payload).into_owned()
        }
    }

    fn rotate(&mut self) -> Result<()> {
        let (file, path, size) = Self::open_segment(&self.dir, &self.stem)?;
        tracing::info!(
            "Rotating log: {} -> {}",
            self.path.display(),
            path.display()
        );
        // Replacing the handle closes the previous segment
        self.file = file;
        self.path = path;
        self.bytes_written = size;
        Ok(())
    }

    /// Path of the segment currently being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size counter for the current segment
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink_in(dir: &Path) -> LogSink {
        let cfg = LogConfig {
            file_path: dir.join("capture.log").to_string_lossy().into_owned(),
            ..LogConfig::default()
        };
        LogSink::open(&cfg).unwrap()
    }

    #[test]
    fn test_segment_naming() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink_in(dir.path());
        let name = sink.path().file_name().unwrap().to_string_lossy().into_owned();
        // capture_YYYYMMDD_HHMMSS.log
        assert!(name.starts_with("capture_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "capture_".len() + 15 + ".log".len());
    }

    #[test]
    fn test_record_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(dir.path());

        let frame = Frame::rx(b"hello".to_vec());
        let text = sink.log(&frame, &Matcher::match_all()).unwrap().unwrap();
        assert_eq!(text, "hello");

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert!(content.ends_with("] RX: hello\n"), "got: {content:?}");
        assert!(content.starts_with('['));
        assert_eq!(sink.bytes_written(), content.len() as u64);
    }

    #[test]
    fn test_tx_direction_in_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(dir.path());
        sink.log(&Frame::tx(b"ping".to_vec()), &Matcher::match_all())
            .unwrap();
        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert!(content.contains("] TX: ping\n"));
    }

    #[test]
    fn test_hex_mode_renders_all_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LogConfig {
            file_path: dir.path().join("hex.log").to_string_lossy().into_owned(),
            hex_mode: true,
            ..LogConfig::default()
        };
        let mut sink = LogSink::open(&cfg).unwrap();
        let text = sink
            .log(&Frame::rx(vec![0xDE, 0xAD, 0x0A]), &Matcher::match_all())
            .unwrap()
            .unwrap();
        assert_eq!(text, "DE AD 0A");
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(dir.path());
        let text = sink
            .log(&Frame::rx(vec![0xFF, b'o', b'k']), &Matcher::match_all())
            .unwrap()
            .unwrap();
        assert!(text.contains('\u{FFFD}'));
        assert!(text.contains("ok"));
    }

    #[test]
    fn test_filtered_frames_are_not_written_or_counted() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(dir.path());
        let matcher = Matcher::compile("\"KEEP\"").unwrap();

        assert!(sink
            .log(&Frame::rx(b"drop me".to_vec()), &matcher)
            .unwrap()
            .is_none());
        assert_eq!(sink.bytes_written(), 0);
        assert_eq!(std::fs::read_to_string(sink.path()).unwrap(), "");

        assert!(sink
            .log(&Frame::rx(b"KEEP me".to_vec()), &matcher)
            .unwrap()
            .is_some());
        assert!(sink.bytes_written() > 0);
    }

    #[test]
    fn test_rotation_crosses_threshold_between_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(dir.path());
        sink.threshold_bytes = 50;
        let matcher = Matcher::match_all();

        sink.log(&Frame::rx(b"record one".to_vec()), &matcher)
            .unwrap();
        let first_path = sink.path().to_path_buf();
        assert!(sink.bytes_written() <= 50, "test record unexpectedly large");

        // A fresh second guarantees the next segment gets a distinct name
        std::thread::sleep(std::time::Duration::from_millis(1100));

        // This record crosses the threshold: it lands in the first segment,
        // then rotation opens a new one
        sink.log(&Frame::rx(b"record two".to_vec()), &matcher)
            .unwrap();
        let second_path = sink.path().to_path_buf();
        assert_ne!(first_path, second_path);
        assert_eq!(sink.bytes_written(), 0);

        sink.log(&Frame::rx(b"record three".to_vec()), &matcher)
            .unwrap();

        let first = std::fs::read_to_string(&first_path).unwrap();
        let second = std::fs::read_to_string(&second_path).unwrap();
        assert!(first.contains("record one"));
        assert!(first.contains("record two"));
        assert!(!first.contains("record three"));
        assert!(second.contains("record three"));
    }

    #[test]
    fn test_counter_includes_preexisting_content_of_reused_segment() {
        let dir = tempfile::tempdir().unwrap();
        // Pre-create the segment the sink will open this second
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.path().join(format!("capture_{timestamp}.log"));
        std::fs::write(&path, "leftover\n").unwrap();

        let sink = sink_in(dir.path());
        if sink.path() == path {
            assert_eq!(sink.bytes_written(), "leftover\n".len() as u64);
        }
    }
}
