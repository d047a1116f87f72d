//! Write-once diagnostic samples of forwarded sensor events, for offline shape inspection.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// First forwarded event of any kind
    First,
    /// First forwarded event whose tag names TCP
    Tcp,
}

impl SampleKind {
    fn file_name(self) -> &'static str {
        match self {
            SampleKind::First => "sample_event.json",
            SampleKind::Tcp => "sample_tcp.json",
        }
    }
}

pub struct SampleRecorder {
    dir: PathBuf,
    first: AtomicBool,
    tcp: AtomicBool,
}

impl SampleRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            first: AtomicBool::new(false),
            tcp: AtomicBool::new(false),
        }
    }

    pub fn path(&self, kind: SampleKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Persist `raw` for `kind` unless a sample was already taken.
    /// Returns whether this call wrote the file. A failed write still uses up the slot.
    pub fn capture(&self, kind: SampleKind, raw: &str) -> std::io::Result<bool> {
        let taken = match kind {
            SampleKind::First => &self.first,
            SampleKind::Tcp => &self.tcp,
        };
        if taken.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(kind), raw)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_capture_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let rec = SampleRecorder::new(dir.path().join("data"));

        assert!(rec.capture(SampleKind::First, r#"{"n":1}"#).unwrap());
        assert!(!rec.capture(SampleKind::First, r#"{"n":2}"#).unwrap());

        let written = std::fs::read_to_string(rec.path(SampleKind::First)).unwrap();
        assert_eq!(written, r#"{"n":1}"#);
        assert!(!rec.path(SampleKind::Tcp).exists());
    }

    #[test]
    fn kinds_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let rec = SampleRecorder::new(dir.path());

        assert!(rec.capture(SampleKind::First, "a").unwrap());
        assert!(rec.capture(SampleKind::Tcp, "b").unwrap());
        assert_eq!(std::fs::read_to_string(rec.path(SampleKind::Tcp)).unwrap(), "b");
    }

    #[test]
    fn failed_write_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a dir").unwrap();
        let rec = SampleRecorder::new(&blocker);

        assert!(rec.capture(SampleKind::First, "x").is_err());
        assert!(!rec.capture(SampleKind::First, "x").unwrap());
    }
}
