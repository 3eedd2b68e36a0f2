// fraglog - platform/tee.rs
//
// Duplicating writer: every write goes to stdout and to an append-mode file,
// like `tee` but unbuffered. Both writes run concurrently and both must
// finish before `write` returns. A failure on either side is returned; the
// other side may already have received the bytes.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Writes every buffer to two destinations.
pub struct SplitWriter<A: Write + Send, B: Write + Send> {
    primary: A,
    secondary: B,
}

impl SplitWriter<io::Stdout, File> {
    /// stdout plus `path`, opened in append mode and created if missing.
    pub fn stdout_and_file(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(io::stdout(), file))
    }
}

impl<A: Write + Send, B: Write + Send> SplitWriter<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }

    pub fn into_inner(self) -> (A, B) {
        (self.primary, self.secondary)
    }
}

impl<A: Write + Send, B: Write + Send> Write for SplitWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let primary = &mut self.primary;
        let secondary = &mut self.secondary;
        let (a, b) = rayon::join(|| primary.write_all(buf), || secondary.write_all(buf));
        a?;
        b?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        self.secondary.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_both_sides_receive_bytes() {
        let mut w = SplitWriter::new(Vec::new(), Vec::new());
        w.write_all(b"one\n").unwrap();
        w.write_all(b"two\n").unwrap();
        let (a, b) = w.into_inner();
        assert_eq!(a, b"one\ntwo\n");
        assert_eq!(a, b);
    }

    #[test]
    fn test_failure_on_either_side_is_reported() {
        let mut w = SplitWriter::new(Vec::new(), Broken);
        let err = w.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        let mut w = SplitWriter::new(Broken, Vec::new());
        assert!(w.write(b"x").is_err());
        // The healthy side still got the bytes.
        let (_, b) = w.into_inner();
        assert_eq!(b, b"x");
    }

    #[test]
    fn test_file_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "existing\n").unwrap();

        let file = OpenOptions::new().append(true).open(&path).unwrap();
        let mut w = SplitWriter::new(Vec::new(), file);
        w.write_all(b"new\n").unwrap();
        w.flush().unwrap();
        drop(w);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing\nnew\n");
        assert!(SplitWriter::stdout_and_file(&path).is_ok());
    }
}
