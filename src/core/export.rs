// fraglog - core/export.rs
//
// JSON-lines encoding of emitted records.
// Core layer: writes to any Write trait object.

use crate::core::record::Record;
use crate::util::error::SinkError;
use std::io::Write;

/// Destination for emitted records.
pub trait RecordSink {
    fn emit(&mut self, record: Record) -> Result<(), SinkError>;
}

/// Collects records in memory.
impl RecordSink for Vec<Record> {
    fn emit(&mut self, record: Record) -> Result<(), SinkError> {
        self.push(record);
        Ok(())
    }
}

/// Writes each record as one JSON object per line.
///
/// A record is encoded into a buffer first and handed to the writer in a
/// single `write_all`, so a duplicating writer sees whole lines.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    buf: Vec<u8>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buf: Vec::with_capacity(512),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: Record) -> Result<(), SinkError> {
        self.buf.clear();
        serde_json::to_writer(&mut self.buf, &record)?;
        self.buf.push(b'\n');
        self.writer.write_all(&self.buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{Attr, Level};
    use std::io;

    #[test]
    fn test_json_lines_export() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.emit(Record::new(Level::Info, "first", vec![]))
            .unwrap();
        sink.emit(Record::new(
            Level::Warn,
            "second",
            vec![Attr::string("game_type", "ca")],
        ))
        .unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["level"], "INFO");
        assert_eq!(first["msg"], "first");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["level"], "WARN");
        assert_eq!(second["game_type"], "ca");
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut sink = JsonLinesSink::new(BrokenWriter);
        let result = sink.emit(Record::new(Level::Info, "x", vec![]));
        assert!(matches!(result, Err(SinkError::Io { .. })));
    }
}
