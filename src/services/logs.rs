//! Log sinks and incremental relay of remote job output.
//!
//! The controller exposes a job's stdout as a growing text document, not a
//! stream. [`LogRelay`] turns successive snapshots of that document into a
//! sequence of lines delivered exactly once and in order, holding back a
//! trailing unterminated line until it completes (or the job ends).

use regex::Regex;
use std::io::{self, Write};
use std::sync::LazyLock;

/// ANSI CSI / OSC escape sequences, as produced by ansible's color output.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b(?:\[[0-9;?]*[ -/]*[@-~]|\][^\x07\x1b]*(?:\x07|\x1b\\))")
        .expect("ANSI escape regex")
});

/// Remove ANSI escape sequences from a line.
pub fn strip_ansi(line: &str) -> String {
    ANSI_ESCAPE.replace_all(line, "").into_owned()
}

/// Line-oriented character stream supplied by the caller.
///
/// The client writes relayed remote log lines and its own informational
/// messages here in real time.
pub trait LogSink {
    /// Write one line (without trailing newline).
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// Sink that writes lines to any [`Write`] implementation, e.g. stdout or a
/// build log file.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LogSink for WriterSink<W> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)
    }
}

/// Sink that collects lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines received so far.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl LogSink for MemorySink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }
}

/// Incremental relay over cumulative stdout snapshots.
///
/// Tracks how many bytes of the remote document have already been emitted so
/// that each poll only relays the suffix. If the remote ever returns a
/// shorter document than previously seen (a controller-side rotation), the
/// relay resets rather than re-emit old content.
#[derive(Debug)]
pub struct LogRelay {
    emitted_bytes: usize,
    strip_color: bool,
}

impl LogRelay {
    pub fn new(strip_color: bool) -> Self {
        Self {
            emitted_bytes: 0,
            strip_color,
        }
    }

    /// Relay the not-yet-emitted portion of `snapshot` to `sink`.
    ///
    /// `flush` forces out a trailing line that has no newline yet; it is set
    /// on the final relay after the job reached a terminal state. Returns the
    /// number of lines written.
    pub fn relay(
        &mut self,
        snapshot: &str,
        sink: &mut dyn LogSink,
        flush: bool,
    ) -> io::Result<usize> {
        // get() covers both a shrunk document and an offset landing inside a
        // multi-byte character of a rewritten one.
        let mut new = match snapshot.get(self.emitted_bytes..) {
            Some(tail) => tail,
            None => {
                log::warn!(
                    "remote log no longer extends the {} bytes already relayed; restarting relay",
                    self.emitted_bytes
                );
                self.emitted_bytes = 0;
                snapshot
            }
        };
        if !flush {
            // Hold back a trailing partial line until it completes.
            match new.rfind('\n') {
                Some(last_newline) => new = &new[..=last_newline],
                None => return Ok(0),
            }
        }
        if new.is_empty() {
            return Ok(0);
        }

        // A trailing newline terminates the last line rather than opening an
        // empty one; intentional blank lines in the middle are preserved.
        let body = new.strip_suffix('\n').unwrap_or(new);

        let mut written = 0;
        for line in body.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if self.strip_color {
                sink.write_line(&strip_ansi(line))?;
            } else {
                sink.write_line(line)?;
            }
            written += 1;
        }

        self.emitted_bytes += new.len();
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_colors() {
        assert_eq!(strip_ansi("\x1b[0;32mok: [localhost]\x1b[0m"), "ok: [localhost]");
        assert_eq!(strip_ansi("plain text"), "plain text");
        assert_eq!(strip_ansi("\x1b[1;31mFAILED!\x1b[0m rest"), "FAILED! rest");
    }

    #[test]
    fn test_strip_ansi_osc_title() {
        assert_eq!(strip_ansi("\x1b]0;title\x07body"), "body");
    }

    #[test]
    fn test_relay_in_order_no_dup_no_gap() {
        let mut relay = LogRelay::new(false);
        let mut sink = MemorySink::new();

        relay.relay("line1\n", &mut sink, false).unwrap();
        relay.relay("line1\nline2\nline3\n", &mut sink, false).unwrap();
        relay.relay("line1\nline2\nline3\n", &mut sink, false).unwrap();
        relay.relay("line1\nline2\nline3\nline4\n", &mut sink, true).unwrap();

        assert_eq!(sink.lines(), &["line1", "line2", "line3", "line4"]);
    }

    #[test]
    fn test_relay_holds_partial_line() {
        let mut relay = LogRelay::new(false);
        let mut sink = MemorySink::new();

        relay.relay("comp", &mut sink, false).unwrap();
        assert!(sink.lines().is_empty());

        relay.relay("complete line\npart", &mut sink, false).unwrap();
        assert_eq!(sink.lines(), &["complete line"]);

        // Terminal flush pushes out the remainder even without a newline
        relay.relay("complete line\npartial tail", &mut sink, true).unwrap();
        assert_eq!(sink.lines(), &["complete line", "partial tail"]);
    }

    #[test]
    fn test_relay_strips_color_when_asked() {
        let mut relay = LogRelay::new(true);
        let mut sink = MemorySink::new();

        relay
            .relay("\x1b[0;33mchanged: [web01]\x1b[0m\n", &mut sink, true)
            .unwrap();
        assert_eq!(sink.lines(), &["changed: [web01]"]);
    }

    #[test]
    fn test_relay_handles_crlf() {
        let mut relay = LogRelay::new(false);
        let mut sink = MemorySink::new();

        relay.relay("one\r\ntwo\r\n", &mut sink, true).unwrap();
        assert_eq!(sink.lines(), &["one", "two"]);
    }

    #[test]
    fn test_relay_resets_on_shrunk_snapshot() {
        let mut relay = LogRelay::new(false);
        let mut sink = MemorySink::new();

        relay.relay("aaa\nbbb\n", &mut sink, false).unwrap();
        relay.relay("ccc\n", &mut sink, true).unwrap();
        assert_eq!(sink.lines(), &["aaa", "bbb", "ccc"]);
    }

    #[test]
    fn test_relay_resets_on_rewritten_multibyte_snapshot() {
        let mut relay = LogRelay::new(false);
        let mut sink = MemorySink::new();

        // 5 bytes emitted; the rewritten snapshot has a character boundary
        // straddling byte 5.
        relay.relay("abcd\n", &mut sink, false).unwrap();
        relay.relay("日本\n", &mut sink, true).unwrap();
        assert_eq!(sink.lines(), &["abcd", "日本"]);
    }

    #[test]
    fn test_writer_sink_appends_newlines() {
        let mut sink = WriterSink::new(Vec::new());
        sink.write_line("alpha").unwrap();
        sink.write_line("beta").unwrap();
        assert_eq!(sink.into_inner(), b"alpha\nbeta\n");
    }

    #[test]
    fn test_writer_sink_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.log");
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut sink = WriterSink::new(file);
            sink.write_line("synced").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "synced\n");
    }
}
