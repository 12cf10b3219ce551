//! Bounded in-memory log sink.
//!
//! While the demo owns the alternate screen nothing may be written to the
//! terminal directly, so tracing output is collected here and painted into
//! the log panel instead.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock};

use ratatui::style::Style;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::EitherWriter;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::constants::LOG_BUFFER_LINES;
use crate::layout::Bounds;
use crate::theme;
use crate::ui::UiFrame;

static GLOBAL_LOG: OnceLock<LogBuffer> = OnceLock::new();

/// Install `buffer` as the process-wide sink. Only the first call wins.
pub fn set_global_log_buffer(buffer: LogBuffer) -> bool {
    GLOBAL_LOG.set(buffer).is_ok()
}

pub fn global_log_buffer() -> Option<LogBuffer> {
    GLOBAL_LOG.get().cloned()
}

/// Subscriber writer that follows the global buffer. Events emitted before
/// a buffer is installed go to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalLogSink;

impl<'a> MakeWriter<'a> for GlobalLogSink {
    type Writer = EitherWriter<LogWriter, io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        match global_log_buffer() {
            Some(buffer) => EitherWriter::A(buffer.writer()),
            None => EitherWriter::B(io::stderr()),
        }
    }
}

#[derive(Debug)]
struct Lines {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl Lines {
    fn push_line(&mut self, line: String) {
        self.lines.push_back(line);
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }
}

/// Cheaply clonable handle to a shared ring of log lines.
#[derive(Clone, Debug)]
pub struct LogBuffer {
    inner: Arc<Mutex<Lines>>,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(LOG_BUFFER_LINES)
    }
}

impl LogBuffer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Lines {
                lines: VecDeque::new(),
                max_lines: max_lines.max(1),
            })),
        }
    }

    pub fn push(&self, line: impl Into<String>) {
        if let Ok(mut lines) = self.inner.lock() {
            lines.push_line(line.into());
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|l| l.lines.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The last `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> Vec<String> {
        let Ok(lines) = self.inner.lock() else {
            return Vec::new();
        };
        let skip = lines.lines.len().saturating_sub(count);
        lines.lines.iter().skip(skip).cloned().collect()
    }

    pub fn writer(&self) -> LogWriter {
        LogWriter {
            buffer: self.clone(),
            pending: Vec::new(),
        }
    }

    /// Paint the most recent lines that fit inside a bordered panel.
    pub fn render(&self, frame: &mut UiFrame<'_>, bounds: Bounds) {
        let rows = usize::from(bounds.height.saturating_sub(2));
        let lines: Vec<Line> = self.tail(rows).into_iter().map(Line::from).collect();
        let style = Style::default().fg(theme::log_fg()).bg(theme::log_bg());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::log_highlight()))
            .title(" log ");
        frame.fill(bounds, style);
        frame.render_widget(Paragraph::new(lines).style(style).block(block), bounds);
    }
}

/// `io::Write` adapter that splits on newlines; partial lines wait for the
/// rest or for `flush`.
#[derive(Debug)]
pub struct LogWriter {
    buffer: LogBuffer,
    pending: Vec<u8>,
}

impl LogWriter {
    fn push_complete_lines(&mut self) {
        let Some(pos) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return;
        };
        let drained: Vec<u8> = self.pending.drain(..=pos).collect();
        for line in String::from_utf8_lossy(&drained).split('\n') {
            if !line.is_empty() {
                self.buffer.push(line.to_string());
            }
        }
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.push_complete_lines();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.push_complete_lines();
        if !self.pending.is_empty() {
            let rest = String::from_utf8_lossy(&self.pending).to_string();
            self.pending.clear();
            self.buffer.push(rest);
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
