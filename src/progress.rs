//! Spinner for long waits, plus a tracing writer that prints log lines above it.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

/// Ticking spinner with a message; hidden when `enabled` is false
pub fn spinner(message: impl Into<String>, enabled: bool) -> ProgressBar {
    if !enabled || multi_progress().is_hidden() {
        return ProgressBar::hidden();
    }

    let bar = multi_progress().add(ProgressBar::new_spinner());
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Hands out log writers. Lines go above the spinners on an interactive
/// terminal and straight to stderr everywhere else (pipes, files, containers).
#[derive(Clone)]
pub struct LogWriterFactory {
    progress: MultiProgress,
}

impl Default for LogWriterFactory {
    fn default() -> Self {
        Self::with_progress(multi_progress().clone())
    }
}

impl LogWriterFactory {
    pub fn with_progress(progress: MultiProgress) -> Self {
        Self { progress }
    }
}

enum LogTarget {
    Progress(MultiProgress),
    Stream(Box<dyn Write + Send>),
}

/// Buffers partial writes and emits whole lines to its target
pub struct LogWriter {
    pending: String,
    target: LogTarget,
}

impl LogWriter {
    fn new(target: LogTarget) -> Self {
        Self {
            pending: String::new(),
            target,
        }
    }

    fn emit(&mut self, line: &str) {
        let line = line.trim_end_matches('\r');
        match &mut self.target {
            LogTarget::Progress(mp) if !mp.is_hidden() => {
                let _ = mp.println(line);
            }
            // A hidden draw target swallows println
            LogTarget::Progress(_) => {
                let _ = writeln!(io::stderr(), "{}", line);
            }
            LogTarget::Stream(out) => {
                let _ = writeln!(out, "{}", line);
            }
        }
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.push_str(&String::from_utf8_lossy(buf));

        while let Some(idx) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=idx).collect();
            self.emit(line.trim_end_matches('\n'));
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.emit(&line);
        }
        if let LogTarget::Stream(out) = &mut self.target {
            out.flush()?;
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        if self.progress.is_hidden() {
            LogWriter::new(LogTarget::Stream(Box::new(io::stderr())))
        } else {
            LogWriter::new(LogTarget::Progress(self.progress.clone()))
        }
    }
}
