use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// Rewrites one rendered log line, e.g. wrapping it in ANSI color codes.
pub type ModifierFn = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

struct WriterState {
    modifier: Option<ModifierFn>,
    sink: Box<dyn Write + Send>,
}

/// Byte sink that runs the currently selected [`ModifierFn`] over every
/// write before forwarding it.
///
/// Clones share the same sink and selection. The selection is made through
/// [`ModifierWriter::select`], whose guard keeps every other thread out
/// until it is dropped. Writes from the thread holding the guard go
/// through, so a handler invoked under the guard can write normally.
#[derive(Clone)]
pub struct ModifierWriter {
    inner: Arc<ReentrantMutex<RefCell<WriterState>>>,
}

impl ModifierWriter {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        ModifierWriter {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(WriterState {
                modifier: None,
                sink: Box::new(sink),
            }))),
        }
    }

    /// Locks the writer and selects `modifier` (`None` for identity) until
    /// the returned guard is dropped.
    pub fn select(&self, modifier: Option<ModifierFn>) -> ModifierGuard<'_> {
        let guard = self.inner.lock();
        guard.borrow_mut().modifier = modifier;
        ModifierGuard { guard }
    }
}

impl fmt::Debug for ModifierWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierWriter").finish_non_exhaustive()
    }
}

/// Holds the [`ModifierWriter`] lock; clears the selection on drop.
pub struct ModifierGuard<'a> {
    guard: ReentrantMutexGuard<'a, RefCell<WriterState>>,
}

impl Drop for ModifierGuard<'_> {
    fn drop(&mut self) {
        self.guard.borrow_mut().modifier = None;
    }
}

impl Write for ModifierWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        let WriterState { modifier, sink } = &mut *state;
        match modifier {
            None => sink.write(buf),
            Some(f) => {
                sink.write_all(&f(buf))?;
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        state.sink.flush()
    }
}

/// Builder for ANSI color modifiers.
///
/// ```
/// use colored::Color;
/// use tracing_log_middleware::modifier::Paint;
///
/// let warn = Paint::fg(Color::Yellow).modifier();
/// let error = Paint::fg(Color::Red).bold().modifier();
/// # let _ = (warn, error);
/// ```
#[cfg(feature = "color")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Paint {
    fg: Option<colored::Color>,
    bg: Option<colored::Color>,
    bold: bool,
}

#[cfg(feature = "color")]
impl Paint {
    pub fn fg(color: colored::Color) -> Self {
        Paint { fg: Some(color), ..Paint::default() }
    }

    pub fn on(self, color: colored::Color) -> Self {
        Paint { bg: Some(color), ..self }
    }

    pub fn bold(self) -> Self {
        Paint { bold: true, ..self }
    }

    /// Wraps `line` in the escape codes for this paint. Lines that are not
    /// valid UTF-8 are returned unchanged.
    pub fn paint(&self, line: &[u8]) -> Vec<u8> {
        use colored::Colorize;

        let Ok(text) = std::str::from_utf8(line) else {
            return line.to_vec();
        };
        let mut s = text.normal();
        if let Some(fg) = self.fg {
            s = s.color(fg);
        }
        if let Some(bg) = self.bg {
            s = s.on_color(bg);
        }
        if self.bold {
            s = s.bold();
        }
        s.to_string().into_bytes()
    }

    pub fn modifier(self) -> ModifierFn {
        Arc::new(move |line: &[u8]| self.paint(line))
    }
}

/// Shorthand for `Paint::fg(color).modifier()`.
#[cfg(feature = "color")]
pub fn color(color: colored::Color) -> ModifierFn {
    Paint::fg(color).modifier()
}
