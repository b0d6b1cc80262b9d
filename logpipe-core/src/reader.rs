// logpipe-core/src/reader.rs
//! Streaming, budget-enforcing reader for raw log content.
//!
//! `BoundedReader` decodes a UTF-8 byte source into characters and stops as
//! soon as the configured byte or line budget is spent, so a multi-gigabyte log
//! is never materialized just to be cut down to the collector's limits. It can
//! also drop leading whitespace while streaming.
//!
//! Truncation never splits a character: a character is only emitted when its
//! complete UTF-8 encoding still fits the remaining byte budget. Once a cutoff
//! happens the reader is finished, independent of how many characters each
//! `read` call asked for.
//!
//! License: MIT OR APACHE 2.0

use std::io::{self, BufRead};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, trace};

use crate::errors::{LogPipeError, Result};

/// Number of characters pulled per `read` call by [`BoundedReader::read_to_string`].
pub const DEFAULT_CHUNK_CHARS: usize = 8192;

/// Remaining byte/line allowance of one [`BoundedReader`].
///
/// `None` limits are unlimited. The budget is owned by exactly one reader and
/// is only mutated while that reader's lock is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    remaining_bytes: Option<usize>,
    remaining_lines: Option<usize>,
    trimming: bool,
    finished: bool,
}

/// What the reader should do with a character after charging it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Emit,
    Skip,
    Cutoff,
}

impl Budget {
    pub fn new(max_bytes: Option<usize>, max_lines: Option<usize>, trim: bool) -> Self {
        Self {
            remaining_bytes: max_bytes,
            remaining_lines: max_lines,
            trimming: trim,
            finished: false,
        }
    }

    /// A budget with no limits and no trimming.
    pub fn unlimited() -> Self {
        Self::new(None, None, false)
    }

    pub fn remaining_bytes(&self) -> Option<usize> {
        self.remaining_bytes
    }

    pub fn remaining_lines(&self) -> Option<usize> {
        self.remaining_lines
    }

    /// True once a cutoff happened or the last allowed newline was consumed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Charges `c` against the budget.
    ///
    /// Every character costs its exact UTF-8 width, so a 3-byte character such
    /// as `€` costs 3 bytes, not the 2 bytes of a UTF-16 unit. The output
    /// therefore never exceeds the byte limit.
    ///
    /// Whitespace dropped by trimming is charged like any other character;
    /// the truncation offsets of existing uploads depend on it. Only code
    /// points up to U+0020 count as whitespace here.
    fn admit(&mut self, c: char) -> Admission {
        if self.finished {
            return Admission::Cutoff;
        }

        if let Some(bytes) = self.remaining_bytes {
            // A character is admitted whole or not at all.
            let width = c.len_utf8();
            if bytes == 0 || width > bytes {
                self.finished = true;
                return Admission::Cutoff;
            }
            self.remaining_bytes = Some(bytes - width);
        }

        if c == '\n' {
            if let Some(lines) = self.remaining_lines {
                let left = lines.saturating_sub(1);
                self.remaining_lines = Some(left);
                if left == 0 {
                    self.finished = true;
                }
            }
        }

        if self.trimming {
            if is_trimmable(c) {
                return Admission::Skip;
            }
            self.trimming = false;
        }

        Admission::Emit
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// C0 control characters and space; other Unicode whitespace is content.
pub(crate) fn is_trimmable(c: char) -> bool {
    c <= ' '
}

/// Width of the UTF-8 sequence introduced by `lead`, or 0 for a byte that
/// cannot start a sequence.
fn sequence_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Incremental UTF-8 decoder over a `BufRead`.
///
/// Malformed sequences decode to U+FFFD, matching a lossy conversion of the
/// whole input. Sequences split across buffer refills are carried over.
struct Utf8Chars<R> {
    inner: R,
    pending: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl<R: BufRead> Utf8Chars<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            pos: 0,
            eof: false,
        }
    }

    fn refill(&mut self) -> io::Result<()> {
        self.pending.drain(..self.pos);
        self.pos = 0;
        loop {
            let chunk = match self.inner.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if chunk.is_empty() {
                self.eof = true;
                return Ok(());
            }
            let n = chunk.len();
            self.pending.extend_from_slice(chunk);
            self.inner.consume(n);
            return Ok(());
        }
    }

    fn next_char(&mut self) -> io::Result<Option<char>> {
        loop {
            let available = &self.pending[self.pos..];
            let Some(&lead) = available.first() else {
                if self.eof {
                    return Ok(None);
                }
                self.refill()?;
                continue;
            };

            let width = sequence_width(lead);
            if width == 0 {
                self.pos += 1;
                return Ok(Some(char::REPLACEMENT_CHARACTER));
            }

            if available.len() < width {
                if !self.eof {
                    self.refill()?;
                    continue;
                }
                // Truncated or malformed sequence at end of input. Only the
                // bytes that belong to it are replaced.
                let skip = match std::str::from_utf8(available) {
                    Ok(_) => available.len(),
                    Err(e) => e.error_len().unwrap_or(available.len()),
                };
                self.pos += skip.max(1);
                return Ok(Some(char::REPLACEMENT_CHARACTER));
            }

            match std::str::from_utf8(&available[..width]) {
                Ok(s) => {
                    self.pos += width;
                    return Ok(s.chars().next());
                }
                Err(e) => {
                    self.pos += e.error_len().unwrap_or(width).max(1);
                    return Ok(Some(char::REPLACEMENT_CHARACTER));
                }
            }
        }
    }
}

struct ReaderState<R> {
    chars: Utf8Chars<R>,
    budget: Budget,
}

/// A character-stream decorator enforcing byte and line budgets.
///
/// All state sits behind a mutex, so a reader shared between threads
/// serializes `read` and `close`. After `close`, every call fails with
/// [`LogPipeError::StreamClosed`].
pub struct BoundedReader<R> {
    state: Mutex<Option<ReaderState<R>>>,
}

impl<R: BufRead> BoundedReader<R> {
    pub fn new(inner: R, budget: Budget) -> Self {
        Self {
            state: Mutex::new(Some(ReaderState {
                chars: Utf8Chars::new(inner),
                budget,
            })),
        }
    }

    pub fn with_limits(
        inner: R,
        max_bytes: Option<usize>,
        max_lines: Option<usize>,
        trim: bool,
    ) -> Self {
        Self::new(inner, Budget::new(max_bytes, max_lines, trim))
    }

    fn lock(&self) -> MutexGuard<'_, Option<ReaderState<R>>> {
        // A panic mid-read leaves the budget consistent; keep going.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends up to `max_chars` characters to `buf`.
    ///
    /// Returns `Ok(None)` at end of stream, which includes every call after
    /// the budget ran out. `max_chars == 0` returns `Ok(Some(0))`.
    pub fn read(&self, buf: &mut String, max_chars: usize) -> Result<Option<usize>> {
        let mut guard = self.lock();
        let state = guard.as_mut().ok_or(LogPipeError::StreamClosed)?;

        if max_chars == 0 {
            return Ok(Some(0));
        }

        let mut produced = 0;
        while produced < max_chars && !state.budget.is_finished() {
            let Some(c) = state.chars.next_char()? else {
                break;
            };
            match state.budget.admit(c) {
                Admission::Emit => {
                    buf.push(c);
                    produced += 1;
                }
                Admission::Skip => {}
                Admission::Cutoff => {
                    trace!("Budget exhausted before {:?}", c);
                    break;
                }
            }
        }

        if produced == 0 {
            return Ok(None);
        }
        Ok(Some(produced))
    }

    /// Drains the reader into a new string.
    pub fn read_to_string(&self) -> Result<String> {
        let mut out = String::new();
        while self.read(&mut out, DEFAULT_CHUNK_CHARS)?.is_some() {}
        debug!("Bounded read produced {} bytes.", out.len());
        Ok(out)
    }

    /// Snapshot of the current budget.
    pub fn budget(&self) -> Result<Budget> {
        let guard = self.lock();
        guard
            .as_ref()
            .map(|state| state.budget)
            .ok_or(LogPipeError::StreamClosed)
    }

    /// Releases the underlying source. Fails if the reader was already closed.
    pub fn close(&self) -> Result<()> {
        match self.lock().take() {
            Some(state) => {
                drop(state);
                Ok(())
            }
            None => Err(LogPipeError::StreamClosed),
        }
    }
}
