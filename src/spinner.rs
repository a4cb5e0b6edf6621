use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveToColumn, Show};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

/// Frames cycled through, one per render.
pub const FRAMES: [char; 4] = ['-', '\\', '|', '/'];

/// A one-line progress indicator: the message followed by a spinning frame.
///
/// The cursor is hidden while the spinner is active. [`finish`] erases the
/// line and shows the cursor again; dropping the spinner does the same, so the
/// terminal is left usable whichever way supervision ends.
///
/// [`finish`]: Spinner::finish
pub struct Spinner<W: Write> {
    out: W,
    message: String,
    frame: usize,
    enabled: bool,
    active: bool,
}

impl<W: Write> Spinner<W> {
    pub fn new(out: W, message: impl Into<String>) -> Self {
        Self {
            out,
            message: message.into(),
            frame: 0,
            enabled: true,
            active: false,
        }
    }

    /// A spinner that never writes anything, for plain waiting.
    pub fn disabled(out: W) -> Self {
        Self {
            out,
            message: String::new(),
            frame: 0,
            enabled: false,
            active: false,
        }
    }

    #[cfg(test)]
    const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Index of the frame the next [`render`](Self::render) draws.
    #[cfg(test)]
    const fn frame(&self) -> usize {
        self.frame
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }

        self.active = true;
        queue!(self.out, Hide)?;
        self.out.flush()
    }

    /// Redraws the line with the current frame, then advances to the next.
    pub fn render(&mut self) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }

        self.active = true;
        let message = &self.message;
        let frame = FRAMES[self.frame];
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::UntilNewLine),
            Print(message),
            Print(' '),
            Print(frame)
        )?;
        self.out.flush()?;
        self.frame = (self.frame + 1) % FRAMES.len();
        Ok(())
    }

    /// Erases the line and shows the cursor. Only the first call writes.
    pub fn finish(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        self.active = false;
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::UntilNewLine),
            Show
        )?;
        self.out.flush()
    }

    /// Stops drawing for good, restoring the terminal first.
    pub fn disable(&mut self) {
        let _ = self.finish();
        self.enabled = false;
    }
}

impl<W: Write> Drop for Spinner<W> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
