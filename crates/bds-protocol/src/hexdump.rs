//! Fixed-window hex/ASCII rendering around a failure offset.
//!
//! The window is at most [`MAX_ROWS`] rows of [`BYTES_PER_ROW`] bytes,
//! centered on the cursor and aligned to a row boundary. Bytes before the
//! cursor were consumed; the byte at the cursor is where decoding stopped.
//!
//! `{}` renders plain text with a caret line under the cursor byte. `{:#}`
//! additionally colors consumed bytes with ANSI escapes for terminal output.

use std::fmt;

pub const BYTES_PER_ROW: usize = 32;
pub const MAX_ROWS: usize = 12;

const ADDRESS_WIDTH: usize = 12;
const RED_BOLD: &str = "\x1b[1;31m";
const INVERSE: &str = "\x1b[7m";
const RESET: &str = "\x1b[0m";

/// A captured slice of a buffer around a cursor position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HexDump {
    start: usize,
    bytes: Vec<u8>,
    cursor: usize,
}

impl HexDump {
    /// Copy the window around `cursor` out of `buf`.
    #[must_use]
    pub fn capture(buf: &[u8], cursor: usize) -> Self {
        let window = BYTES_PER_ROW * MAX_ROWS;

        let mut start = cursor.saturating_sub(window / 2);
        if start + window > buf.len() {
            // Round up so the last window still reaches the buffer end.
            start = buf
                .len()
                .saturating_sub(window)
                .next_multiple_of(BYTES_PER_ROW);
        } else {
            start -= start % BYTES_PER_ROW;
        }
        let end = (start + window).min(buf.len());

        Self {
            start,
            bytes: buf.get(start..end).unwrap_or_default().to_vec(),
            cursor,
        }
    }

    /// Absolute offset of the first captured byte.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Absolute offset decoding stopped at.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.bytes.len().div_ceil(BYTES_PER_ROW)
    }

    fn column_of(index: usize) -> usize {
        ADDRESS_WIDTH + index * 3 + if index >= BYTES_PER_ROW / 2 { 2 } else { 0 }
    }

    fn write_header(f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:ADDRESS_WIDTH$}", "")?;
        for i in 0..BYTES_PER_ROW {
            if i == BYTES_PER_ROW / 2 {
                f.write_str("  ")?;
            }
            write!(f, "{i:02X} ")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for HexDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color = f.alternate();
        Self::write_header(f)?;

        for (row, chunk) in self.bytes.chunks(BYTES_PER_ROW).enumerate() {
            let row_start = self.start + row * BYTES_PER_ROW;
            write!(f, "0x{row_start:08X}  ")?;

            let mut ascii = String::with_capacity(BYTES_PER_ROW);
            for i in 0..BYTES_PER_ROW {
                if i == BYTES_PER_ROW / 2 {
                    f.write_str("  ")?;
                }
                let Some(&byte) = chunk.get(i) else {
                    f.write_str("   ")?;
                    ascii.push(' ');
                    continue;
                };

                let offset = row_start + i;
                let style = match offset.cmp(&self.cursor) {
                    _ if !color => None,
                    std::cmp::Ordering::Less => Some(RED_BOLD),
                    std::cmp::Ordering::Equal => Some(INVERSE),
                    std::cmp::Ordering::Greater => None,
                };
                match style {
                    Some(style) => write!(f, "{style}{byte:02X}{RESET} ")?,
                    None => write!(f, "{byte:02X} ")?,
                }
                ascii.push(if byte.is_ascii_graphic() || byte == b' ' {
                    byte as char
                } else {
                    '.'
                });
            }
            writeln!(f, "|{ascii}|")?;

            if (row_start..row_start + chunk.len()).contains(&self.cursor) {
                let column = Self::column_of(self.cursor - row_start);
                writeln!(f, "{:column$}^^", "")?;
            }
        }

        Ok(())
    }
}
