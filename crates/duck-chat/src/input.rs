//! Line-oriented user input.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// Reads user messages one line at a time.
///
/// Create it once and keep it for the whole session. The underlying reader
/// buffers ahead, so a new reader per line would lose piped input.
pub struct LineReader<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Wraps a buffered reader.
    #[inline]
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Returns the next line without its line ending.
    ///
    /// Returns `None` at the end of input, and also after a read error,
    /// which is logged.
    pub async fn next_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(err) => {
                error!("error reading input: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_every_buffered_line() {
        let input: &[u8] = b"first question\r\nsecond question\nno newline";
        let mut reader = LineReader::new(input);

        assert_eq!(reader.next_line().await.as_deref(), Some("first question"));
        assert_eq!(reader.next_line().await.as_deref(), Some("second question"));
        assert_eq!(reader.next_line().await.as_deref(), Some("no newline"));
        assert_eq!(reader.next_line().await, None);
        assert_eq!(reader.next_line().await, None);
    }
}
