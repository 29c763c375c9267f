//! Reassembly of raw serial bytes into logical lines.
//!
//! Serial output arrives in arbitrary chunks; a terminator may straddle two
//! reads. The splitter buffers bytes until a full terminator sequence is seen.

/// Splits a byte stream on an arbitrary terminator sequence.
#[derive(Debug)]
pub struct LineSplitter {
    terminator: Vec<u8>,
    buffer: Vec<u8>,
    /// Offset from which the next terminator search starts.
    scanned: usize,
}

impl LineSplitter {
    /// Create a splitter. An empty terminator falls back to `\n`.
    pub fn new(terminator: &[u8]) -> Self {
        let terminator = if terminator.is_empty() {
            b"\n".to_vec()
        } else {
            terminator.to_vec()
        };
        Self {
            terminator,
            buffer: Vec::new(),
            scanned: 0,
        }
    }

    /// Feed a chunk of bytes, returning every line it completes (terminator
    /// stripped).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let term_len = self.terminator.len();
        let mut start = 0;
        let mut pos = self.scanned;

        while pos + term_len <= self.buffer.len() {
            if self.buffer[pos..pos + term_len] == self.terminator[..] {
                lines.push(String::from_utf8_lossy(&self.buffer[start..pos]).into_owned());
                pos += term_len;
                start = pos;
            } else {
                pos += 1;
            }
        }

        self.buffer.drain(..start);
        // A terminator prefix may sit at the tail; rescan it next time.
        self.scanned = self.buffer.len().saturating_sub(term_len - 1);
        lines
    }

    /// Bytes received after the last terminator.
    pub fn remainder(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_crlf_only() {
        let mut s = LineSplitter::new(b"\r\n");
        let lines = s.push(b"12%\r34%\r100% done\r\nnext\r\n");
        assert_eq!(lines, vec!["12%\r34%\r100% done", "next"]);
        assert_eq!(s.remainder(), "");
    }

    #[test]
    fn terminator_split_across_chunks() {
        let mut s = LineSplitter::new(b"\r\n");
        assert!(s.push(b"Please power").is_empty());
        assert!(s.push(b" the target now\r").is_empty());
        assert_eq!(s.push(b"\nrest"), vec!["Please power the target now"]);
        assert_eq!(s.remainder(), "rest");
    }

    #[test]
    fn bare_newline_is_not_a_crlf_terminator() {
        let mut s = LineSplitter::new(b"\r\n");
        assert!(s.push(b"a\nb").is_empty());
        assert_eq!(s.remainder(), "a\nb");
    }

    #[test]
    fn empty_lines_are_kept() {
        let mut s = LineSplitter::new(b"\n");
        assert_eq!(s.push(b"\n\nx\n"), vec!["", "", "x"]);
    }

    #[test]
    fn empty_terminator_defaults_to_newline() {
        let mut s = LineSplitter::new(b"");
        assert_eq!(s.push(b"a\nb\n"), vec!["a", "b"]);
    }
}
