//! Reassemble shell output into lines.

/// Line terminator emitted by the shell.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Accumulates raw reads and splits them into lines on demand.
///
/// Every call to [LineAssembler::lines] splits the whole buffer
/// again, so the trailing lines are re-evaluated as partial output
/// is completed by later reads.
#[derive(Debug, Default, Clone)]
pub struct LineAssembler {
    text: String,
}

impl LineAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes.
    ///
    /// Each byte is taken as one character (Latin-1), the data is
    /// not validated as UTF-8.
    pub fn append(&mut self, bytes: &[u8]) {
        self.text.extend(bytes.iter().map(|&b| char::from(b)));
    }

    /// Split the accumulated text into lines.
    ///
    /// Text after the last terminator is returned as the final line,
    /// which is empty when the buffer ends with a terminator.
    pub fn lines(&self) -> Vec<&str> {
        self.text.split(LINE_TERMINATOR).collect()
    }

    /// Accumulated text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of characters accumulated.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Discard the accumulated text.
    pub fn clear(&mut self) {
        self.text.clear();
    }
}
