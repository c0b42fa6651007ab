//! Export records: the unit of atomic output.

/// An ordered group of output lines belonging to one group, track or user.
///
/// A record is built by a single owner and then handed to the
/// [`RecordSink`](crate::sink::RecordSink), which writes all of its lines
/// without interleaving them with any other record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRecord {
    lines: Vec<String>,
}

impl ExportRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: Into<String>>(&mut self, line: S) {
        self.lines.push(line.into());
    }

    /// Append an empty separator line.
    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExportRecord {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ExportRecord {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}
