/// An opaque, resumable position within a scan.
///
/// A cursor identifies the record an iterator was positioned on when the
/// cursor was taken. Only the producer that issued a cursor can interpret
/// it; passing it back to the same kind of scan resumes strictly after that
/// record. An empty cursor means the iterator was not positioned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Cursor(Vec<u8>);

impl Cursor {
    /// The empty cursor, issued by unpositioned iterators.
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Returns `true` if the cursor does not identify a position.
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw cursor bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the cursor, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Cursor {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Cursor {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Cursor {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
