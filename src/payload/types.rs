use bytes::Bytes;
use std::fmt;

/// Immutable byte content moved through one upload/download cycle.
///
/// Cloning is cheap (reference counted), so a single payload is shared by
/// every worker and every repetition of a run.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Payload(Bytes);

impl Payload {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// BLAKE3 digest of the content, used to describe mismatches compactly
    pub fn checksum(&self) -> [u8; 32] {
        *blake3::hash(&self.0).as_bytes()
    }

    /// Hex form of the first 8 digest bytes
    pub fn short_checksum(&self) -> String {
        blake3::hash(&self.0).to_hex()[..16].to_string()
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}

impl From<Bytes> for Payload {
    fn from(data: Bytes) -> Self {
        Self(data)
    }
}

impl From<&'static [u8]> for Payload {
    fn from(data: &'static [u8]) -> Self {
        Self(Bytes::from_static(data))
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("len", &self.0.len())
            .field("blake3", &self.short_checksum())
            .finish()
    }
}
