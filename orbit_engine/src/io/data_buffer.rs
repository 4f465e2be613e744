/// Byte buffers handed out by file systems and consumed by image loaders

use std::sync::Arc;

/// A block of bytes
///
/// `Exclusive` owns its bytes and frees them on drop. `Shared` points into
/// storage owned elsewhere (a file system cache, a static asset) and never
/// frees it on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataBuffer {
    Exclusive(Vec<u8>),
    Shared(Arc<[u8]>),
}

impl DataBuffer {
    pub fn data(&self) -> &[u8] {
        match self {
            DataBuffer::Exclusive(bytes) => bytes,
            DataBuffer::Shared(bytes) => bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Take ownership of the bytes, copying shared storage
    pub fn into_vec(self) -> Vec<u8> {
        match self {
            DataBuffer::Exclusive(bytes) => bytes,
            DataBuffer::Shared(bytes) => bytes.to_vec(),
        }
    }
}

impl From<Vec<u8>> for DataBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        DataBuffer::Exclusive(bytes)
    }
}

impl From<Arc<[u8]>> for DataBuffer {
    fn from(bytes: Arc<[u8]>) -> Self {
        DataBuffer::Shared(bytes)
    }
}

impl AsRef<[u8]> for DataBuffer {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}
