use crate::naming::FileKind;
use derive_more::Display;
use shutter_storage::FileInfo;
use time::OffsetDateTime;

/// One of the two places files can live.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Location {
    /// Sandboxed store; always present.
    #[display("internal")]
    Internal,
    /// User-visible directory; present only when the host exposes one.
    #[display("external")]
    External,
}

/// A file in one of the managed locations.
#[derive(Clone, Debug)]
pub struct StoredFile {
    pub location: Location,
    pub name: String,
    pub size: u64,
    pub modified: OffsetDateTime,
}
impl StoredFile {
    pub(crate) fn new(location: Location, info: FileInfo) -> Self {
        Self {
            location,
            name: info.name,
            size: info.size,
            modified: info.modified,
        }
    }

    pub fn kind(&self) -> FileKind {
        FileKind::of(&self.name)
    }
}

/// Files are identified by where they are, not by their metadata.
impl PartialEq for StoredFile {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location && self.name == other.name
    }
}
impl Eq for StoredFile {}
