use crate::naming::{TimeZone, parse_timestamp};
use crate::resolve::StoredFile;
use shutter_media::MediaKind;
use time::OffsetDateTime;

/// A primary media file and its optional thumbnail.
#[derive(Debug)]
pub struct Picture {
    file: StoredFile,
    thumbnail: Option<StoredFile>,
    kind: MediaKind,
    timestamp: OffsetDateTime,
}

impl Picture {
    pub(crate) fn new(file: StoredFile, thumbnail: Option<StoredFile>, zone: TimeZone) -> Self {
        Self {
            kind: file.kind().media_kind(),
            timestamp: parse_timestamp(&file.name, zone),
            file,
            thumbnail,
        }
    }

    /// The primary file.
    pub fn file(&self) -> &StoredFile {
        &self.file
    }

    pub fn name(&self) -> &str {
        &self.file.name
    }

    pub fn thumbnail(&self) -> Option<&StoredFile> {
        self.thumbnail.as_ref()
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Capture time, taken from the file name. Names without a timestamp
    /// give the Unix epoch.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }
}

/// Pictures are the same picture when their primary files are.
impl PartialEq for Picture {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file
    }
}
impl Eq for Picture {}
