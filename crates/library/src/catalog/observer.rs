use super::Picture;
use std::sync::Arc;

/// Receives changes to the picture catalog.
///
/// Callbacks run while the catalog's list is locked, in the order the
/// changes were applied; they must not call back into the catalog.
pub trait PictureObserver: Send + Sync {
    fn on_picture_added(&self, picture: &Arc<Picture>);

    fn on_picture_deleted(&self, picture: &Arc<Picture>);
}
