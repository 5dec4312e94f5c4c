//! An owning view over a retained multi-selection response.

use std::path::PathBuf;

use zbus::message::Message;

use crate::error::Error;
use crate::response;

/// The paths of a multi-selection dialog, backed by the response message
/// itself.
///
/// Nothing is decoded up front: each access walks the retained message and
/// hands out a freshly decoded owned path. The message is released when the
/// set is dropped.
pub struct PathSet {
    msg: Message,
}

impl PathSet {
    /// The caller validated the message shape before retaining it.
    pub(crate) fn new(msg: Message) -> Self {
        Self { msg }
    }

    pub fn count(&self) -> usize {
        response::uri_count(&self.msg)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Decode the path at `index`; out of range is an argument error.
    pub fn get(&self, index: usize) -> Result<PathBuf, Error> {
        response::uri_at(&self.msg, index)
    }

    pub fn iter(&self) -> PathSetIter<'_> {
        PathSetIter {
            set: self,
            index: 0,
        }
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = Result<PathBuf, Error>;
    type IntoIter = PathSetIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Cursor over a [`PathSet`], yielding decoded paths in selection order.
pub struct PathSetIter<'a> {
    set: &'a PathSet,
    index: usize,
}

impl Iterator for PathSetIter<'_> {
    type Item = Result<PathBuf, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.set.count() {
            return None;
        }
        let item = self.set.get(self.index);
        self.index += 1;
        Some(item)
    }
}
