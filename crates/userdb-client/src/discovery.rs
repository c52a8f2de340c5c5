//! Availability probe for the multiplexer socket.

use std::path::{Path, PathBuf};

/// Returns `path` when something exists there.
///
/// The probe does not connect; a stale socket file still counts as present
/// and surfaces later as a connect error.
#[must_use]
pub fn probe_service_socket(path: &Path) -> Option<PathBuf> {
    path.try_exists()
        .unwrap_or(false)
        .then(|| path.to_path_buf())
}
