//! Remote manifest resolution.

use crate::error::EngineResult;
use crate::snapshot::Snapshot;
use crate::transport::DavTransport;
use prompthub_sync_protocol::{BackupManifest, Section};

/// Result of comparing the local snapshot against the remote manifest.
#[derive(Debug, Clone)]
pub struct ManifestComparison {
    /// The remote manifest, when one exists.
    pub remote: Option<BackupManifest>,
    /// Sections whose fingerprints differ between local and remote.
    ///
    /// Every section when no remote manifest exists yet.
    pub changed_sections: Vec<Section>,
}

impl ManifestComparison {
    /// Returns true when a remote manifest exists and nothing differs.
    pub fn unchanged(&self) -> bool {
        self.remote.is_some() && self.changed_sections.is_empty()
    }
}

/// Fetches the manifest at `path` and diffs it against `snapshot`.
///
/// A missing manifest is the first-sync case, not an error: the remote
/// has no usable backup state and every section counts as changed. Any
/// other failure, auth included, propagates.
pub fn resolve_manifest<T: DavTransport>(
    transport: &T,
    path: &str,
    snapshot: &Snapshot,
) -> EngineResult<ManifestComparison> {
    let bytes = match transport.get(path) {
        Ok(bytes) => bytes,
        Err(err) if err.is_not_found() => {
            return Ok(ManifestComparison {
                remote: None,
                changed_sections: Section::ALL.to_vec(),
            });
        }
        Err(err) => return Err(err),
    };

    let remote = BackupManifest::from_json_bytes(&bytes)?;
    let changed_sections = snapshot.manifest.changed_sections(&remote);
    Ok(ManifestComparison { remote: Some(remote), changed_sections })
}
