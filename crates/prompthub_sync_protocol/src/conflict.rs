//! Sync direction decision.

use crate::manifest::BackupManifest;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Direction chosen for one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Local replica is newer; push it.
    Upload,
    /// Remote replica is newer; fetch it.
    Download,
    /// Both replicas carry the same stamp; nothing to transfer.
    NoOp,
}

/// Decides the direction for one sync run.
///
/// Last-writer-wins at whole-payload granularity: the replica with the
/// later `exported_at` overwrites the other in full. A missing remote
/// manifest means no backup exists yet, which always uploads.
pub fn decide(local_latest: DateTime<Utc>, remote: Option<&BackupManifest>) -> SyncDirection {
    match remote {
        None => SyncDirection::Upload,
        Some(manifest) => match local_latest.cmp(&manifest.exported_at) {
            Ordering::Greater => SyncDirection::Upload,
            Ordering::Less => SyncDirection::Download,
            Ordering::Equal => SyncDirection::NoOp,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::SCHEMA_VERSION;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn manifest_at(secs: i64) -> BackupManifest {
        BackupManifest {
            version: SCHEMA_VERSION,
            exported_at: t(secs),
            section_fingerprints: BTreeMap::new(),
        }
    }

    #[test]
    fn no_remote_always_uploads() {
        assert_eq!(decide(t(0), None), SyncDirection::Upload);
        assert_eq!(decide(t(1_000_000), None), SyncDirection::Upload);
    }

    #[test]
    fn newer_local_uploads() {
        let remote = manifest_at(100);
        assert_eq!(decide(t(200), Some(&remote)), SyncDirection::Upload);
    }

    #[test]
    fn newer_remote_downloads() {
        let remote = manifest_at(300);
        assert_eq!(decide(t(200), Some(&remote)), SyncDirection::Download);
    }

    #[test]
    fn equal_stamps_noop() {
        let remote = manifest_at(200);
        assert_eq!(decide(t(200), Some(&remote)), SyncDirection::NoOp);
    }

    proptest! {
        #[test]
        fn direction_matches_stamp_ordering(
            local in 0i64..4_000_000_000,
            remote in 0i64..4_000_000_000,
        ) {
            let manifest = manifest_at(remote);
            let direction = decide(t(local), Some(&manifest));

            let expected = match local.cmp(&remote) {
                Ordering::Greater => SyncDirection::Upload,
                Ordering::Less => SyncDirection::Download,
                Ordering::Equal => SyncDirection::NoOp,
            };
            prop_assert_eq!(direction, expected);
        }

        #[test]
        fn missing_manifest_uploads_for_any_stamp(local in 0i64..4_000_000_000) {
            prop_assert_eq!(decide(t(local), None), SyncDirection::Upload);
        }
    }
}
