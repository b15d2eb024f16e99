//! Content fingerprints for section-level change detection.

use crate::error::ProtocolResult;
use crate::manifest::Section;
use crate::payload::BackupPayload;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Serializes a value to canonical JSON bytes.
///
/// Canonical means struct fields in declaration order and map entries in
/// `BTreeMap` key order, so equal values always produce identical bytes.
pub fn canonical_json<T: Serialize>(value: &T) -> ProtocolResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Returns the lowercase hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02x}", byte);
    }
    out
}

/// Computes one fingerprint per logical section of `payload`.
///
/// Absent optional sections hash their JSON `null` encoding, so the map
/// always carries all six entries and payloads with the same absent
/// sections compare equal.
pub fn section_fingerprints(
    payload: &BackupPayload,
) -> ProtocolResult<BTreeMap<Section, String>> {
    let mut fingerprints = BTreeMap::new();
    fingerprints.insert(
        Section::Prompts,
        sha256_hex(&canonical_json(&payload.prompts)?),
    );
    fingerprints.insert(
        Section::Folders,
        sha256_hex(&canonical_json(&payload.folders)?),
    );
    fingerprints.insert(
        Section::Versions,
        sha256_hex(&canonical_json(&payload.versions)?),
    );
    fingerprints.insert(
        Section::Images,
        sha256_hex(&canonical_json(&payload.images)?),
    );
    fingerprints.insert(
        Section::AiConfig,
        sha256_hex(&canonical_json(&payload.ai_config)?),
    );
    fingerprints.insert(
        Section::Settings,
        sha256_hex(&canonical_json(&payload.settings)?),
    );
    Ok(fingerprints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Prompt;
    use chrono::{DateTime, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn prompt(id: &str) -> Prompt {
        Prompt {
            id: id.into(),
            title: "title".into(),
            content: "content".into(),
            folder_id: None,
            tags: Vec::new(),
            images: Vec::new(),
            favorite: false,
            created_at: t(0),
            updated_at: t(0),
        }
    }

    #[test]
    fn sha256_known_vectors() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn fingerprints_cover_every_section() {
        let payload = BackupPayload::new(t(0));
        let fingerprints = section_fingerprints(&payload).unwrap();
        assert_eq!(fingerprints.len(), Section::ALL.len());
        for section in Section::ALL {
            assert!(fingerprints.contains_key(&section));
        }
    }

    #[test]
    fn equal_payloads_fingerprint_identically() {
        let mut a = BackupPayload::new(t(10));
        a.prompts = vec![prompt("p1")];
        let b = a.clone();

        assert_eq!(
            section_fingerprints(&a).unwrap(),
            section_fingerprints(&b).unwrap()
        );
    }

    #[test]
    fn only_the_changed_section_changes() {
        let mut before = BackupPayload::new(t(10));
        before.prompts = vec![prompt("p1")];

        let mut after = before.clone();
        after.prompts[0].content = "edited".into();

        let fp_before = section_fingerprints(&before).unwrap();
        let fp_after = section_fingerprints(&after).unwrap();

        assert_ne!(fp_before[&Section::Prompts], fp_after[&Section::Prompts]);
        for section in Section::ALL.into_iter().filter(|s| *s != Section::Prompts) {
            assert_eq!(fp_before[&section], fp_after[&section]);
        }
    }
}
