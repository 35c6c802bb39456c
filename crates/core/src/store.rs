//! Sharded JSON document store.
//!
//! Each collection is a directory of sharded record directories
//! (`<collection>/<s1>/<s2>/<uuid>/<doc>.json`), one JSON document per record.
//! This module owns the low-level concerns all collections share:
//!
//! - atomic per-document writes (temp file, fsync, rename) so a crashed
//!   process never leaves a half-written document behind,
//! - unique record directory allocation with collision retry,
//! - the triple-nested shard walk used for listing,
//! - the single bulk-update primitive ([`update_each`]) used by the
//!   notification tracker.
//!
//! Cross-document atomicity is deliberately not provided; callers only rely on
//! per-document atomicity.

use crate::error::{ClinicError, ClinicResult};
use crate::uuid::RecordUuid;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::{
    fs,
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Serialises `value` and writes it to `path` atomically.
///
/// The document is written to a sibling temp file, flushed to disk, and then
/// renamed over the target. Readers see either the old document or the new
/// one, never a torn write.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> ClinicResult<()> {
    let json = serde_json::to_vec_pretty(value).map_err(ClinicError::Serialization)?;

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp_path).map_err(ClinicError::FileWrite)?;
        file.write_all(&json).map_err(ClinicError::FileWrite)?;
        file.sync_all().map_err(ClinicError::FileWrite)?;
    }
    fs::rename(&tmp_path, path).map_err(ClinicError::FileWrite)?;

    Ok(())
}

/// Reads and deserialises the JSON document at `path`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> ClinicResult<T> {
    let contents = fs::read_to_string(path).map_err(ClinicError::FileRead)?;
    serde_json::from_str(&contents).map_err(ClinicError::Deserialization)
}

/// Returns the document path for `id` within `collection_dir`, without
/// checking existence.
pub(crate) fn document_path(collection_dir: &Path, id: &RecordUuid, doc_name: &str) -> PathBuf {
    id.sharded_dir(collection_dir).join(doc_name)
}

/// Creates a unique sharded record directory within `collection_dir`.
///
/// Generates identifiers from `uuid_source` and guards against pathological
/// UUID collisions (or pre-existing directories from external interference)
/// by retrying up to 5 times.
///
/// # Errors
///
/// Returns [`ClinicError::RecordDirCreation`] if directory creation fails or
/// no unique directory could be allocated.
pub(crate) fn create_record_dir(
    collection_dir: &Path,
    mut uuid_source: impl FnMut() -> RecordUuid,
) -> ClinicResult<(RecordUuid, PathBuf)> {
    for _attempt in 0..5 {
        let id = uuid_source();
        let candidate = id.sharded_dir(collection_dir);

        if candidate.exists() {
            continue;
        }

        if let Some(parent) = candidate.parent() {
            fs::create_dir_all(parent).map_err(ClinicError::RecordDirCreation)?;
        }

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok((id, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(ClinicError::RecordDirCreation(e)),
        }
    }

    Err(ClinicError::RecordDirCreation(io::Error::new(
        ErrorKind::AlreadyExists,
        "failed to allocate a unique record directory after 5 attempts",
    )))
}

/// Removes the record directory for `id`, returning whether it existed.
pub(crate) fn remove_record_dir(collection_dir: &Path, id: &RecordUuid) -> ClinicResult<bool> {
    let dir = id.sharded_dir(collection_dir);
    if !dir.is_dir() {
        return Ok(false);
    }
    fs::remove_dir_all(&dir).map_err(ClinicError::FileWrite)?;
    Ok(true)
}

/// Collects the document paths under a collection's sharded layout.
///
/// A missing collection directory yields an empty list (nothing has been
/// stored yet). Unreadable intermediate directories are skipped.
fn document_paths(collection_dir: &Path, doc_name: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    let s1_iter = match fs::read_dir(collection_dir) {
        Ok(it) => it,
        Err(_) => return paths,
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };

        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for id_ent in id_iter.flatten() {
                let id_path = id_ent.path();
                if !id_path.is_dir() {
                    continue;
                }

                let doc_path = id_path.join(doc_name);
                if doc_path.is_file() {
                    paths.push(doc_path);
                }
            }
        }
    }

    paths
}

/// Reads every document in a collection.
///
/// Individual documents that cannot be parsed are logged as warnings and
/// skipped, so one corrupt file does not take down listings.
pub(crate) fn read_all<T: DeserializeOwned>(collection_dir: &Path, doc_name: &str) -> Vec<T> {
    let mut documents = Vec::new();

    for doc_path in document_paths(collection_dir, doc_name) {
        match read_json::<T>(&doc_path) {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                tracing::warn!("skipping unparseable document {}: {}", doc_path.display(), e);
            }
        }
    }

    documents
}

/// Applies `apply` to every document in a collection, rewriting the ones it
/// changes.
///
/// `apply` returns `true` when it modified the document; only those documents
/// are written back, each atomically. Returns the number of documents updated.
///
/// Unparseable documents are logged and skipped, matching [`read_all`]: a
/// corrupt record is invisible to listings, so the bulk path leaves it
/// untouched rather than failing the whole sweep.
///
/// This is the store's bulk-update primitive: callers hand over one closure
/// rather than looping over per-record update operations themselves.
pub(crate) fn update_each<T, F>(
    collection_dir: &Path,
    doc_name: &str,
    mut apply: F,
) -> ClinicResult<usize>
where
    T: Serialize + DeserializeOwned,
    F: FnMut(&mut T) -> bool,
{
    let mut updated = 0;

    for doc_path in document_paths(collection_dir, doc_name) {
        let mut doc: T = match read_json(&doc_path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("skipping unparseable document {}: {}", doc_path.display(), e);
                continue;
            }
        };
        if apply(&mut doc) {
            write_json_atomic(&doc_path, &doc)?;
            updated += 1;
        }
    }

    Ok(updated)
}
