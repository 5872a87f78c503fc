//! Zip archive decoding.
//!
//! Repository archives hold every file under a single top-level folder named
//! after the repository (usually lowercased). Decoding is CPU-bound, so it
//! runs on the blocking pool.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::{Cursor, Read};
use zip::ZipArchive;
use zip::result::ZipError;

/// Read the entry for `path` inside `repo`'s archive.
///
/// Tries `{repo lowercased}/{path}` first, then `{repo}/{path}`. A missing
/// entry is `Ok(None)`; an unreadable archive is an error.
pub(crate) async fn read_entry(bytes: Vec<u8>, repo: &str, path: &str) -> Result<Option<Vec<u8>>> {
    let candidates = [format!("{}/{path}", repo.to_lowercase()), format!("{repo}/{path}")];
    tokio::task::spawn_blocking(move || -> Result<Option<Vec<u8>>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).or_raise(|| ErrorKind::Archive)?;
        for name in &candidates {
            let mut entry = match archive.by_name(name) {
                Ok(entry) => entry,
                Err(ZipError::FileNotFound) => continue,
                Err(e) => return Err(e).or_raise(|| ErrorKind::Archive),
            };
            let mut buf = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
            entry.read_to_end(&mut buf).or_raise(|| ErrorKind::Archive)?;
            return Ok(Some(buf));
        }
        Ok(None)
    })
    .await
    .or_raise(|| ErrorKind::Archive)?
}

/// Names of every file entry (directories skipped), in archive order.
pub(crate) async fn list_entries(bytes: Vec<u8>) -> Result<Vec<String>> {
    tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).or_raise(|| ErrorKind::Archive)?;
        let mut names = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive.by_index(index).or_raise(|| ErrorKind::Archive)?;
            if !entry.is_dir() {
                names.push(entry.name().to_string());
            }
        }
        Ok(names)
    })
    .await
    .or_raise(|| ErrorKind::Archive)?
}

/// Turn raw entry names into repository-relative paths.
///
/// Strips the leading repository folder (compared case-insensitively), drops
/// version-control and `.apps` metadata, and keeps only paths under `prefix`.
pub(crate) fn relative_paths(names: Vec<String>, repo: &str, prefix: Option<&str>) -> Vec<String> {
    let folder = format!("{}/", repo.to_lowercase());
    names
        .into_iter()
        .map(|name| match name.get(..folder.len()) {
            Some(head) if head.to_lowercase() == folder => name[folder.len()..].to_string(),
            _ => name,
        })
        .filter(|path| !path.is_empty() && !path.starts_with(".git") && !path.starts_with(".apps"))
        .filter(|path| prefix.is_none_or(|prefix| path.starts_with(prefix)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        crate::host::zip_entries(entries.iter().map(|(name, content)| (*name, content.as_bytes())))
    }

    #[tokio::test]
    async fn test_read_entry_prefers_lowercase_folder() {
        let zip = build_zip(&[("en_ult/57-TIT.usfm", "lower"), ("en_ULT/57-TIT.usfm", "exact")]);
        let found = read_entry(zip, "en_ULT", "57-TIT.usfm").await.unwrap();
        assert_eq!(found.as_deref(), Some(&b"lower"[..]));
    }

    #[tokio::test]
    async fn test_read_entry_falls_back_to_exact_case() {
        let zip = build_zip(&[("en_ULT/57-TIT.usfm", "exact")]);
        let found = read_entry(zip, "en_ULT", "57-TIT.usfm").await.unwrap();
        assert_eq!(found.as_deref(), Some(&b"exact"[..]));
    }

    #[tokio::test]
    async fn test_read_entry_missing() {
        let zip = build_zip(&[("en_ult/README.md", "# ULT")]);
        assert_eq!(read_entry(zip, "en_ult", "LICENSE.md").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_garbage_is_an_archive_error() {
        let err = read_entry(b"definitely not a zip".to_vec(), "r", "p").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Archive));
        let err = list_entries(Vec::new()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Archive));
    }

    #[tokio::test]
    async fn test_list_entries_skips_directories() {
        let zip = build_zip(&[("en_tq/", ""), ("en_tq/tit/", ""), ("en_tq/tit/01/01.md", "q"), ("en_tq/manifest.yaml", "m")]);
        assert_eq!(list_entries(zip).await.unwrap(), ["en_tq/tit/01/01.md", "en_tq/manifest.yaml"]);
    }

    #[rstest]
    #[case(None, &["README.md", "tit/01/01.md", "tit/01/02.md", "rut/01/01.md"])]
    #[case(Some("tit/"), &["tit/01/01.md", "tit/01/02.md"])]
    #[case(Some("gen/"), &[])]
    fn test_relative_paths(#[case] prefix: Option<&str>, #[case] expected: &[&str]) {
        let names = [
            "en_tq/README.md",
            "en_tq/.gitea/issue_template.md",
            "en_tq/.gitignore",
            "en_tq/.apps/tc/settings.json",
            "en_tq/tit/01/01.md",
            "en_tq/tit/01/02.md",
            "en_tq/rut/01/01.md",
        ]
        .map(String::from)
        .to_vec();
        assert_eq!(relative_paths(names, "en_TQ", prefix), expected);
    }

    #[test]
    fn test_relative_paths_keeps_foreign_folders() {
        let names = vec!["other/file.md".to_string()];
        assert_eq!(relative_paths(names, "en_tq", None), ["other/file.md"]);
    }
}
