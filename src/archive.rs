//! Archive inspector and document loader.
//!
//! Source archives are expected to look like GitHub branch downloads: every
//! member lives under one top-level directory (`fastmcp-main/...`). The
//! inspector finds that directory and lists qualifying members with it
//! stripped; the loader maps those stripped paths back to members and
//! reads them.

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::warn;
use zip::ZipArchive;

use crate::error::{PipelineError, Result};

/// A member read from an archive, not yet tagged with a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub filename: String,
    pub content: String,
}

/// An open ZIP archive with its member listing cached.
pub struct Archive {
    path: PathBuf,
    zip: ZipArchive<File>,
    /// In central-directory order.
    names: Vec<String>,
}

impl Archive {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let zip = ZipArchive::new(file).map_err(|e| PipelineError::archive(path, e))?;
        let names = zip.file_names().map(str::to_string).collect();
        Ok(Self {
            path: path.to_path_buf(),
            zip,
            names,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The single top-level directory shared by every member.
    pub fn discover_root(&self) -> Result<String> {
        if self.names.is_empty() {
            return Err(PipelineError::EmptyArchive(self.path.clone()));
        }

        let roots: BTreeSet<String> = self
            .names
            .iter()
            .filter_map(|name| segments(name).first().map(|s| s.to_string()))
            .collect();

        if roots.len() != 1 {
            return Err(PipelineError::AmbiguousRoot {
                path: self.path.clone(),
                roots,
            });
        }
        Ok(roots.into_iter().next().unwrap_or_default())
    }

    /// Members whose name ends with one of `suffixes` (case-sensitive),
    /// with the first path segment removed. Members sitting directly at
    /// the archive root are skipped.
    pub fn list_members(&self, suffixes: &[String]) -> Vec<String> {
        self.names
            .iter()
            .filter(|name| suffixes.iter().any(|s| name.ends_with(s.as_str())))
            .filter_map(|name| {
                let parts = segments(name);
                if parts.len() < 2 {
                    return None;
                }
                Some(parts[1..].join("/"))
            })
            .collect()
    }

    /// Read `root/<member>` for each member, in input order.
    ///
    /// Members that don't exist under `root` are skipped with a warning;
    /// that only happens if the caller passes a root the listing was not
    /// derived from.
    pub fn load(&mut self, root: &str, members: &[String]) -> Result<Vec<LoadedFile>> {
        let present: HashSet<&str> = self.names.iter().map(String::as_str).collect();
        let wanted: Vec<(String, &String)> = members
            .iter()
            .map(|m| (format!("{}/{}", root, m), m))
            .collect();
        let (found, missing): (Vec<_>, Vec<_>) = wanted
            .into_iter()
            .partition(|(full, _)| present.contains(full.as_str()));
        for (full, _) in &missing {
            warn!(archive = %self.path.display(), member = %full, "member not in archive, skipped");
        }

        let mut files = Vec::with_capacity(found.len());
        for (full, member) in found {
            let bytes = self.read_member(&full)?;
            let content = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    warn!(member = %full, "invalid UTF-8 replaced");
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };
            files.push(LoadedFile {
                filename: member.clone(),
                content,
            });
        }
        Ok(files)
    }

    fn read_member(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self
            .zip
            .by_name(name)
            .map_err(|e| PipelineError::archive(&self.path, e))?;
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| PipelineError::archive(&self.path, e))?;
        Ok(bytes)
    }
}

/// POSIX path segments, ignoring empty and `.` components.
fn segments(name: &str) -> Vec<&str> {
    name.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

pub fn discover_root(archive_path: &Path) -> Result<String> {
    Archive::open(archive_path)?.discover_root()
}

pub fn list_members(archive_path: &Path, suffixes: &[String]) -> Result<Vec<String>> {
    Ok(Archive::open(archive_path)?.list_members(suffixes))
}

pub fn load_documents(
    archive_path: &Path,
    root: &str,
    members: &[String],
) -> Result<Vec<LoadedFile>> {
    Archive::open(archive_path)?.load(root, members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_zip(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (entry, body) in entries {
            if entry.ends_with('/') {
                zip.add_directory(*entry, zip::write::SimpleFileOptions::default())
                    .unwrap();
            } else {
                zip.start_file(*entry, zip::write::SimpleFileOptions::default())
                    .unwrap();
                zip.write_all(body).unwrap();
            }
        }
        zip.finish().unwrap();
        path
    }

    fn md(suffixes: &[&str]) -> Vec<String> {
        suffixes.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_discover_single_root() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(
            tmp.path(),
            "a.zip",
            &[
                ("fastmcp-main/", b""),
                ("fastmcp-main/README.md", b"# hi"),
                ("fastmcp-main/docs/intro.mdx", b"intro"),
            ],
        );
        assert_eq!(discover_root(&path).unwrap(), "fastmcp-main");
    }

    #[test]
    fn test_discover_empty_archive() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(tmp.path(), "empty.zip", &[]);
        assert!(matches!(
            discover_root(&path),
            Err(PipelineError::EmptyArchive(_))
        ));
    }

    #[test]
    fn test_discover_ambiguous_root() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(
            tmp.path(),
            "two.zip",
            &[("one/a.md", b"a"), ("two/b.md", b"b"), ("one/c.md", b"c")],
        );
        match discover_root(&path) {
            Err(PipelineError::AmbiguousRoot { roots, .. }) => {
                let roots: Vec<&str> = roots.iter().map(String::as_str).collect();
                assert_eq!(roots, vec!["one", "two"]);
            }
            other => panic!("expected AmbiguousRoot, got {:?}", other),
        }
    }

    #[test]
    fn test_root_level_file_counts_as_root() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(
            tmp.path(),
            "mixed.zip",
            &[("repo/a.md", b"a"), ("stray.md", b"s")],
        );
        assert!(matches!(
            discover_root(&path),
            Err(PipelineError::AmbiguousRoot { .. })
        ));
    }

    #[test]
    fn test_list_members_strips_root_and_filters() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(
            tmp.path(),
            "a.zip",
            &[
                ("repo-main/", b""),
                ("repo-main/README.md", b"r"),
                ("repo-main/docs/guide.mdx", b"g"),
                ("repo-main/src/lib.rs", b"code"),
                ("repo-main/NOTES.MD", b"upper"),
                ("top.md", b"root level"),
            ],
        );
        let members = list_members(&path, &md(&[".md", ".mdx"])).unwrap();
        assert_eq!(members, vec!["README.md", "docs/guide.mdx"]);
        for m in &members {
            assert!(!m.starts_with("repo-main"));
        }
    }

    #[test]
    fn test_list_members_keeps_listing_order() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(
            tmp.path(),
            "a.zip",
            &[("r/z.md", b"z"), ("r/a.md", b"a"), ("r/m/k.md", b"k")],
        );
        let members = list_members(&path, &md(&[".md"])).unwrap();
        assert_eq!(members, vec!["z.md", "a.md", "m/k.md"]);
    }

    #[test]
    fn test_load_reads_members_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(
            tmp.path(),
            "a.zip",
            &[("r/a.md", b"alpha"), ("r/b/c.md", b"charlie")],
        );
        let mut archive = Archive::open(&path).unwrap();
        let root = archive.discover_root().unwrap();
        let members = vec!["b/c.md".to_string(), "a.md".to_string()];
        let files = archive.load(&root, &members).unwrap();
        assert_eq!(
            files,
            vec![
                LoadedFile {
                    filename: "b/c.md".to_string(),
                    content: "charlie".to_string(),
                },
                LoadedFile {
                    filename: "a.md".to_string(),
                    content: "alpha".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_load_replaces_invalid_utf8() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(tmp.path(), "a.zip", &[("r/bad.md", b"ok \xff\xfe end")]);
        let files = load_documents(&path, "r", &["bad.md".to_string()]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content, "ok \u{FFFD}\u{FFFD} end");
    }

    #[test]
    fn test_load_skips_members_outside_root() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(tmp.path(), "a.zip", &[("r/a.md", b"alpha")]);
        let files = load_documents(&path, "other", &["a.md".to_string()]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_inspect_and_load_agree() {
        let tmp = TempDir::new().unwrap();
        let path = write_zip(
            tmp.path(),
            "a.zip",
            &[("r/", b""), ("r/x.md", b"x"), ("r/d/y.mdx", b"y")],
        );
        let mut archive = Archive::open(&path).unwrap();
        let root = archive.discover_root().unwrap();
        let members = archive.list_members(&md(&[".md", ".mdx"]));
        let files = archive.load(&root, &members).unwrap();
        assert_eq!(files.len(), members.len());
    }

    #[test]
    fn test_load_ignores_declared_member_size() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sized.zip");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        zip.start_file("r/big.md", stored).unwrap();
        zip.write_all(b"hello").unwrap();
        zip.finish().unwrap();

        // Claim ~4 GiB uncompressed in the central directory entry.
        let mut bytes = std::fs::read(&path).unwrap();
        let central = bytes
            .windows(4)
            .position(|w| w == b"PK\x01\x02")
            .unwrap();
        bytes[central + 24..central + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        match Archive::open(&path).and_then(|mut a| a.load("r", &["big.md".to_string()])) {
            Ok(files) => assert_eq!(files[0].content, "hello"),
            Err(e) => assert!(matches!(e, PipelineError::Archive { .. }), "{:?}", e),
        }
    }

    #[test]
    fn test_not_a_zip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("junk.zip");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        assert!(matches!(
            discover_root(&path),
            Err(PipelineError::Archive { .. })
        ));
    }
}
