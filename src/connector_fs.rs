//! Filesystem document loader.
//!
//! Walks `corpus.root`, keeps files matching the include globs and not the
//! exclude globs, and returns them as [`Document`]s keyed by their
//! root-relative path, sorted for deterministic chunk order.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::models::Document;

pub fn scan_filesystem(corpus: &CorpusConfig) -> Result<Vec<Document>> {
    let root = &corpus.root;
    if !root.is_dir() {
        bail!("Corpus root does not exist or is not a directory: {}", root.display());
    }

    let include_set = build_globset(&corpus.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(corpus.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut documents = Vec::new();

    let walker = WalkDir::new(root).follow_links(corpus.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        match std::fs::read_to_string(path) {
            Ok(body) => documents.push(Document::new(rel_str, body)),
            Err(e) => tracing::warn!(path = %path.display(), "skipping unreadable file: {e}"),
        }
    }

    documents.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    tracing::debug!(root = %root.display(), documents = documents.len(), "corpus scanned");

    Ok(documents)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn corpus(root: &std::path::Path) -> CorpusConfig {
        CorpusConfig {
            root: root.to_path_buf(),
            ..CorpusConfig::default()
        }
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("b.md"), "# B").unwrap();
        fs::write(root.join("sub/a.md"), "# A").unwrap();
        fs::write(root.join("notes.txt"), "plain").unwrap();
        fs::write(root.join("image.png"), [0u8, 1, 2]).unwrap();
        fs::write(root.join("node_modules/pkg/readme.md"), "# skip").unwrap();

        let docs = scan_filesystem(&corpus(root)).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.source_id.as_str()).collect();
        assert_eq!(ids, vec!["b.md", "notes.txt", "sub/a.md"]);
    }

    #[test]
    fn test_custom_excludes() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("drafts")).unwrap();
        fs::write(root.join("keep.md"), "keep").unwrap();
        fs::write(root.join("drafts/wip.md"), "wip").unwrap();

        let mut cfg = corpus(root);
        cfg.exclude_globs = vec!["drafts/**".to_string()];
        let docs = scan_filesystem(&cfg).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].body, "keep");
    }

    #[test]
    fn test_non_utf8_file_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.md"), [0xffu8, 0xfe, 0x00]).unwrap();
        fs::write(tmp.path().join("good.md"), "ok").unwrap();
        let docs = scan_filesystem(&corpus(tmp.path())).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source_id, "good.md");
    }

    #[test]
    fn test_missing_root_errors() {
        let cfg = corpus(std::path::Path::new("/definitely/not/here"));
        assert!(scan_filesystem(&cfg).is_err());
    }
}
