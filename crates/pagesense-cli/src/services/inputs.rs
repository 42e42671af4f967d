// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resolve the command-line INPUT into the list of PDFs to process.

use std::path::{Path, PathBuf};

use pagesense_core::error::{PagesenseError, Result};

/// A single file is taken as-is. A directory contributes its `*.pdf` entries
/// (non-recursive, case-insensitive extension), sorted by path.
pub fn collect_pdfs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(PagesenseError::Config(format!(
            "{} is not a valid file or directory",
            input.display()
        )));
    }

    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_pdfs_are_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"%PDF-1.4").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let found = collect_pdfs(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.PDF", "b.pdf"]);
    }

    #[test]
    fn single_file_is_used_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.bin");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(collect_pdfs(&path).unwrap(), vec![path]);
    }

    #[test]
    fn missing_input_is_rejected() {
        let err = collect_pdfs(Path::new("/nonexistent/input")).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }
}
