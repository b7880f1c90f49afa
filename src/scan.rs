use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::file::{MaskFile, NIFTI_SUFFIX};

/// A directory tree of NIfTI files and the files found by the last scan.
#[derive(Debug, Clone)]
pub struct MaskDirectory {
    root: PathBuf,
    files: Vec<MaskFile>,
}

impl MaskDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if !root.exists() {
            error!("The path {} does not exist", root.display());
        }
        Self {
            root,
            files: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collect every `.nii.gz` file below the root, replacing the previous scan.
    pub fn scan(&mut self) -> &[MaskFile] {
        info!("Scanning {}", self.root.display());
        self.files = scan_dir(&self.root);
        info!("Found {} nifti files in {}", self.files.len(), self.root.display());
        &self.files
    }

    /// Load and classify every header, stopping at the first failure.
    pub fn load_all_headers(&mut self) -> Result<()> {
        for file in &mut self.files {
            file.load_header()?;
        }
        Ok(())
    }

    pub fn files(&self) -> &[MaskFile] {
        &self.files
    }

    pub fn file(&self, index: usize) -> Option<&MaskFile> {
        self.files.get(index)
    }

    /// Look a file up by its display name (file name without `.nii.gz`).
    pub fn find(&self, name: &str) -> Option<&MaskFile> {
        self.files.iter().find(|f| f.name() == name)
    }

    pub fn into_files(self) -> Vec<MaskFile> {
        self.files
    }
}

/// Walk `root` bottom-up and wrap every file whose name ends in `.nii.gz`.
///
/// A missing root yields no files.
pub fn scan_dir(root: &Path) -> Vec<MaskFile> {
    if !root.exists() {
        warn!("Nothing to scan, {} does not exist", root.display());
        return Vec::new();
    }

    WalkDir::new(root)
        .contents_first(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(NIFTI_SUFFIX))
        .filter_map(|e| match MaskFile::new(e.path()) {
            Ok(file) => Some(file),
            Err(err) => {
                warn!("Skipping {}: {}", e.path().display(), err);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_root_yields_no_files() {
        let dir = tempdir().expect("tmpdir");
        let mut scanned = MaskDirectory::new(dir.path().join("nowhere"));
        assert!(scanned.scan().is_empty());
        assert!(scanned.load_all_headers().is_ok());
    }

    #[test]
    fn only_compressed_nifti_files_are_collected() {
        let dir = tempdir().expect("tmpdir");
        let nested = dir.path().join("case01").join("labels");
        fs::create_dir_all(&nested).expect("mkdir");

        fs::write(dir.path().join("ct.nii.gz"), b"").expect("write");
        fs::write(dir.path().join("notes.txt"), b"").expect("write");
        fs::write(dir.path().join("raw.nii"), b"").expect("write");
        fs::write(nested.join("organs.nii.gz"), b"").expect("write");
        fs::create_dir_all(dir.path().join("folder.nii.gz")).expect("mkdir");

        let mut scanned = MaskDirectory::new(dir.path());
        let mut names: Vec<_> = scanned.scan().iter().map(|f| f.name().to_string()).collect();
        names.sort();

        assert_eq!(names, vec!["ct", "organs"]);
        assert!(scanned.find("organs").is_some());
        assert!(scanned.find("notes").is_none());
        assert!(scanned.file(2).is_none());
    }

    #[test]
    fn rescanning_replaces_previous_results() {
        let dir = tempdir().expect("tmpdir");
        fs::write(dir.path().join("a.nii.gz"), b"").expect("write");

        let mut scanned = MaskDirectory::new(dir.path());
        assert_eq!(scanned.scan().len(), 1);

        fs::write(dir.path().join("b.nii.gz"), b"").expect("write");
        assert_eq!(scanned.scan().len(), 2);
    }
}
