//! SUSHI project layout discovery
//!
//! SUSHI projects keep their FSH sources under `input/fsh/` and their
//! compiled resources under `fsh-generated/resources/`. Validation can be
//! started from the project base, from the input directory or from a single
//! FSH file; this module locates the base path from any of them.

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::FshvError;
use crate::result::Result;

/// Resolved layout of one SUSHI project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    base: PathBuf,
}

impl ProjectLayout {
    /// Locate the project base path (the directory containing `input/fsh/`)
    /// from a file or directory anywhere inside the project.
    pub fn discover(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FshvError::file_not_found(path));
        }

        let path = absolute(path)?;

        if path.join("input").join("fsh").is_dir() {
            return Ok(Self { base: path });
        }

        if path.file_name().is_some_and(|name| name == "input") && path.join("fsh").is_dir() {
            let base = path.parent().unwrap_or(&path).to_path_buf();
            return Ok(Self { base });
        }

        // Somewhere below input/fsh/: cut the path at the input/fsh pair.
        let components: Vec<Component> = path.components().collect();
        for i in 0..components.len().saturating_sub(1) {
            if components[i].as_os_str() == "input" && components[i + 1].as_os_str() == "fsh" {
                let base: PathBuf = components[..i].iter().collect();
                return Ok(Self { base });
            }
        }

        Err(FshvError::config_error(format!(
            "Could not find fsh input path (input/fsh/) in \"{}\"",
            path.display()
        )))
    }

    /// Discover the shared base path of several FSH files. All files must
    /// belong to the same project.
    pub fn from_files(files: &[PathBuf]) -> Result<Self> {
        let mut layouts = files.iter().map(|f| Self::discover(f));

        let first = layouts.next().ok_or_else(|| {
            FshvError::config_error("no FSH files given".to_string())
        })??;

        for layout in layouts {
            if layout? != first {
                return Err(FshvError::config_error(
                    "Found multiple base paths for fsh project, expecting exactly one".to_string(),
                ));
            }
        }

        Ok(first)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory holding the FSH sources
    pub fn fsh_input(&self) -> PathBuf {
        self.base.join("input").join("fsh")
    }

    /// Directory holding the compiler-generated resources
    pub fn generated_resources(&self) -> PathBuf {
        self.base.join("fsh-generated").join("resources")
    }

    /// Recursively collect all `*.fsh` files under `input/fsh/<subdir>`,
    /// sorted by path for reproducible run order.
    pub fn discover_fsh_files(&self, subdir: &str) -> Result<Vec<PathBuf>> {
        let root = self.fsh_input().join(subdir);
        if !root.exists() {
            return Err(FshvError::file_not_found(root));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "fsh"))
            .collect();
        files.sort();

        Ok(files)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().map_err(|e| FshvError::io_error(path, e))?;
        Ok(cwd.join(path))
    }
}
