//! Finding input images the user referred to by name.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::NanobananaError;

/// Ordered list of directories a relative input name is looked up in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchPaths(Vec<PathBuf>);

impl SearchPaths {
    /// Uses exactly the given directories, in order.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self(dirs)
    }

    /// The working directory, `./images`, `./input`, the output directory,
    /// then `~/Downloads` and `~/Desktop`.
    pub fn standard(output_dir: &Path) -> Self {
        let cwd = PathBuf::from(".");
        let mut paths = vec![
            cwd.clone(),
            cwd.join("images"),
            cwd.join("input"),
            cwd.join(output_dir),
        ];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("Downloads"));
            paths.push(home.join("Desktop"));
        }
        Self(paths)
    }

    /// The directories, in lookup order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.0
    }
}

/// Resolves `filename` to an existing file.
///
/// Absolute paths are checked as-is. Relative names are tried against each
/// search directory in order and the first hit is returned as an absolute
/// path.
pub fn find_input_file(filename: &str, search: &SearchPaths) -> Result<PathBuf, NanobananaError> {
    let path = Path::new(filename);
    if path.is_absolute() {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(NanobananaError::FileNotFound(path.to_path_buf()));
    }

    for base in search.dirs() {
        let candidate = base.join(path);
        if candidate.exists() {
            debug!("Found {} at {}", filename, candidate.display());
            return Ok(std::fs::canonicalize(&candidate)?);
        }
    }

    Err(NanobananaError::NotInSearchPaths {
        filename: filename.to_string(),
        searched: search.dirs().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn absolute_missing_path_does_not_search() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.jpg");
        fs::write(dir.path().join("missing.jpg.bak"), b"x").expect("write");
        let search = SearchPaths::new(vec![dir.path().to_path_buf()]);

        let err = find_input_file(missing.to_str().expect("utf8 path"), &search)
            .expect_err("should not exist");
        assert!(
            matches!(&err, NanobananaError::FileNotFound(path) if *path == missing),
            "{err:?}"
        );
    }

    #[test]
    fn absolute_existing_path_is_returned() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("photo.png");
        fs::write(&file, b"x").expect("write");
        let found = find_input_file(file.to_str().expect("utf8 path"), &SearchPaths::new(vec![]))
            .expect("found");
        assert_eq!(found, file);
    }

    #[test]
    fn first_search_dir_wins() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        fs::write(first.path().join("photo.jpg"), b"first").expect("write");
        fs::write(second.path().join("photo.jpg"), b"second").expect("write");
        let search = SearchPaths::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);

        let found = find_input_file("photo.jpg", &search).expect("found");
        assert!(found.is_absolute());
        assert_eq!(fs::read(found).expect("read"), b"first");
    }

    #[test]
    fn found_in_later_dir() {
        let empty = tempfile::tempdir().expect("tempdir");
        let holder = tempfile::tempdir().expect("tempdir");
        fs::write(holder.path().join("photo.jpg"), b"here").expect("write");
        let search = SearchPaths::new(vec![
            empty.path().to_path_buf(),
            holder.path().to_path_buf(),
        ]);

        let found = find_input_file("photo.jpg", &search).expect("found");
        assert_eq!(
            found,
            fs::canonicalize(holder.path().join("photo.jpg")).expect("canonicalize")
        );
    }

    #[test]
    fn not_found_lists_all_dirs() {
        let a = tempfile::tempdir().expect("tempdir");
        let b = tempfile::tempdir().expect("tempdir");
        let search = SearchPaths::new(vec![a.path().to_path_buf(), b.path().to_path_buf()]);

        let err = find_input_file("missing.jpg", &search).expect_err("missing");
        let msg = err.to_string();
        assert!(msg.contains("missing.jpg"));
        assert!(msg.contains(&a.path().display().to_string()));
        assert!(msg.contains(&b.path().display().to_string()));
    }

    #[test]
    fn standard_order() {
        let paths = SearchPaths::standard(Path::new("nanobanana-output"));
        let dirs = paths.dirs();
        assert_eq!(dirs[0], PathBuf::from("."));
        assert_eq!(dirs[1], PathBuf::from("./images"));
        assert_eq!(dirs[2], PathBuf::from("./input"));
        assert_eq!(dirs[3], PathBuf::from("./nanobanana-output"));
    }
}
