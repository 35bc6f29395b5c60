//! One-way directory synchronization collaborator.

use std::fs;
use std::io;
use std::path::Path;

/// Makes `destination` an exact copy of `source`, including removal of files
/// present only at the destination. A mirror is a sync, not a merge.
pub trait FileMirror: Send + Sync {
    fn mirror_folders(&self, source: &Path, destination: &Path) -> io::Result<()>;
}

/// Default mirror backed by `std::fs`. Runs synchronously; the supervisor
/// calls it through `spawn_blocking`.
#[derive(Debug, Default)]
pub struct FsMirror;

impl FileMirror for FsMirror {
    fn mirror_folders(&self, source: &Path, destination: &Path) -> io::Result<()> {
        if !source.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mirror source is not a directory: {}", source.display()),
            ));
        }
        // Prune first so a name that changed kind (file vs directory) is
        // gone before the copy writes over it.
        if destination.exists() {
            prune_extraneous(source, destination)?;
        }
        copy_tree(source, destination)
    }
}

fn copy_tree(source: &Path, destination: &Path) -> io::Result<()> {
    fs::create_dir_all(destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn prune_extraneous(source: &Path, destination: &Path) -> io::Result<()> {
    for entry in fs::read_dir(destination)? {
        let entry = entry?;
        let counterpart = source.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            if counterpart.is_dir() {
                prune_extraneous(&counterpart, &entry.path())?;
            } else {
                fs::remove_dir_all(entry.path())?;
            }
        } else if !counterpart.is_file() {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn mirror(source: &Path, destination: &Path) {
        FsMirror.mirror_folders(source, destination).unwrap();
    }

    #[test]
    fn copies_nested_trees() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(src.join("inner/deep")).unwrap();
        fs::write(src.join("top.txt"), b"top").unwrap();
        fs::write(src.join("inner/deep/leaf.txt"), b"leaf").unwrap();

        mirror(&src, &dst);

        assert_eq!(fs::read(dst.join("top.txt")).unwrap(), b"top");
        assert_eq!(fs::read(dst.join("inner/deep/leaf.txt")).unwrap(), b"leaf");
    }

    #[test]
    fn overwrites_and_deletes_extraneous() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(dst.join("stale-dir")).unwrap();
        fs::write(src.join("keep.txt"), b"new").unwrap();
        fs::write(dst.join("keep.txt"), b"old").unwrap();
        fs::write(dst.join("stale.txt"), b"gone").unwrap();
        fs::write(dst.join("stale-dir/file"), b"gone").unwrap();

        mirror(&src, &dst);

        assert_eq!(fs::read(dst.join("keep.txt")).unwrap(), b"new");
        assert!(!dst.join("stale.txt").exists());
        assert!(!dst.join("stale-dir").exists());
    }

    #[test]
    fn replaces_a_directory_that_became_a_file() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("name"), b"now a file").unwrap();
        fs::create_dir_all(dst.join("name")).unwrap();
        fs::write(dst.join("name/child"), b"x").unwrap();

        mirror(&src, &dst);

        assert_eq!(fs::read(dst.join("name")).unwrap(), b"now a file");
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = tempdir().unwrap();
        let result = FsMirror.mirror_folders(&tmp.path().join("absent"), &tmp.path().join("dst"));
        assert!(result.is_err());
    }
}
