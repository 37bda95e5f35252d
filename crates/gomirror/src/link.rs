//! Projection of the module forest onto a destination directory
//!
//! Leaf modules become single symlinks; branch nodes become directories
//! holding per-entry symlinks and their projected children. Also provides
//! the single-symlink `bin`/`pkg` mirrors and the full mirror run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::gopath::{self, GopathError};
use crate::module::{filter_modules, GoList, ModuleError};
use crate::tree::{build_nodes, Node, TreeError};

/// Errors that can occur while creating links
#[derive(Debug, Error)]
pub enum LinkError {
    /// Failure while projecting a node, qualified with the relative path
    /// from the projection root to the failing segment
    #[error("[path {path}]: {source}")]
    Node {
        /// Relative path of the failing node
        path: String,
        /// Underlying filesystem failure
        source: io::Error,
    },

    /// Workspace directory resolution failure
    #[error("{0}")]
    Gopath(#[from] GopathError),

    /// Filesystem failure outside node projection
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Errors from the `src` pipeline: list, filter, build, project.
#[derive(Debug, Error)]
pub enum SrcError {
    /// Listing the workspace modules failed
    #[error("Error reading modules: {0}")]
    ReadModules(#[from] ModuleError),

    /// The module list could not be shaped into a forest
    #[error("Error building module tree: {0}")]
    BuildTree(#[from] TreeError),

    /// Projecting the forest failed
    #[error(transparent)]
    Project(#[from] LinkError),
}

/// Errors from the full mirror operation, naming which link failed.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The `src` pipeline failed
    #[error("Error linking GOPATH/src: {0}")]
    LinkSrc(#[source] SrcError),

    /// The `bin` symlink failed
    #[error("Error linking GOPATH/bin: {0}")]
    LinkBin(#[source] LinkError),

    /// The `pkg` symlink failed
    #[error("Error linking GOPATH/pkg: {0}")]
    LinkPkg(#[source] LinkError),
}

/// Which parts of the virtual GOPATH to skip.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Skip mirroring modules as `src`
    pub skip_go_src: bool,

    /// Skip the `bin` symlink
    pub skip_go_bin: bool,

    /// Skip the `pkg` symlink
    pub skip_go_pkg: bool,
}

/// Create the full virtual GOPATH at `dst_dir`.
///
/// Runs the `src` projection, then the `bin` and `pkg` symlinks, honoring
/// the skip options. Every destination is removed and recreated by its
/// own step, so a failed run may leave earlier steps in place and
/// rerunning replaces them wholesale.
pub fn mirror(dst_dir: &Path, options: Options) -> Result<(), MirrorError> {
    mirror_with(dst_dir, options, GoList::new())
}

/// As [`mirror`], with caller-supplied listing options.
pub fn mirror_with(dst_dir: &Path, options: Options, list: GoList) -> Result<(), MirrorError> {
    if !options.skip_go_src {
        link_go_src_with(dst_dir, list).map_err(MirrorError::LinkSrc)?;
    }

    if !options.skip_go_bin {
        link_go_bin(dst_dir).map_err(MirrorError::LinkBin)?;
    }

    if !options.skip_go_pkg {
        link_go_pkg(dst_dir).map_err(MirrorError::LinkPkg)?;
    }

    Ok(())
}

/// List, filter, and project the workspace modules as `<dst>/src`.
pub fn link_go_src(dst_dir: &Path) -> Result<(), SrcError> {
    link_go_src_with(dst_dir, GoList::new())
}

/// As [`link_go_src`], with caller-supplied listing options.
pub fn link_go_src_with(dst_dir: &Path, list: GoList) -> Result<(), SrcError> {
    let modules = filter_modules(list.read_modules()?);
    let nodes = build_nodes(modules)?;
    link_src_tree(dst_dir, &nodes)?;
    Ok(())
}

fn link_src_tree(dst_dir: &Path, nodes: &[Node]) -> Result<(), LinkError> {
    let dst_src_dir = dst_dir.join("src");
    remove_existing(&dst_src_dir)?;
    fs::create_dir(&dst_src_dir)?;
    link_nodes(&dst_src_dir, nodes)
}

/// Mirror the binary output directory as `<dst>/bin`.
///
/// The link source is `$GOBIN` when set and non-empty, otherwise
/// `<GOPATH>/bin`.
pub fn link_go_bin(dst_dir: &Path) -> Result<(), LinkError> {
    replace_with_symlink(gopath::go_bin_dir()?, dst_dir.join("bin"))
}

/// Mirror the build cache as `<dst>/pkg`, linking to `<GOPATH>/pkg`.
pub fn link_go_pkg(dst_dir: &Path) -> Result<(), LinkError> {
    replace_with_symlink(gopath::gopath()?.join("pkg"), dst_dir.join("pkg"))
}

/// Project a forest into `dir`.
///
/// Failures are path-qualified: the returned error names the full
/// relative path from `dir` down to the failing node, accumulated one
/// segment per level as the recursion unwinds.
pub fn link_nodes(dir: &Path, nodes: &[Node]) -> Result<(), LinkError> {
    for node in nodes {
        if let Err(err) = link_node(dir, node) {
            return Err(qualify(&node.segment, err));
        }
    }
    Ok(())
}

fn link_node(dir: &Path, node: &Node) -> Result<(), LinkError> {
    let dst = dir.join(&node.segment);
    remove_existing(&dst)?;

    // Leaf module: a single symlink stands in for the whole subtree.
    if let Some(module) = &node.module {
        if node.children.is_empty() {
            symlink(&module.dir, &dst)?;
            return Ok(());
        }
    }

    fs::create_dir(&dst)?;

    if let Some(module) = &node.module {
        // Expose the module's own entries alongside the child nodes.
        for entry in fs::read_dir(&module.dir)? {
            let entry = entry?;
            symlink(entry.path(), dst.join(entry.file_name()))?;
        }
    }

    link_nodes(&dst, &node.children)
}

/// Extend an error from projecting a node with that node's segment.
fn qualify(segment: &str, err: LinkError) -> LinkError {
    match err {
        LinkError::Node { path, source } => LinkError::Node {
            path: format!("{segment}/{path}"),
            source,
        },
        LinkError::IoError(source) => LinkError::Node {
            path: segment.to_string(),
            source,
        },
        other => other,
    }
}

fn replace_with_symlink(src: PathBuf, dst: PathBuf) -> Result<(), LinkError> {
    remove_existing(&dst)?;
    symlink(src, dst)?;
    Ok(())
}

/// Remove whatever exists at `path`, tolerating its absence.
///
/// Handles plain files, directories, and symlinks (including dangling
/// ones) without following the link.
fn remove_existing(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(unix)]
fn symlink(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    let src = src.as_ref();
    // Windows distinguishes file and directory links; pick by target
    // type, defaulting dangling targets to file links.
    if src.is_dir() {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_remove_existing_tolerates_absence() {
        let temp = tempfile::tempdir().unwrap();
        assert!(remove_existing(&temp.path().join("missing")).is_ok());
    }

    #[test]
    fn test_remove_existing_removes_file() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, "contents").unwrap();

        remove_existing(&file).unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn test_remove_existing_removes_populated_dir() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("dir");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("file"), "contents").unwrap();

        remove_existing(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_remove_existing_removes_dangling_symlink() {
        let temp = tempfile::tempdir().unwrap();
        let link = temp.path().join("link");
        symlink(temp.path().join("missing"), &link).unwrap();

        remove_existing(&link).unwrap();
        assert!(fs::symlink_metadata(&link).is_err());
    }

    #[test]
    fn test_remove_existing_removes_symlink_not_target() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("target");
        fs::create_dir(&target).unwrap();
        let link = temp.path().join("link");
        symlink(&target, &link).unwrap();

        remove_existing(&link).unwrap();
        assert!(fs::symlink_metadata(&link).is_err());
        assert!(target.exists());
    }

    #[test]
    fn test_qualify_accumulates_segments() {
        let inner = LinkError::IoError(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let err = qualify("x", qualify("y", qualify("z", inner)));

        match err {
            LinkError::Node { ref path, .. } => assert_eq!(path, "x/y/z"),
            ref other => panic!("expected node error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("[path x/y/z]:"));
    }
}
