//! Debug-artifact filtering for the staged copy.
//!
//! The stager asks a [`FilterPolicy`] about every entry before copying it.
//! [`DebugArtifactFilter`] only excludes well-known debug-information shapes:
//!
//! | Entry | Excluded when |
//! |-------|---------------|
//! | directory | name ends in `.dSYM` |
//! | regular file | name ends in `.debug` or `.pdb` |
//! | regular file (object inspection on) | Mach-O header says `MH_DSYM` |
//! | symbolic link | name matches any of the suffixes above |
//!
//! Special files (FIFOs, sockets, devices) are never excluded; the stager
//! refuses them instead.
//!
//! Anything that cannot be read or parsed is kept.

use goblin::mach::{
    MultiArch,
    fat::FAT_MAGIC,
    header::{MH_CIGAM, MH_CIGAM_64, MH_DSYM, MH_MAGIC, MH_MAGIC_64},
};
use std::{ffi::OsStr, io::Read, path::Path};

/// Directory suffixes that mark a debug bundle.
pub const DEBUG_DIR_SUFFIXES: &[&str] = &[".dSYM"];

/// File suffixes that mark a standalone debug-symbol file.
pub const DEBUG_FILE_SUFFIXES: &[&str] = &[".debug", ".pdb"];

/// Kind of filesystem entry, as seen without following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory.
    Directory,
    /// A regular file.
    File,
    /// A symbolic link (never followed).
    Symlink,
    /// A FIFO, socket or device node.
    Other,
}

impl EntryKind {
    /// Classifies a `walkdir` file type.
    pub fn from_file_type(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// Decides whether a directory entry is left out of the staged tree.
///
/// Excluding a directory prunes its whole subtree.
pub trait FilterPolicy: Send + Sync {
    /// Returns `true` when `path` must not be staged.
    fn excludes(&self, path: &Path, kind: EntryKind) -> bool;
}

/// Policy that keeps everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl FilterPolicy for KeepAll {
    fn excludes(&self, _path: &Path, _kind: EntryKind) -> bool {
        false
    }
}

/// Excludes debug-information files and bundles.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugArtifactFilter {
    inspect_objects: bool,
}

impl DebugArtifactFilter {
    /// Creates the filter. With `inspect_objects`, regular files are also
    /// checked for Mach-O debug companion content.
    pub fn new(inspect_objects: bool) -> Self {
        Self { inspect_objects }
    }
}

impl FilterPolicy for DebugArtifactFilter {
    fn excludes(&self, path: &Path, kind: EntryKind) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        match kind {
            EntryKind::Directory => has_suffix(name, DEBUG_DIR_SUFFIXES),
            EntryKind::File => {
                has_suffix(name, DEBUG_FILE_SUFFIXES)
                    || (self.inspect_objects && is_debug_object(path))
            }
            EntryKind::Symlink => {
                has_suffix(name, DEBUG_DIR_SUFFIXES) || has_suffix(name, DEBUG_FILE_SUFFIXES)
            }
            EntryKind::Other => false,
        }
    }
}

fn has_suffix(name: &OsStr, suffixes: &[&str]) -> bool {
    let name = name.to_string_lossy();
    suffixes.iter().any(|suffix| name.ends_with(suffix))
}

/// Whether the file at `path` is a Mach-O debug companion (`MH_DSYM`).
///
/// Thin files are classified from their 16-byte header. Universal files are
/// parsed with goblin and count as debug only when every slice is.
pub fn is_debug_object(path: &Path) -> bool {
    let mut header = [0u8; 16];
    let read = std::fs::File::open(path).and_then(|mut f| f.read_exact(&mut header));
    if read.is_err() {
        return false;
    }

    if u32::from_be_bytes([header[0], header[1], header[2], header[3]]) == FAT_MAGIC {
        return match std::fs::read(path) {
            Ok(bytes) => is_debug_universal(&bytes),
            Err(e) => {
                log::debug!("Could not read {} for inspection: {}", path.display(), e);
                false
            }
        };
    }

    let debug = thin_filetype(&header) == Some(MH_DSYM);
    if debug {
        log::debug!("{} is a Mach-O debug companion", path.display());
    }
    debug
}

fn thin_filetype(header: &[u8]) -> Option<u32> {
    let word = |at: usize, big_endian: bool| {
        let bytes = [header[at], header[at + 1], header[at + 2], header[at + 3]];
        if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        }
    };
    if header.len() < 16 {
        return None;
    }
    match word(0, false) {
        MH_MAGIC | MH_MAGIC_64 => Some(word(12, false)),
        MH_CIGAM | MH_CIGAM_64 => Some(word(12, true)),
        _ => None,
    }
}

fn is_debug_universal(bytes: &[u8]) -> bool {
    // Java class files share the universal magic and fail to parse here.
    let Ok(multi) = MultiArch::new(bytes) else {
        return false;
    };
    let mut slices = 0usize;
    for arch in multi.iter_arches() {
        let Ok(arch) = arch else {
            return false;
        };
        let start = arch.offset as usize;
        let end = start.saturating_add(arch.size as usize);
        match bytes.get(start..end) {
            Some(slice) if thin_filetype(slice) == Some(MH_DSYM) => {}
            _ => return false,
        }
        slices += 1;
    }
    slices > 0
}
