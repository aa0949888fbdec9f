// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finding test entry points in a directory tree.

mod output_format;
pub use output_format::*;

use crate::{classifier::PathClassifier, errors::DiscoveryError, errors::WriteEventError};
use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use owo_colors::{OwoColorize, Style};
use simtest_metadata::{TestEntrySummary, TestListSummary};
use std::{
    collections::HashSet,
    io::{self, Write},
};
use walkdir::WalkDir;

/// A single runnable test, identified by its entry point file.
///
/// Both paths are relative to the discovery root and use `/` separators.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TestEntry {
    full_path: Utf8PathBuf,
    containing_dir: Utf8PathBuf,
}

impl TestEntry {
    /// Creates a new entry from the normalized path to its entry point.
    ///
    /// The containing directory is the path with its final component removed. An entry point
    /// directly inside the root has an empty containing directory.
    pub fn new(full_path: impl Into<Utf8PathBuf>) -> Self {
        let full_path = full_path.into();
        let containing_dir = full_path
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_default();
        Self {
            full_path,
            containing_dir,
        }
    }

    /// Returns the path to the entry point file, relative to the root.
    pub fn full_path(&self) -> &Utf8Path {
        &self.full_path
    }

    /// Returns the directory the entry point lives in, relative to the root. The test's launcher
    /// runs with this as its working directory.
    pub fn containing_dir(&self) -> &Utf8Path {
        &self.containing_dir
    }

    /// Returns the directory the entry point lives in, resolved against `root`.
    pub fn working_dir(&self, root: &Utf8Path) -> Utf8PathBuf {
        if self.containing_dir.as_str().is_empty() {
            root.to_owned()
        } else {
            root.join(&self.containing_dir)
        }
    }

    /// Returns the file name of the entry point.
    pub fn file_name(&self) -> &str {
        self.full_path.file_name().unwrap_or(self.full_path.as_str())
    }

    fn to_summary(&self) -> TestEntrySummary {
        TestEntrySummary {
            path: self.full_path.clone(),
            dir: self.containing_dir.clone(),
        }
    }
}

/// The ordered set of tests found under a root directory.
#[derive(Clone, Debug)]
pub struct TestList {
    root: Utf8PathBuf,
    entries: Vec<TestEntry>,
    styles: Box<Styles>,
}

impl TestList {
    /// Walks `root` recursively and collects every file the classifier accepts whose file name is
    /// exactly the classifier's entry point.
    ///
    /// Entries are returned in walk order. The walk visits directory entries sorted by file name,
    /// so an unchanged tree always produces the same order, but callers must not rely on the order
    /// being alphabetical by full path.
    ///
    /// Returns an error only if `root` is missing or unreadable. Problems below the root are
    /// logged and skipped.
    pub fn discover<C>(root: impl Into<Utf8PathBuf>, classifier: &C) -> Result<Self, DiscoveryError>
    where
        C: PathClassifier + ?Sized,
    {
        let root = root.into();
        check_root(&root)?;

        let mut entries = Vec::new();
        // Directories whose files must not be collected. The walk still descends into them.
        let mut excluded_dirs = HashSet::new();

        for dir_entry in WalkDir::new(&root).sort_by_file_name() {
            let dir_entry = match dir_entry {
                Ok(dir_entry) => dir_entry,
                Err(err) if err.depth() == 0 => {
                    return Err(DiscoveryError::RootUnreadable {
                        root,
                        err: err.into(),
                    });
                }
                Err(err) => {
                    tracing::warn!("skipping unreadable path during discovery: {err}");
                    continue;
                }
            };

            let Some(normalized) = normalize(&root, dir_entry.path()) else {
                tracing::warn!(
                    "skipping non-UTF-8 path during discovery: {}",
                    dir_entry.path().display()
                );
                continue;
            };

            let file_type = dir_entry.file_type();
            if file_type.is_dir() {
                if classifier.is_dir_excluded(&normalized) {
                    tracing::debug!("not collecting files in blacklisted directory `{normalized}`");
                    excluded_dirs.insert(normalized);
                }
                continue;
            }
            if file_type.is_symlink() {
                // Symlinked files are collected like regular files. Symlinked directories are
                // never descended into.
                if !dir_entry.path().metadata().is_ok_and(|metadata| metadata.is_file()) {
                    tracing::debug!("skipping symlink `{normalized}` that does not point to a file");
                    continue;
                }
            } else if !file_type.is_file() {
                continue;
            }

            let (parent, file_name) = match normalized.rsplit_once('/') {
                Some(split) => split,
                None => ("", normalized.as_str()),
            };
            if excluded_dirs.contains(parent) || !classifier.is_eligible(&normalized) {
                continue;
            }

            // The launcher runs the entry point by name, so a file that merely ends with it
            // (`notgo.sh` for `go.sh`) can't be run as a test.
            if file_name != classifier.entry_point() {
                tracing::warn!(
                    "skipping `{normalized}`: file name is not `{}`",
                    classifier.entry_point()
                );
                continue;
            }

            tracing::debug!("discovered test `{normalized}`");
            entries.push(TestEntry::new(normalized));
        }

        Ok(Self::new(root, entries))
    }

    /// Creates a test list from already discovered entries.
    pub fn new(root: impl Into<Utf8PathBuf>, entries: Vec<TestEntry>) -> Self {
        Self {
            root: root.into(),
            entries,
            styles: Box::default(),
        }
    }

    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Returns the root directory tests were discovered under.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the number of tests in this list.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no tests were discovered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the tests in discovery order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TestEntry> + '_ {
        self.entries.iter()
    }

    /// Returns the tests in discovery order.
    pub fn entries(&self) -> &[TestEntry] {
        &self.entries
    }

    /// Returns a machine-readable summary of this list.
    pub fn to_summary(&self) -> TestListSummary {
        TestListSummary::new(
            self.root.clone(),
            self.entries.iter().map(TestEntry::to_summary).collect(),
        )
    }

    /// Writes the whole list out in the given format.
    pub fn write(
        &self,
        output_format: OutputFormat,
        mut writer: impl Write,
    ) -> Result<(), WriteEventError> {
        match output_format {
            OutputFormat::Plain => self.write_plain(&mut writer).map_err(WriteEventError::Io),
            OutputFormat::Serializable(format) => format.to_writer(&self.to_summary(), writer),
        }
    }

    fn write_plain(&self, mut writer: impl Write) -> io::Result<()> {
        writeln!(writer, "\n{}\n", "All tests found:".style(self.styles.header))?;
        write_entry_paths(self.entries.iter(), &self.styles, writer)
    }
}

/// Writes out one `  --> path` line per entry.
pub(crate) fn write_entry_paths<'a>(
    entries: impl IntoIterator<Item = &'a TestEntry>,
    styles: &Styles,
    mut writer: impl Write,
) -> io::Result<()> {
    for entry in entries {
        writeln!(writer, "  --> {}", entry.full_path.style(styles.path))?;
    }
    Ok(())
}

fn check_root(root: &Utf8Path) -> Result<(), DiscoveryError> {
    match root.metadata() {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(DiscoveryError::RootNotFound {
            root: root.to_owned(),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(DiscoveryError::RootNotFound {
            root: root.to_owned(),
        }),
        Err(err) => Err(DiscoveryError::RootUnreadable {
            root: root.to_owned(),
            err,
        }),
    }
}

/// Returns `path` relative to `root`, joined with `/`. The root itself becomes the empty string.
fn normalize(root: &Utf8Path, path: &std::path::Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let relative = Utf8Path::from_path(relative)?;
    Some(relative.components().map(|c| c.as_str()).join("/"))
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Styles {
    pub(crate) header: Style,
    pub(crate) path: Style,
}

impl Styles {
    pub(crate) fn colorize(&mut self) {
        self.header = Style::new().bold();
        self.path = Style::new().blue().bold();
    }
}
