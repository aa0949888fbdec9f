// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deciding which files are test entry points.
//!
//! All paths passed to a classifier are in normalized form: relative to the discovery root, with
//! `/` separators and no leading `./`. The discovery root itself is the empty string.

/// Decides whether paths are eligible test entry points.
///
/// Discovery only talks to this trait, so a stricter matcher can be used without changing how the
/// tree is walked.
pub trait PathClassifier {
    /// Returns true if files directly inside `dir` must not be collected.
    ///
    /// Discovery still descends into subdirectories of an excluded directory. Whether their files
    /// are collected is decided separately for each of them.
    fn is_dir_excluded(&self, dir: &str) -> bool;

    /// Returns true if the file at `path` is a test entry point.
    fn is_eligible(&self, path: &str) -> bool;

    /// Returns the file name every entry point ends with.
    fn entry_point(&self) -> &str;
}

/// The default classifier: plain string matching on the normalized path.
///
/// * A path is excluded if it starts with any blacklisted prefix. This is a string prefix, not a
///   path component: a blacklisted `template` also excludes `templates/`.
/// * A path must end with the entry point file name.
/// * A path must contain the ancestor segment somewhere, again as a plain substring.
///
/// All comparisons are case-sensitive.
#[derive(Clone, Debug)]
pub struct SubstringClassifier {
    blacklist: Vec<String>,
    ancestor_segment: String,
    entry_point: String,
}

impl SubstringClassifier {
    /// Creates a new classifier.
    pub fn new(
        blacklist: impl IntoIterator<Item = impl Into<String>>,
        ancestor_segment: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            blacklist: blacklist.into_iter().map(Into::into).collect(),
            ancestor_segment: ancestor_segment.into(),
            entry_point: entry_point.into(),
        }
    }

    /// Returns the blacklisted prefixes.
    pub fn blacklist(&self) -> &[String] {
        &self.blacklist
    }

    /// Returns the string every test path must contain.
    pub fn ancestor_segment(&self) -> &str {
        &self.ancestor_segment
    }

    fn is_blacklisted(&self, path: &str) -> bool {
        self.blacklist
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl PathClassifier for SubstringClassifier {
    fn is_dir_excluded(&self, dir: &str) -> bool {
        self.is_blacklisted(dir)
    }

    fn is_eligible(&self, path: &str) -> bool {
        !self.is_blacklisted(path)
            && path.ends_with(self.entry_point.as_str())
            && path.contains(self.ancestor_segment.as_str())
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }
}
