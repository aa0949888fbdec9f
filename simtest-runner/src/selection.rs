// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrowing a discovered test list down to the tests to run.

use crate::discovery::{TestEntry, TestList};
use camino::Utf8Path;

/// The mode that prints usage information.
pub const HELP_MODE: &str = "help";

/// The mode that lists tests without running them.
pub const LIST_MODE: &str = "list";

/// What the caller should do with a selection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectionAction {
    /// Print usage and exit successfully without running anything.
    ShowHelp,

    /// Print the discovered tests and exit successfully without running anything.
    ListOnly,

    /// Run every discovered test.
    RunAll,

    /// Run the tests whose path contains `substring`.
    RunFiltered {
        /// The case-sensitive substring tests were filtered on.
        substring: String,
    },
}

impl SelectionAction {
    /// Returns the action for a mode given on the command line.
    pub fn from_mode(mode: Option<&str>) -> Self {
        match mode {
            None => SelectionAction::RunAll,
            Some(HELP_MODE) => SelectionAction::ShowHelp,
            Some(LIST_MODE) => SelectionAction::ListOnly,
            Some(substring) => SelectionAction::RunFiltered {
                substring: substring.to_owned(),
            },
        }
    }

    /// Returns true if this action runs tests.
    pub fn runs_tests(&self) -> bool {
        match self {
            SelectionAction::ShowHelp | SelectionAction::ListOnly => false,
            SelectionAction::RunAll | SelectionAction::RunFiltered { .. } => true,
        }
    }
}

/// The tests picked for an action, in discovery order.
#[derive(Clone, Debug)]
pub struct Selection<'list> {
    root: &'list Utf8Path,
    action: SelectionAction,
    entries: Vec<&'list TestEntry>,
}

impl<'list> Selection<'list> {
    /// Selects tests from `list` according to `mode`.
    ///
    /// * No mode runs every test.
    /// * `help` selects nothing.
    /// * `list` selects every test, for display only.
    /// * Anything else selects the tests whose full path contains it. Matching nothing is valid
    ///   and produces an empty (and therefore passing) run.
    pub fn new(list: &'list TestList, mode: Option<&str>) -> Self {
        Self::from_action(list, SelectionAction::from_mode(mode))
    }

    /// Selects tests from `list` for an already determined action.
    pub fn from_action(list: &'list TestList, action: SelectionAction) -> Self {
        let entries = match &action {
            SelectionAction::ShowHelp => Vec::new(),
            SelectionAction::ListOnly | SelectionAction::RunAll => list.iter().collect(),
            SelectionAction::RunFiltered { substring } => list
                .iter()
                .filter(|entry| entry.full_path().as_str().contains(substring.as_str()))
                .collect(),
        };

        if let SelectionAction::RunFiltered { substring } = &action
            && entries.is_empty()
        {
            tracing::warn!("no tests matched `{substring}`");
        }

        Self {
            root: list.root(),
            action,
            entries,
        }
    }

    /// Returns the root directory the selected tests were discovered under.
    pub fn root(&self) -> &'list Utf8Path {
        self.root
    }

    /// Returns the action for this selection.
    pub fn action(&self) -> &SelectionAction {
        &self.action
    }

    /// Returns the selected tests in discovery order.
    pub fn entries(&self) -> &[&'list TestEntry] {
        &self.entries
    }

    /// Returns the number of selected tests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
