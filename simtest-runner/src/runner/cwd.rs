// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped changes to the process working directory.
//!
//! The working directory is process-wide state. The runner is the only thing that changes it, and
//! only through [`with_current_dir`].

use camino::Utf8Path;
use std::{env, io, path::PathBuf};

/// Runs `f` with the process working directory set to `dir`, then restores the previous working
/// directory.
///
/// Restoration happens on every exit path, including when `f` panics. Returns an error without
/// calling `f` if the current directory can't be read or `dir` can't be entered.
pub(crate) fn with_current_dir<T>(dir: &Utf8Path, f: impl FnOnce() -> T) -> io::Result<T> {
    let mut guard = CurrentDirGuard::enter(dir)?;
    let ret = f();
    // Restore eagerly so the error can be logged with context; Drop covers unwinding.
    if let Err(err) = guard.restore() {
        tracing::error!("failed to restore working directory after running in `{dir}`: {err}");
    }
    Ok(ret)
}

#[derive(Debug)]
struct CurrentDirGuard {
    // None indicates that the original directory has already been restored.
    original: Option<PathBuf>,
}

impl CurrentDirGuard {
    fn enter(dir: &Utf8Path) -> io::Result<Self> {
        let original = env::current_dir()?;
        env::set_current_dir(dir)?;
        Ok(Self {
            original: Some(original),
        })
    }

    fn restore(&mut self) -> io::Result<()> {
        match self.original.take() {
            Some(original) => env::set_current_dir(original),
            None => Ok(()),
        }
    }
}

impl Drop for CurrentDirGuard {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::error!("failed to restore working directory: {err}");
        }
    }
}
