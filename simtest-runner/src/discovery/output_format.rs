// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::WriteEventError;
use serde::Serialize;
use std::{fmt, io};

/// The format in which a test list is written out.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum OutputFormat {
    /// A human-readable list of paths.
    #[default]
    Plain,

    /// Machine-readable output.
    Serializable(SerializableFormat),
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Plain => write!(f, "plain"),
            OutputFormat::Serializable(SerializableFormat::Json) => write!(f, "json"),
            OutputFormat::Serializable(SerializableFormat::JsonPretty) => write!(f, "json-pretty"),
        }
    }
}

/// A serialized, machine-readable output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SerializableFormat {
    /// JSON with no whitespace.
    Json,

    /// JSON, prettified.
    JsonPretty,
}

impl SerializableFormat {
    /// Write this data in the given format to the writer.
    pub fn to_writer(
        self,
        value: &impl Serialize,
        mut writer: impl io::Write,
    ) -> Result<(), WriteEventError> {
        match self {
            SerializableFormat::Json => serde_json::to_writer(&mut writer, value),
            SerializableFormat::JsonPretty => serde_json::to_writer_pretty(&mut writer, value),
        }
        .map_err(WriteEventError::Json)?;
        writeln!(writer).map_err(WriteEventError::Io)
    }
}
