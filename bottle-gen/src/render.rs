//! # Render Module
//!
//! Output side of the generator. Template based code emission is not part of
//! this crate: a [`Renderer`] receives one [`ModelMeta`] per model and decides
//! what to write. [`JsonRenderer`] serializes the metadata as JSON lines, which
//! is what the CLI prints and what an external template engine can consume.

// ============================================================================
// External Crate Imports
// ============================================================================

use serde::Serialize;
use std::{
    io::{self, Write},
    sync::Mutex,
};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    config::{Config, GenerateMode},
    field::Field,
    Result,
};

/// Everything known about one generated model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelMeta {
    pub table_name: String,
    pub model_name: String,
    /// Model file name, without extension.
    pub file_name: String,
    pub model_pkg: String,
    pub query_pkg_name: String,
    pub out_file: String,
    pub imports: Vec<String>,
    pub mode: GenerateMode,
    pub fields: Vec<Field>,
}

impl ModelMeta {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Consumes generated model metadata.
pub trait Renderer {
    fn render(&self, model: &ModelMeta, config: &Config) -> Result<()>;
}

/// Writes each model as a single JSON line.
pub struct JsonRenderer<W: io::Write> {
    out: Mutex<W>,
    pretty: bool,
}

impl<W: io::Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out), pretty: false }
    }

    /// Indents the output; one model then spans several lines.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: io::Write> Renderer for JsonRenderer<W> {
    fn render(&self, model: &ModelMeta, _config: &Config) -> Result<()> {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, model)?;
        } else {
            serde_json::to_writer(&mut *out, model)?;
        }
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}
