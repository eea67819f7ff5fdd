//! Output accumulation.
//!
//! Generated assembly is collected per source unit through a scoped
//! [`UnitWriter`]. Whatever a writer has buffered is committed to the sink
//! when it is dropped, on success and error paths alike. Files are only
//! written by [`write_artifacts`], which the driver calls once the whole run
//! has succeeded.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Result, TranslateError};

/// How translated units are packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One artifact holding every unit in translation order.
    #[default]
    Merged,
    /// One artifact per source unit.
    PerUnit,
}

/// A named block of assembly ready to be persisted as `<name>.asm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub text: String,
}

/// Collects emitted assembly in arrival order.
#[derive(Debug)]
pub struct Sink {
    mode: OutputMode,
    build_name: String,
    prelude: String,
    artifacts: Vec<Artifact>,
}

impl Sink {
    /// `build_name` names the merged artifact.
    pub fn new(mode: OutputMode, build_name: impl Into<String>) -> Self {
        Self {
            mode,
            build_name: build_name.into(),
            prelude: String::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Record the program preamble. Only valid before any unit is opened.
    pub fn write_prelude(&mut self, text: &str) {
        debug_assert!(
            self.artifacts.is_empty(),
            "prelude must precede all unit output"
        );
        self.prelude.push_str(text);
    }

    /// Open a write handle for one source unit.
    pub fn unit(&mut self, name: &str) -> UnitWriter<'_> {
        UnitWriter {
            sink: self,
            name: name.to_string(),
            buf: String::new(),
        }
    }

    fn commit(&mut self, name: String, text: String) {
        match self.mode {
            OutputMode::Merged => match self.artifacts.first_mut() {
                Some(merged) => merged.text.push_str(&text),
                None => self.artifacts.push(Artifact {
                    name: self.build_name.clone(),
                    text,
                }),
            },
            OutputMode::PerUnit => match self.artifacts.iter_mut().find(|a| a.name == name) {
                Some(existing) => existing.text.push_str(&text),
                None => self.artifacts.push(Artifact { name, text }),
            },
        }
    }

    /// Finish the build and hand out the artifacts.
    ///
    /// The prelude is placed at the head of the first artifact. A build with
    /// a prelude but no units still yields one artifact.
    pub fn into_artifacts(mut self) -> Vec<Artifact> {
        if self.prelude.is_empty() {
            return self.artifacts;
        }

        let prelude = std::mem::take(&mut self.prelude);
        match self.artifacts.first_mut() {
            Some(first) => first.text.insert_str(0, &prelude),
            None => self.artifacts.push(Artifact {
                name: self.build_name.clone(),
                text: prelude,
            }),
        }
        self.artifacts
    }
}

/// Scoped write handle for one unit. Commits on drop.
pub struct UnitWriter<'a> {
    sink: &'a mut Sink,
    name: String,
    buf: String,
}

impl UnitWriter<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Buffer the code generator appends into.
    pub fn buf(&mut self) -> &mut String {
        &mut self.buf
    }
}

impl Drop for UnitWriter<'_> {
    fn drop(&mut self) {
        let name = std::mem::take(&mut self.name);
        let text = std::mem::take(&mut self.buf);
        self.sink.commit(name, text);
    }
}

/// Persist artifacts as `<dir>/<name>.asm`, returning the paths written.
///
/// If any write fails, the files already written by this call are removed.
pub fn write_artifacts(artifacts: &[Artifact], dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let path = dir.join(format!("{}.asm", artifact.name));
        if let Err(e) = write_one(&path, &artifact.text) {
            for done in &written {
                if let Err(rm) = std::fs::remove_file(done) {
                    warn!("could not remove {}: {}", done.display(), rm);
                }
            }
            return Err(e);
        }
        written.push(path);
    }

    Ok(written)
}

fn write_one(path: &Path, text: &str) -> Result<()> {
    let to_err = |e: std::io::Error| TranslateError::FileWrite {
        path: path.display().to_string(),
        source: e,
    };

    let file = File::create(path).map_err(to_err)?;
    let mut out = BufWriter::new(file);
    out.write_all(text.as_bytes()).map_err(to_err)?;
    out.flush().map_err(to_err)
}
