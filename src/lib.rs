//! vm2hack - stack VM to Hack assembly translator.
//!
//! Translates VM code (.vm) to Hack assembly (.asm), synthesizing the operand
//! stack, collision-free label namespaces and the full call/return convention
//! out of plain A/C instructions.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use vm2hack::{TranslateOptions, translate, translate_path};
//!
//! // One in-memory unit, no bootstrap
//! let asm = translate("push constant 7\npush constant 8\nadd", "SimpleAdd").unwrap();
//!
//! // A directory of units, merged into one file with bootstrap
//! let written = translate_path(Path::new("FibonacciElement/"), &TranslateOptions::default());
//! ```

pub mod codegen;
pub mod command;
pub mod error;
pub mod memory;
pub mod parser;
pub mod sink;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

pub use crate::codegen::{CodeGenerator, DEFAULT_ENTRY};
pub use crate::command::{ArithmeticOp, Segment, VMCommand};
pub use crate::error::{Result, TranslateError};
pub use crate::parser::{Parser, SourceUnit};
pub use crate::sink::{Artifact, OutputMode, Sink, write_artifacts};

/// Translation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Force the bootstrap on or off. `None` emits it for directory builds only.
    pub bootstrap: Option<bool>,
    /// Function the bootstrap calls.
    pub entry: String,
    /// Merged or per-unit output.
    pub mode: OutputMode,
    /// Output directory. Defaults to next to the input.
    pub dest: Option<PathBuf>,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            bootstrap: None,
            entry: DEFAULT_ENTRY.to_string(),
            mode: OutputMode::Merged,
            dest: None,
        }
    }
}

/// Translate a single VM source string to Hack assembly (no bootstrap).
pub fn translate(source: &str, unit: &str) -> Result<String> {
    let units = [SourceUnit::new(unit, source)];
    let artifacts = translate_units(&units, unit, false, &TranslateOptions::default())?;
    Ok(artifacts
        .into_iter()
        .next()
        .map(|artifact| artifact.text)
        .unwrap_or_default())
}

/// Translate units in order with one shared code generator.
///
/// Translation stops at the first error and no artifacts are returned.
pub fn translate_units(
    units: &[SourceUnit],
    build_name: &str,
    bootstrap: bool,
    options: &TranslateOptions,
) -> Result<Vec<Artifact>> {
    let mut parser = Parser::new(units)?;
    let mut codegen = CodeGenerator::new();
    let mut sink = Sink::new(options.mode, build_name);

    if bootstrap {
        debug!("emitting bootstrap calling {}", options.entry);
        let mut boot = String::with_capacity(512);
        codegen.bootstrap(&options.entry, &mut boot)?;
        sink.write_prelude(&boot);
    }

    while let Some(unit) = parser.next_unit() {
        codegen.set_unit(unit);
        let mut writer = sink.unit(unit);
        while let Some(cmd) = parser.advance()? {
            codegen.translate(&cmd, parser.line(), writer.buf())?;
        }
    }

    Ok(sink.into_artifacts())
}

/// Translate a single .vm file (no bootstrap).
pub fn translate_file(path: &Path) -> Result<String> {
    let unit = SourceUnit::from_path(path)?;
    translate(&unit.source, &unit.name)
}

/// Translate every .vm file in a directory into one program with bootstrap.
pub fn translate_directory(dir: &Path) -> Result<String> {
    let units = collect_units(dir)?;
    let artifacts = translate_units(&units, &build_name(dir), true, &TranslateOptions::default())?;
    Ok(artifacts
        .into_iter()
        .map(|artifact| artifact.text)
        .collect())
}

/// Load the .vm files of a directory, sorted by file name.
pub fn collect_units(dir: &Path) -> Result<Vec<SourceUnit>> {
    let mut vm_files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| TranslateError::FileRead {
            path: dir.display().to_string(),
            source: e,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_vm_file(path) && path.is_file())
        .collect();

    if vm_files.is_empty() {
        return Err(TranslateError::NoVmFiles {
            path: dir.display().to_string(),
        });
    }

    vm_files.sort();
    debug!("found {} .vm files in {}", vm_files.len(), dir.display());

    vm_files.iter().map(|p| SourceUnit::from_path(p)).collect()
}

/// Translate a file or directory and write the result.
///
/// Nothing is written unless the whole translation succeeds. Returns the
/// paths of the files written.
pub fn translate_path(input: &Path, options: &TranslateOptions) -> Result<Vec<PathBuf>> {
    let (units, is_dir) = if input.is_dir() {
        (collect_units(input)?, true)
    } else if is_vm_file(input) && input.is_file() {
        (vec![SourceUnit::from_path(input)?], false)
    } else {
        return Err(TranslateError::InvalidPath {
            path: input.display().to_string(),
        });
    };

    let bootstrap = options.bootstrap.unwrap_or(is_dir);
    let artifacts = translate_units(&units, &build_name(input), bootstrap, options)?;

    let dest = options
        .dest
        .clone()
        .unwrap_or_else(|| default_dest(input, is_dir));
    let written = write_artifacts(&artifacts, &dest)?;
    for path in &written {
        info!("wrote {}", path.display());
    }
    Ok(written)
}

/// Determine the merged output filename for a given input.
///
/// - Single file: Input.vm -> Input.asm
/// - Directory: dir/ -> dir/dir.asm
pub fn output_path(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.join(format!("{}.asm", build_name(input)))
    } else {
        input.with_extension("asm")
    }
}

fn is_vm_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "vm")
}

fn default_dest(input: &Path, is_dir: bool) -> PathBuf {
    if is_dir {
        input.to_path_buf()
    } else {
        input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// File stem for files, directory name for directories.
fn build_name(input: &Path) -> String {
    let name = if input.is_dir() {
        input
            .file_name()
            .map(|s| s.to_os_string())
            .or_else(|| {
                input
                    .canonicalize()
                    .ok()
                    .and_then(|p| p.file_name().map(|s| s.to_os_string()))
            })
    } else {
        input.file_stem().map(|s| s.to_os_string())
    };

    name.and_then(|s| s.into_string().ok())
        .unwrap_or_else(|| "output".to_string())
}
