//! VM source parser.
//!
//! Walks an ordered list of source units line by line, yielding one typed
//! command per non-blank line. End of a unit is reported separately from end
//! of input so the driver can re-prime the code generator between units.

use std::iter::Enumerate;
use std::path::Path;
use std::str::Lines;

use crate::codegen::is_valid_label;
use crate::command::{OPERATORS, SEGMENTS, Segment, VMCommand};
use crate::error::{Result, TranslateError};
use crate::memory::{MAX_ARGS, max_index};

/// One source unit: a `.vm` file or an in-memory equivalent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Unit name, used to namespace statics (file stem for files).
    pub name: String,
    pub source: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Load a unit from disk, naming it after the file stem.
    ///
    /// The stem prefixes every static and top-level label of the unit, so it
    /// must itself be a valid Hack symbol.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|stem| is_valid_label(stem))
            .ok_or_else(|| TranslateError::InvalidPath {
                path: path.display().to_string(),
            })?;

        let source = std::fs::read_to_string(path).map_err(|e| TranslateError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        Ok(Self::new(name, source))
    }
}

/// Forward-only parser over a sequence of source units.
pub struct Parser<'a> {
    units: &'a [SourceUnit],
    current: Option<usize>,
    lines: Option<Enumerate<Lines<'a>>>,
    line: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser. Fails when there is nothing to translate.
    pub fn new(units: &'a [SourceUnit]) -> Result<Self> {
        if units.is_empty() {
            return Err(TranslateError::NoSourceUnits);
        }

        Ok(Self {
            units,
            current: None,
            lines: None,
            line: 0,
        })
    }

    /// Move to the next unit and return its name, or `None` when all units
    /// have been consumed.
    pub fn next_unit(&mut self) -> Option<&'a str> {
        let next = self.current.map_or(0, |i| i + 1);
        self.current = Some(next.min(self.units.len()));
        self.line = 0;

        match self.units.get(next) {
            Some(unit) => {
                self.lines = Some(unit.source.lines().enumerate());
                Some(unit.name.as_str())
            }
            None => {
                self.lines = None;
                None
            }
        }
    }

    /// Name of the unit currently being read.
    pub fn current_unit(&self) -> Option<&'a str> {
        self.current
            .and_then(|i| self.units.get(i))
            .map(|u| u.name.as_str())
    }

    /// 1-based line number of the last line read.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Return the next command of the current unit.
    ///
    /// `Ok(None)` signals end of unit; call [`Parser::next_unit`] to continue.
    pub fn advance(&mut self) -> Result<Option<VMCommand>> {
        let unit = self.current_unit().unwrap_or("");
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };

        for (idx, text) in lines.by_ref() {
            self.line = idx + 1;
            if let Some(cmd) = parse_line(text, idx + 1, unit)? {
                return Ok(Some(cmd));
            }
        }

        self.lines = None;
        Ok(None)
    }
}

/// Parse a single VM line into a command.
///
/// Returns `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str, line_num: usize, filename: &str) -> Result<Option<VMCommand>> {
    let line = line.split("//").next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();

    let cmd = match parts.as_slice() {
        ["return"] => VMCommand::Return,
        [word] => match OPERATORS.get(*word) {
            Some(op) => VMCommand::Arithmetic(*op),
            None => return Err(invalid_command(line, line_num, filename)),
        },

        ["label", name] => VMCommand::Label {
            name: name.to_string(),
        },
        ["goto", label] => VMCommand::Goto {
            label: label.to_string(),
        },
        ["if-goto", label] => VMCommand::IfGoto {
            label: label.to_string(),
        },

        ["push", segment, index] => {
            let (segment, index) = parse_access(segment, index, line_num, filename)?;
            VMCommand::Push { segment, index }
        }
        ["pop", segment, index] => {
            let (segment, index) = parse_access(segment, index, line_num, filename)?;
            if segment == Segment::Constant {
                return Err(TranslateError::PopToConstant {
                    line: line_num,
                    file: filename.to_string(),
                });
            }
            VMCommand::Pop { segment, index }
        }

        ["function", name, count] => VMCommand::Function {
            name: name.to_string(),
            num_locals: parse_index(count, line_num, filename)?,
        },
        ["call", name, count] => {
            let num_args = parse_index(count, line_num, filename)?;
            if num_args > MAX_ARGS {
                return Err(TranslateError::TooManyArguments {
                    line: line_num,
                    file: filename.to_string(),
                    count: num_args,
                });
            }
            VMCommand::Call {
                name: name.to_string(),
                num_args,
            }
        }

        _ => return Err(invalid_command(line, line_num, filename)),
    };

    Ok(Some(cmd))
}

fn invalid_command(line: &str, line_num: usize, filename: &str) -> TranslateError {
    TranslateError::InvalidCommand {
        line: line_num,
        file: filename.to_string(),
        command: line.to_string(),
    }
}

fn parse_access(
    segment: &str,
    index: &str,
    line_num: usize,
    filename: &str,
) -> Result<(Segment, u16)> {
    let segment = parse_segment(segment, line_num, filename)?;
    let index = parse_index(index, line_num, filename)?;
    validate_segment_index(segment, index, line_num, filename)?;
    Ok((segment, index))
}

fn parse_segment(s: &str, line_num: usize, filename: &str) -> Result<Segment> {
    SEGMENTS
        .get(s)
        .copied()
        .ok_or_else(|| TranslateError::InvalidSegment {
            line: line_num,
            file: filename.to_string(),
            segment: s.to_string(),
        })
}

fn parse_index(s: &str, line_num: usize, filename: &str) -> Result<u16> {
    s.parse::<u16>().map_err(|_| TranslateError::InvalidNumber {
        line: line_num,
        file: filename.to_string(),
        value: s.to_string(),
    })
}

fn validate_segment_index(
    segment: Segment,
    index: u16,
    line_num: usize,
    filename: &str,
) -> Result<()> {
    if index <= max_index(segment) {
        return Ok(());
    }

    Err(match segment {
        Segment::Pointer => TranslateError::InvalidPointerIndex {
            line: line_num,
            file: filename.to_string(),
            index,
        },
        Segment::Temp => TranslateError::InvalidTempIndex {
            line: line_num,
            file: filename.to_string(),
            index,
        },
        _ => TranslateError::IndexOutOfRange {
            line: line_num,
            file: filename.to_string(),
            index,
            segment: segment.keyword().to_string(),
        },
    })
}
