//! Hack assembly generation for every VM command.
//!
//! All stack traffic goes through two idioms:
//!
//! - push D: `@SP / A=M / M=D / @SP / M=M+1`
//! - pop to D: `@SP / AM=M-1 / D=M`
//!
//! Internal labels (return addresses, comparison branches) are minted from a
//! single run-wide counter and always start with `$`. User function names may
//! not start with `$`, and user labels are emitted as `<function>$<label>`, so
//! the two namespaces cannot meet.

use log::{debug, trace};

use crate::command::{ArithmeticOp, Segment, VMCommand};
use crate::error::{Result, TranslateError};
use crate::memory::{
    FRAME_SIZE, SCRATCH_ADDR, SCRATCH_RET, STACK_BASE, SegmentAccess, segment_access,
};

const PUSH_D: &str = "@SP\nA=M\nM=D\n@SP\nM=M+1\n";
const POP_D: &str = "@SP\nAM=M-1\nD=M\n";

/// Conventional entry point called by the bootstrap.
pub const DEFAULT_ENTRY: &str = "Sys.init";

/// Code generator state for one translation run.
pub struct CodeGenerator {
    /// Run-wide counter for internal labels. Never reset.
    label_counter: usize,
    /// Unit being translated, namespaces statics.
    current_unit: String,
    /// Label scope: the enclosing function, or the unit before any function.
    current_function: String,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            label_counter: 0,
            current_unit: String::new(),
            current_function: String::new(),
        }
    }

    /// Start translating a new source unit.
    pub fn set_unit(&mut self, name: &str) {
        debug!("translating unit {name}");
        self.current_unit = name.to_string();
        self.current_function = name.to_string();
    }

    pub fn current_unit(&self) -> &str {
        &self.current_unit
    }

    pub fn current_function(&self) -> &str {
        &self.current_function
    }

    /// Number of internal labels minted so far.
    pub fn label_counter(&self) -> usize {
        self.label_counter
    }

    /// Translate one command, appending its assembly to `buf`.
    ///
    /// `line` is only used for error reporting. On error nothing is appended.
    pub fn translate(&mut self, cmd: &VMCommand, line: usize, buf: &mut String) -> Result<()> {
        trace!("{}:{}: {}", self.current_unit, line, cmd);

        match cmd {
            VMCommand::Arithmetic(op) => self.translate_arithmetic(*op, buf),
            VMCommand::Push { segment, index } => self.translate_push(*segment, *index, buf),
            VMCommand::Pop { segment, index } => self.translate_pop(*segment, *index, buf),
            VMCommand::Label { name } => {
                self.check_label(name, line)?;
                self.translate_label(name, buf);
            }
            VMCommand::Goto { label } => self.translate_goto(label, buf),
            VMCommand::IfGoto { label } => self.translate_if_goto(label, buf),
            VMCommand::Function { name, num_locals } => {
                self.check_function(name, line)?;
                self.translate_function(name, *num_locals, buf);
            }
            VMCommand::Call { name, num_args } => {
                self.check_function(name, line)?;
                self.translate_call(name, *num_args, buf);
            }
            VMCommand::Return => self.translate_return(buf),
        }

        Ok(())
    }

    /// Emit the program preamble: `SP = 256`, then `call <entry> 0`.
    ///
    /// A halt loop follows the call in case the entry function returns.
    /// The entry name obeys the same rules as any `call` target; on error
    /// nothing is appended.
    pub fn bootstrap(&mut self, entry: &str, buf: &mut String) -> Result<()> {
        if !is_valid_function(entry) {
            return Err(TranslateError::InvalidEntryName {
                name: entry.to_string(),
            });
        }

        buf.push('@');
        push_decimal(STACK_BASE as usize, buf);
        buf.push_str("\nD=A\n@SP\nM=D\n");

        self.translate_call(entry, 0, buf);

        let halt = self.next_label();
        buf.push_str("($HALT.");
        push_decimal(halt, buf);
        buf.push_str(")\n@$HALT.");
        push_decimal(halt, buf);
        buf.push_str("\n0;JMP\n");
        Ok(())
    }

    fn next_label(&mut self) -> usize {
        let n = self.label_counter;
        self.label_counter += 1;
        n
    }

    // =========================================================================
    // Arithmetic/Logical Commands
    // =========================================================================

    fn translate_arithmetic(&mut self, op: ArithmeticOp, buf: &mut String) {
        match op {
            ArithmeticOp::Add => translate_binary("D+M", buf),
            ArithmeticOp::Sub => translate_binary("M-D", buf),
            ArithmeticOp::And => translate_binary("D&M", buf),
            ArithmeticOp::Or => translate_binary("D|M", buf),
            ArithmeticOp::Neg => translate_unary("-M", buf),
            ArithmeticOp::Not => translate_unary("!M", buf),
            ArithmeticOp::Eq => self.translate_comparison("JEQ", buf),
            ArithmeticOp::Gt => self.translate_comparison("JGT", buf),
            ArithmeticOp::Lt => self.translate_comparison("JLT", buf),
        }
    }

    fn translate_comparison(&mut self, jump: &str, buf: &mut String) {
        let n = self.next_label();

        // D = left - right, left cell becomes the result
        buf.push_str(POP_D);
        buf.push_str("A=A-1\nD=M-D\n@");
        write_comparison_label(jump, "TRUE", n, buf);
        buf.push_str("\nD;");
        buf.push_str(jump);
        buf.push_str("\n@SP\nA=M-1\nM=0\n@");
        write_comparison_label(jump, "END", n, buf);
        buf.push_str("\n0;JMP\n(");
        write_comparison_label(jump, "TRUE", n, buf);
        buf.push_str(")\n@SP\nA=M-1\nM=-1\n(");
        write_comparison_label(jump, "END", n, buf);
        buf.push_str(")\n");
    }

    // =========================================================================
    // Memory Access Commands
    // =========================================================================

    fn translate_push(&self, segment: Segment, index: u16, buf: &mut String) {
        match segment_access(segment) {
            SegmentAccess::Constant => {
                buf.push('@');
                push_decimal(index as usize, buf);
                buf.push_str("\nD=A\n");
            }
            SegmentAccess::Indirect(base) => {
                buf.push('@');
                push_decimal(index as usize, buf);
                buf.push_str("\nD=A\n@");
                buf.push_str(base);
                buf.push_str("\nA=D+M\nD=M\n");
            }
            SegmentAccess::Direct(base) => {
                buf.push('@');
                push_decimal((base + index) as usize, buf);
                buf.push_str("\nD=M\n");
            }
            SegmentAccess::Static => {
                buf.push('@');
                self.write_static(index, buf);
                buf.push_str("\nD=M\n");
            }
        }
        buf.push_str(PUSH_D);
    }

    fn translate_pop(&self, segment: Segment, index: u16, buf: &mut String) {
        match segment_access(segment) {
            SegmentAccess::Constant => {
                debug_assert!(false, "pop to constant is rejected by the parser");
            }
            SegmentAccess::Indirect(base) => {
                // Stage the address before the pop clobbers D
                buf.push('@');
                push_decimal(index as usize, buf);
                buf.push_str("\nD=A\n@");
                buf.push_str(base);
                buf.push_str("\nD=D+M\n@");
                buf.push_str(SCRATCH_ADDR);
                buf.push_str("\nM=D\n");
                buf.push_str(POP_D);
                buf.push('@');
                buf.push_str(SCRATCH_ADDR);
                buf.push_str("\nA=M\nM=D\n");
            }
            SegmentAccess::Direct(base) => {
                buf.push_str(POP_D);
                buf.push('@');
                push_decimal((base + index) as usize, buf);
                buf.push_str("\nM=D\n");
            }
            SegmentAccess::Static => {
                buf.push_str(POP_D);
                buf.push('@');
                self.write_static(index, buf);
                buf.push_str("\nM=D\n");
            }
        }
    }

    fn write_static(&self, index: u16, buf: &mut String) {
        buf.push_str(&self.current_unit);
        buf.push('.');
        push_decimal(index as usize, buf);
    }

    // =========================================================================
    // Program Flow Commands
    // =========================================================================

    fn translate_label(&self, name: &str, buf: &mut String) {
        buf.push('(');
        self.write_scoped_label(name, buf);
        buf.push_str(")\n");
    }

    fn translate_goto(&self, label: &str, buf: &mut String) {
        buf.push('@');
        self.write_scoped_label(label, buf);
        buf.push_str("\n0;JMP\n");
    }

    fn translate_if_goto(&self, label: &str, buf: &mut String) {
        buf.push_str(POP_D);
        buf.push('@');
        self.write_scoped_label(label, buf);
        buf.push_str("\nD;JNE\n");
    }

    fn write_scoped_label(&self, label: &str, buf: &mut String) {
        buf.push_str(&self.current_function);
        buf.push('$');
        buf.push_str(label);
    }

    fn check_label(&self, name: &str, line: usize) -> Result<()> {
        if is_valid_label(name) {
            Ok(())
        } else {
            Err(TranslateError::InvalidLabelName {
                line,
                file: self.current_unit.clone(),
                name: name.to_string(),
            })
        }
    }

    fn check_function(&self, name: &str, line: usize) -> Result<()> {
        if is_valid_function(name) {
            Ok(())
        } else {
            Err(TranslateError::InvalidFunctionName {
                line,
                file: self.current_unit.clone(),
                name: name.to_string(),
            })
        }
    }

    // =========================================================================
    // Function Commands
    // =========================================================================

    fn translate_function(&mut self, name: &str, num_locals: u16, buf: &mut String) {
        self.current_function = name.to_string();

        buf.push('(');
        buf.push_str(name);
        buf.push_str(")\n");

        if num_locals > 0 {
            buf.push_str("D=0\n");
        }
        for _ in 0..num_locals {
            buf.push_str(PUSH_D);
        }
    }

    fn translate_call(&mut self, name: &str, num_args: u16, buf: &mut String) {
        let n = self.next_label();

        buf.push('@');
        self.write_return_label(n, buf);
        buf.push_str("\nD=A\n");
        buf.push_str(PUSH_D);

        for reg in ["LCL", "ARG", "THIS", "THAT"] {
            buf.push('@');
            buf.push_str(reg);
            buf.push_str("\nD=M\n");
            buf.push_str(PUSH_D);
        }

        // ARG = SP - num_args - 5
        buf.push_str("@SP\nD=M\n@");
        push_decimal(num_args as usize + FRAME_SIZE as usize, buf);
        buf.push_str("\nD=D-A\n@ARG\nM=D\n");

        // LCL = SP
        buf.push_str("@SP\nD=M\n@LCL\nM=D\n");

        buf.push('@');
        buf.push_str(name);
        buf.push_str("\n0;JMP\n(");
        self.write_return_label(n, buf);
        buf.push_str(")\n");
    }

    fn write_return_label(&self, n: usize, buf: &mut String) {
        buf.push('$');
        buf.push_str(&self.current_function);
        buf.push_str("$ret.");
        push_decimal(n, buf);
    }

    fn translate_return(&self, buf: &mut String) {
        // frame = LCL
        buf.push_str("@LCL\nD=M\n@");
        buf.push_str(SCRATCH_ADDR);
        buf.push_str("\nM=D\n");

        // retAddr = *(frame - 5), read before *ARG can overwrite it
        buf.push('@');
        push_decimal(FRAME_SIZE as usize, buf);
        buf.push_str("\nA=D-A\nD=M\n@");
        buf.push_str(SCRATCH_RET);
        buf.push_str("\nM=D\n");

        // *ARG = pop()
        buf.push_str(POP_D);
        buf.push_str("@ARG\nA=M\nM=D\n");

        // SP = ARG + 1
        buf.push_str("@ARG\nD=M+1\n@SP\nM=D\n");

        // THAT, THIS, ARG, LCL = *(frame - 1..4), walking the frame pointer down
        for reg in ["THAT", "THIS", "ARG", "LCL"] {
            buf.push('@');
            buf.push_str(SCRATCH_ADDR);
            buf.push_str("\nAM=M-1\nD=M\n@");
            buf.push_str(reg);
            buf.push_str("\nM=D\n");
        }

        buf.push('@');
        buf.push_str(SCRATCH_RET);
        buf.push_str("\nA=M\n0;JMP\n");
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn translate_binary(operation: &str, buf: &mut String) {
    buf.push_str(POP_D);
    buf.push_str("A=A-1\nM=");
    buf.push_str(operation);
    buf.push('\n');
}

fn translate_unary(operation: &str, buf: &mut String) {
    buf.push_str("@SP\nA=M-1\nM=");
    buf.push_str(operation);
    buf.push('\n');
}

/// `$JEQ_TRUE.7` style label.
fn write_comparison_label(jump: &str, suffix: &str, n: usize, buf: &mut String) {
    buf.push('$');
    buf.push_str(jump);
    buf.push('_');
    buf.push_str(suffix);
    buf.push('.');
    push_decimal(n, buf);
}

/// Check a symbol against Hack's rules: `[A-Za-z0-9_.:$]`, no leading digit.
pub fn is_valid_label(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_symbol_char(c) && !c.is_ascii_digit() => chars.all(is_symbol_char),
        _ => false,
    }
}

/// Function names are labels outside the reserved `$` namespace.
fn is_valid_function(name: &str) -> bool {
    is_valid_label(name) && !name.starts_with('$')
}

#[inline]
fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '$')
}

/// Append a decimal number without allocating.
#[inline]
fn push_decimal(n: usize, buf: &mut String) {
    if n == 0 {
        buf.push('0');
        return;
    }

    let mut digits = [0u8; 20];
    let mut i = 0;
    let mut num = n;

    while num > 0 {
        digits[i] = (num % 10) as u8;
        num /= 10;
        i += 1;
    }

    while i > 0 {
        i -= 1;
        buf.push((b'0' + digits[i]) as char);
    }
}
