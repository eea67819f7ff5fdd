//! VM command model.
//!
//! One variant per command kind, each carrying exactly the arguments that kind
//! needs.

use std::fmt;

use phf::phf_map;

/// Arithmetic and logical operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

/// Memory segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Local,
    Argument,
    This,
    That,
    Constant,
    Static,
    Pointer,
    Temp,
}

/// Operator keywords (compile-time perfect hash map).
pub static OPERATORS: phf::Map<&'static str, ArithmeticOp> = phf_map! {
    "add" => ArithmeticOp::Add,
    "sub" => ArithmeticOp::Sub,
    "neg" => ArithmeticOp::Neg,
    "eq" => ArithmeticOp::Eq,
    "gt" => ArithmeticOp::Gt,
    "lt" => ArithmeticOp::Lt,
    "and" => ArithmeticOp::And,
    "or" => ArithmeticOp::Or,
    "not" => ArithmeticOp::Not,
};

/// Segment keywords.
pub static SEGMENTS: phf::Map<&'static str, Segment> = phf_map! {
    "local" => Segment::Local,
    "argument" => Segment::Argument,
    "this" => Segment::This,
    "that" => Segment::That,
    "constant" => Segment::Constant,
    "static" => Segment::Static,
    "pointer" => Segment::Pointer,
    "temp" => Segment::Temp,
};

impl ArithmeticOp {
    /// Number of stack operands consumed.
    pub fn arity(self) -> usize {
        match self {
            ArithmeticOp::Neg | ArithmeticOp::Not => 1,
            _ => 2,
        }
    }

    /// True for `eq`, `gt` and `lt`.
    pub fn is_comparison(self) -> bool {
        matches!(self, ArithmeticOp::Eq | ArithmeticOp::Gt | ArithmeticOp::Lt)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        }
    }
}

impl Segment {
    pub fn keyword(self) -> &'static str {
        match self {
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Constant => "constant",
            Segment::Static => "static",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

/// VM command variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VMCommand {
    Arithmetic(ArithmeticOp),

    Push { segment: Segment, index: u16 },
    Pop { segment: Segment, index: u16 },

    Label { name: String },
    Goto { label: String },
    IfGoto { label: String },

    Function { name: String, num_locals: u16 },
    Call { name: String, num_args: u16 },
    Return,
}

impl fmt::Display for VMCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VMCommand::Arithmetic(op) => f.write_str(op.keyword()),
            VMCommand::Push { segment, index } => write!(f, "push {} {}", segment.keyword(), index),
            VMCommand::Pop { segment, index } => write!(f, "pop {} {}", segment.keyword(), index),
            VMCommand::Label { name } => write!(f, "label {name}"),
            VMCommand::Goto { label } => write!(f, "goto {label}"),
            VMCommand::IfGoto { label } => write!(f, "if-goto {label}"),
            VMCommand::Function { name, num_locals } => write!(f, "function {name} {num_locals}"),
            VMCommand::Call { name, num_args } => write!(f, "call {name} {num_args}"),
            VMCommand::Return => f.write_str("return"),
        }
    }
}
