//! Segment to Hack RAM mapping.
//!
//! RAM[0..=4] hold SP, LCL, ARG, THIS, THAT. `pointer` aliases RAM[3..=4],
//! `temp` is RAM[5..=12], R13/R14 are scratch cells owned by the translator.

use crate::command::Segment;

/// Address the stack starts at after bootstrap.
pub const STACK_BASE: u16 = 256;

/// Fixed base of the `pointer` segment.
pub const POINTER_BASE: u16 = 3;

/// Fixed base of the `temp` segment.
pub const TEMP_BASE: u16 = 5;

/// Largest literal an A-instruction can load.
pub const MAX_CONSTANT: u16 = 32767;

/// Words pushed by a call before jumping: return address, LCL, ARG, THIS, THAT.
pub const FRAME_SIZE: u16 = 5;

/// Largest `call` argument count, so `@n+5` still fits an A-instruction.
pub const MAX_ARGS: u16 = MAX_CONSTANT - FRAME_SIZE;

/// Scratch cell for staged addresses and the return frame pointer.
pub const SCRATCH_ADDR: &str = "R13";

/// Scratch cell for the return address during `return`.
pub const SCRATCH_RET: &str = "R14";

/// Segment access mode for code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentAccess {
    /// Not memory backed; the index is the value.
    Constant,
    /// Base register holds a pointer: address = *base + index.
    Indirect(&'static str),
    /// Fixed base: address = base + index.
    Direct(u16),
    /// Per-unit symbol `<unit>.<index>`.
    Static,
}

/// Determine the access mode for a segment.
pub fn segment_access(segment: Segment) -> SegmentAccess {
    match segment {
        Segment::Constant => SegmentAccess::Constant,
        Segment::Local => SegmentAccess::Indirect("LCL"),
        Segment::Argument => SegmentAccess::Indirect("ARG"),
        Segment::This => SegmentAccess::Indirect("THIS"),
        Segment::That => SegmentAccess::Indirect("THAT"),
        Segment::Pointer => SegmentAccess::Direct(POINTER_BASE),
        Segment::Temp => SegmentAccess::Direct(TEMP_BASE),
        Segment::Static => SegmentAccess::Static,
    }
}

/// Largest valid index for a segment.
///
/// Indices of the remaining segments are emitted as `@i` literals, so they
/// share the A-instruction bound with `constant`.
pub fn max_index(segment: Segment) -> u16 {
    match segment {
        Segment::Pointer => 1,
        Segment::Temp => 7,
        _ => MAX_CONSTANT,
    }
}
