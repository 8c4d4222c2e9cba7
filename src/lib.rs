//! # editopt - Edit-Instruction Sequence Optimizer
//!
//! Rewrites a sequence of positional edit instructions (INSERT,
//! REMOVE, REPLACE over a byte-indexed text) into an equivalent,
//! shorter sequence that can be applied in a single forward pass.
//! Applying the optimized sequence to any text produces the same final
//! bytes as applying the original.
//!
//! The optimizer is incremental: an [`Expression`] holds the program
//! and re-establishes its normal form every time an instruction is
//! appended. Four optimization levels select how aggressive the
//! rewriting is:
//!
//! - **0** — keep instructions exactly as given.
//! - **1** — partition into sorted INSERT / REMOVE / REPLACE runs,
//!   combining abutting removes and overlapping inserts along the way.
//! - **2** — additionally collapse an INSERT landing where a REMOVE
//!   begins into a REPLACE, and cancel removals of just-inserted text.
//! - **3** — additionally drop a REPLACE that a later same-position
//!   REPLACE overwrites entirely.
//!
//! ## Example
//!
//! ```
//! use editopt::{Block, Expression};
//!
//! let mut expr = Expression::with_level(2);
//! expr.insert(Block::with_bytes(0, b"hello".to_vec()));
//! expr.remove(Block::with_range(0, 4));
//!
//! // Inserting "hello" and then removing it cancels out entirely.
//! assert!(expr.is_empty());
//! ```
//!
//! The textual protocol (`INSERT 0 hello` and friends) lives in
//! [`parser`], and [`apply`] is a reference executor used to check
//! that rewrites preserve meaning.

mod apply;
mod block;
mod error;
mod expression;
pub mod parser;

#[cfg(test)]
mod tests;

pub use apply::apply;
pub use block::{combine_inserts, combine_removes, Block, BlockOverlap, InstructionKind};
pub use error::OptimizerError;
pub use expression::Expression;
pub use parser::{parse_into, parse_sequence};

/// Result type for parsing and I/O operations.
pub type Result<T> = std::result::Result<T, OptimizerError>;
