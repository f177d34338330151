//! Clause text tokenization.
//!
//! A *clause* is the persisted textual form of a condition, selector,
//! getter, or command. This module is the shared lexical layer: it
//! splits and scans clause text with parenthesis-depth awareness, and
//! defines the error taxonomy every parser in the crate reports.
//!
//! The clause grammar is the wire format for rule data; it must parse
//! identically across runs, so nothing here consults game state.

mod error;
mod tokenizer;

pub use error::ClauseError;
pub use tokenizer::{
    balanced, find_comparison, find_logical, is_wrapped, split_args, split_call,
    split_statements, split_top_level, strip_parens, CompareOp,
};
