//! N-gram-based Xhosa text generation library.
//!
//! This crate provides the statistical core of a small conversational
//! text generator for an agglutinative language:
//! - Character-level and word-level n-gram models
//! - Three interchangeable smoothing policies, including recursive
//!   discounted back-off for sparse contexts
//! - Probabilistic generation with phonological validity filtering
//!   and bounded retry/fallback guarantees
//! - Built-in corpus data, corpus cleanup, and model persistence
//!
//! Only the high-level API is exposed publicly. Low-level components
//! are kept internal to ensure consistency and prevent misuse.

/// Core n-gram models, smoothing and generation logic.
pub mod model;

/// Built-in Xhosa training data and external-corpus cleanup.
pub mod corpus;

/// Conversational wrapper tying a trained model to chat semantics.
pub mod chat;

/// I/O utilities (file loading, path helpers). Not exposed publicly.
pub(crate) mod io;
