#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `gridwise-tensor` holds the data model of the engine: the [`Shape`] of a
//! dense row-major 2-D tensor, the reference-counted [`TensorStorage`] that
//! views share, and the [`Tensor`] itself.
//!
//! Reinterpreting a tensor (`view`, `flatten`, `reshape`, `clone`) never copies.
//! Every value-producing operation in `gridwise-tensor-ops` writes into an
//! [`OwnedBuffer`] and wraps it in new storage, so sources are never touched.
//!
//! ```rust
//! use gridwise_tensor::{shape::INFER, Tensor};
//!
//! let t = Tensor::from_shape_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//! let column = t.reshape(INFER, 1).unwrap();
//! assert_eq!(column.rows(), 4);
//!
//! let copy = t.deep_copy();
//! assert!(!copy.shares_storage_with(&t));
//! ```

/// Serde module for JSON/other format serialization and deserialization.
#[cfg(feature = "serde")]
pub mod serde;

/// Shape model, axes and reshape inference.
pub mod shape;

/// Shared and exclusively owned element buffers.
pub mod storage;

/// Tensor module containing the main tensor implementation and error types.
pub mod tensor;

pub use crate::shape::{Axis, Shape, ShapeInferenceError};
pub use crate::storage::{OwnedBuffer, TensorStorage};
pub use crate::tensor::{Bounds, Tensor, TensorError};

/// The element type, fixed at build time.
#[cfg(not(feature = "f64"))]
pub type Real = f32;

/// The element type, fixed at build time.
#[cfg(feature = "f64")]
pub type Real = f64;
