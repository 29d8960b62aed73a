#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use gridwise_tensor as tensor;

#[doc(inline)]
pub use gridwise_tensor_ops as tensor_ops;

#[doc(inline)]
pub use gridwise_kernels as kernels;

#[doc(inline)]
pub use gridwise_kalman as kalman;
