//! Output encoding.

/// JPEG export of the final buffer.
pub mod jpeg;
