//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{first_segment, format_optional, truncate_with_ellipsis};
