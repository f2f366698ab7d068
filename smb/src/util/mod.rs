//! Macros implementing the wire traits for `bitflags` types.

pub(crate) mod flags_helper;
