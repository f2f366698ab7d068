//! Logging facade shared by the client crates.
//!
//! With the `tracing` feature these are the `tracing` macros themselves, so
//! structured fields (`debug!(share = %name, "...")`) work as usual. Without
//! it every macro expands to a branch that never runs: plain format arguments
//! are still type-checked and count as used, but are never evaluated.

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => {
        if false {
            $crate::logging::discard(::std::format_args!($($t)*))
        }
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => {
        if false {
            $crate::logging::discard(::std::format_args!($($t)*))
        }
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! info {
    ($($t:tt)*) => {
        if false {
            $crate::logging::discard(::std::format_args!($($t)*))
        }
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => {
        if false {
            $crate::logging::discard(::std::format_args!($($t)*))
        }
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! error {
    ($($t:tt)*) => {
        if false {
            $crate::logging::discard(::std::format_args!($($t)*))
        }
    };
}

#[cfg(not(feature = "tracing"))]
pub use crate::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing"))]
#[doc(hidden)]
pub fn discard(_arguments: std::fmt::Arguments<'_>) {}
