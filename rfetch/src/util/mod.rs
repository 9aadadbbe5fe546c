//! General utility code that didn't fit anywhere else
//!
//! Note that most of this module is not exported.
// (c) 2026 The rfetch developers

mod address_family;
pub use address_family::AddressFamily;

mod dns;
pub(crate) use dns::lookup_host_by_family;

mod path;
pub use path::PathError;
pub(crate) use path::{require_directory, resolve_under_root};

mod tracing;
pub use tracing::TimeFormat;
pub(crate) use tracing::{
    ConsoleSink, is_initialized as tracing_is_initialised, setup as setup_tracing,
    trace_level,
};

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod test_protocol;
