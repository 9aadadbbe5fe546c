//! rfetch utility - main entrypoint
// (c) 2026 The rfetch developers

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::process::ExitCode;

#[cfg_attr(coverage_nightly, coverage(off))]
fn main() -> ExitCode {
    rfetch::main(std::env::args_os())
}
