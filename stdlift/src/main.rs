//! Main binary entry point for the `stdlift` analyzer.
//!
//! This binary simply delegates to the shared `entry_point::run_with_args()` function
//! so it behaves exactly like the `stdlift` binary of the CLI crate.

use anyhow::Result;

fn main() -> Result<()> {
    let code = stdlift::entry_point::run_with_args(std::env::args().skip(1).collect())?;
    std::process::exit(code);
}
