//! One module per subcommand, mirroring `Commands` in `main.rs`.

pub mod compile;
pub mod debugger;
pub mod gc;
pub mod link;
pub mod merge;
pub mod strip;
pub mod vm;
