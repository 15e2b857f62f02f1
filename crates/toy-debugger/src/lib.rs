//! Interactive debugger kernel for the Toy VM: step/next execution control
//! plus read-only stack inspection, built directly on `toy_vm::Machine`.

pub mod stacks;
pub mod step;

pub use stacks::DEFAULT_MAX_ROWS;
pub use step::step;
