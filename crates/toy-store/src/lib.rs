//! Instruction model, content-addressed fragment codec, and on-disk program
//! repository shared by every other Toy crate.
//!
//! This crate is deliberately inert with respect to execution: it knows how
//! to digest, encode, decode, rebase, and store instruction trees, but
//! nothing here knows how to run one. `toy-vm` depends on this crate, not
//! the other way around, which is also why the runtime-only trap
//! instruction the debugger needs has no variant in [`InstructionKind`] —
//! see that type's documentation.

pub mod codec;
mod error;
mod executable;
mod fragment;
mod instruction;
mod location;
pub mod rebase;
mod repository;
mod section;
mod ticket;

pub use error::{CodecError, ExecutableError, RebaseError, RepositoryError};
pub use executable::{DebugLineRecord, Executable, RepositoryRecord, Symbol};
pub use fragment::{FSection, Fragment, IFixup, XFixup};
pub use instruction::{Instruction, InstructionKind, InstructionWalk};
pub use location::SourceLocation;
pub use repository::{LinksRecord, Repository};
pub use section::SectionType;
pub use ticket::{TicketFile, TicketFileEntry, TicketMember};
