//! Links compiled fragments named by a set of tickets into a single
//! addressable [`toy_store::Executable`].
//!
//! The pipeline is the four stages the module breakdown names: collect the
//! eligible fragment set ([`eligible::collect`]), walk the external-reference
//! graph from the requested entry points ([`graph::walk_from_entries`]), lay
//! out every visited fragment's sections ([`layout`]), and patch fixups while
//! assembling the final image ([`output::link`]).

mod eligible;
mod error;
mod fixup;
mod graph;
mod layout;
mod output;

pub use eligible::{collect, EligibleFragment};
pub use error::LinkError;
pub use fixup::apply_fixups;
pub use graph::{walk_from_entries, LinkVisitor};
pub use layout::{is_stay_at_home, section_bases, Layout, LayoutBuilder, Placement, SectionLayout};
pub use output::{link, LinkResult};
