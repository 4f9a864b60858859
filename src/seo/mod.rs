pub mod jsonld;
pub mod meta;

pub use meta::{build_meta, PageMeta};
