//! Local package index
//!
//! The index records every package installed under one install root:
//! name, version, declared requirements, and the entry points owned by
//! the package. It is the registry install/remove operations consult
//! and the place requirement resolution looks packages up.

mod record;
mod store;

pub use record::{IndexFile, InstalledPackage};
pub use store::IndexStore;
