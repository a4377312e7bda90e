//! Session store and archive adapters.

mod json_file;
mod memory;

pub use json_file::JsonFileSessionArchive;
pub use memory::InMemorySessionStore;
