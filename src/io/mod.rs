mod byte_store;
mod file_store;

pub use byte_store::{read_u16_be, read_u16_le, ByteStore};
pub use file_store::{FileStore, MemoryStore};
