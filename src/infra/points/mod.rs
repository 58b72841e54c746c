// Points storage implementations.

#[cfg(test)]
mod in_memory;
mod sqlite_store;

#[cfg(test)]
pub use in_memory::InMemoryPointsStore;
pub use sqlite_store::SqlitePointsStore;
