// Persisted client-local state

pub mod layout;

pub use layout::{LayoutSnapshot, LayoutStore};
