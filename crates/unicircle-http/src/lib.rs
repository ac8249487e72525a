pub mod client;
pub mod wire;

pub use client::{HttpCollectionStore, API_KEY_HEADER};
