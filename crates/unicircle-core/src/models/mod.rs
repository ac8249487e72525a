pub mod collection;
pub mod ids;
pub mod item;
