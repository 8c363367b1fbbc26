pub mod container;
pub mod registry;
