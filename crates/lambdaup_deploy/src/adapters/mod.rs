pub mod archiver;
pub mod compiler;
pub mod object_store;
pub mod registry;
