pub mod context;
pub mod sync;
