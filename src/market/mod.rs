pub mod http;
pub mod listing;
pub mod memory;
pub mod sync;
