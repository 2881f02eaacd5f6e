pub mod pack;
pub mod source;
pub mod store;
pub mod template;
