pub mod apply;
pub mod preset;
