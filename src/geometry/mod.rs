pub mod fit;
pub mod perspective;
pub mod zone;
