pub mod approval;
pub mod locks;
pub mod status;
