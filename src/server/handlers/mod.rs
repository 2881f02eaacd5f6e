pub mod artworks;
pub mod jobs;
pub mod mockups;
pub mod registry;
