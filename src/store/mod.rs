pub mod artworks;
pub mod catalog;
pub mod mockups;
