pub mod application;
pub mod input_box;
pub mod portals;
pub mod tokens;
