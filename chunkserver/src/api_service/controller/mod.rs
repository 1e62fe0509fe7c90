pub mod catchers;
pub mod upload;
