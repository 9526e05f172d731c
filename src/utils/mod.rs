pub mod clipboard;
pub mod fs;
