pub mod color;
pub mod named_colors;
pub mod path;
pub mod rewriter;
pub mod session;
pub mod walker;
