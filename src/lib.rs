//! Lottie 着色工具库
//!
//! 在 Lottie 文档中按结构位置（`c.k`）发现静态颜色，并按 路径 -> 颜色 的编辑映射回写，
//! 保持文档其余部分不变。每次结构变化后都从头重新遍历，不做增量修补。

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::color::{decode_color, encode_color, Color, ColorError};
pub use model::path::{is_color_path, Segment, StructuralPath};
pub use model::rewriter::{colorize, colorize_with, ColorInput, ColorizeOptions, Colorized, SkippedEdit};
pub use model::session::{AppError, Session};
pub use model::walker::{walk, ColorSite};
