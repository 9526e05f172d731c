//! Clipboard：把编辑映射片段复制到系统剪贴板

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("clipboard error: {0}")]
    Clip(String),
}

/// 将文本复制到系统剪贴板
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    use copypasta::{ClipboardContext, ClipboardProvider};
    let mut ctx = ClipboardContext::new().map_err(|e| ClipboardError::Clip(e.to_string()))?;
    ctx.set_contents(text.to_string())
        .map_err(|e| ClipboardError::Clip(e.to_string()))?;
    tracing::info!("已复制到剪贴板，长度: {} 字符", text.len());
    Ok(())
}
