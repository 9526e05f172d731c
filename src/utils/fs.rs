//! IO helper：文档的读取、解析与格式化写出（只供宿主使用，核心不做 IO）

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde_json::Value;

use crate::model::session::AppError;

/// 从文件读取Lottie文档
pub fn read_json_file(p: &Path) -> Result<Value, AppError> {
    let rdr = BufReader::new(File::open(p)?);
    Ok(serde_json::from_reader(rdr)?)
}

/// 解析原始JSON文本（手动粘贴/编辑的文档）
pub fn parse_json_str(text: &str) -> Result<Value, AppError> {
    Ok(serde_json::from_str(text)?)
}

/// 将文档保存到文件（格式化输出，末尾换行）
pub fn write_json_file(p: &Path, value: &Value) -> Result<(), AppError> {
    let mut w = BufWriter::new(File::create(p)?);
    serde_json::to_writer_pretty(&mut w, value)?;
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_then_read_preserves_key_order() {
        let doc = json!({"v": "5.7.4", "layers": [], "fr": 30});
        let file = NamedTempFile::new().expect("创建临时文件失败");

        write_json_file(file.path(), &doc).expect("写入失败");
        let back = read_json_file(file.path()).expect("读取失败");

        assert_eq!(back, doc);
        let keys: Vec<&str> = back.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["v", "layers", "fr"], "键顺序应该与文档一致");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_json_str("{not json"), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = read_json_file(Path::new("/nonexistent/lottie.json"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
