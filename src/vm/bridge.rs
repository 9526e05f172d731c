//! VM桥接层：把颜色位点清单渲染成命令行输出，解析命令行传入的编辑

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::session::AppError;
use crate::model::walker::ColorSite;

// === 常量定义（消除魔法值） ===
pub const STATUS_LOADED: &str = "文件加载完成";
pub const STATUS_NO_SITES: &str = "未发现静态颜色位点";
pub const STATUS_COPIED: &str = "已复制到剪贴板";
pub const STATUS_WRITE_BACK_SUCCESS: &str = "回写成功";
pub const STATUS_SKIPPED_PREFIX: &str = "跳过: ";

/// 清单中单个位点的可序列化视图
#[derive(Debug, Serialize)]
pub struct SiteView<'a> {
    pub path: String,
    pub json_path: String,
    pub label: &'a str,
    pub color: String,
    pub alpha: f64,
}

impl<'a> From<&'a ColorSite> for SiteView<'a> {
    fn from(site: &'a ColorSite) -> Self {
        Self {
            path: site.dotted_path(),
            json_path: site.path.to_json_path(),
            label: &site.label,
            color: site.hex(),
            alpha: site.color.a,
        }
    }
}

/// 文本表格：每行 `路径  颜色  alpha  标签`
pub fn render_site_table(sites: &[ColorSite]) -> String {
    if sites.is_empty() {
        return STATUS_NO_SITES.to_string();
    }
    let width = sites
        .iter()
        .map(|s| s.dotted_path().len())
        .max()
        .unwrap_or(0);
    sites
        .iter()
        .map(|s| {
            let line = format!("{:<width$}  {}  {:.2}", s.dotted_path(), s.hex(), s.color.a);
            if s.label.is_empty() {
                line
            } else {
                format!("{}  {}", line, s.label)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 完整清单的 JSON 输出
pub fn render_inventory_json(sites: &[ColorSite]) -> Result<String, AppError> {
    let views: Vec<SiteView<'_>> = sites.iter().map(SiteView::from).collect();
    Ok(serde_json::to_string_pretty(&views)?)
}

/// 编辑映射片段：按清单顺序的 `{ "路径": "#rrggbb" }`，可直接作为 apply 的 --edits 输入
pub fn render_edit_map(sites: &[ColorSite]) -> Result<String, AppError> {
    let map: Map<String, Value> = sites
        .iter()
        .map(|s| (s.dotted_path(), Value::String(s.hex())))
        .collect();
    Ok(serde_json::to_string_pretty(&Value::Object(map))?)
}

/// 解析编辑映射文件；非字符串的值（null/false/数字）按"空颜色"处理，即跳过
pub fn parse_edit_map(text: &str) -> Result<Vec<(String, Option<String>)>, AppError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(map) = value else {
        return Err(AppError::State("编辑映射必须是 JSON 对象".into()));
    };
    Ok(map
        .into_iter()
        .map(|(path, color)| match color {
            Value::String(s) => (path, Some(s)),
            _ => (path, None),
        })
        .collect())
}

/// 解析 `路径=颜色` 形式的命令行参数
pub fn parse_set_arg(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((path, color)) if !path.trim().is_empty() => {
            Ok((path.trim().to_string(), color.trim().to_string()))
        }
        _ => Err(format!("期望 路径=颜色，实际为: {}", arg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::walker::walk;
    use serde_json::json;

    fn sites() -> Vec<ColorSite> {
        walk(&json!({
            "layers": [{
                "nm": "Check",
                "shapes": [{"c": {"k": [1, 0, 0, 1]}}, {"c": {"k": [0, 0, 1, 0.5]}}]
            }]
        }))
    }

    #[test]
    fn test_render_site_table() {
        let table = render_site_table(&sites());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("layers.0.shapes.0.c.k  #ff0000  1.00"));
        assert!(lines[1].ends_with("0.50  Check"));
        assert_eq!(render_site_table(&[]), STATUS_NO_SITES);
    }

    #[test]
    fn test_render_edit_map_keeps_inventory_order() {
        let text = render_edit_map(&sites()).expect("渲染失败");
        let parsed: Value = serde_json::from_str(&text).unwrap();
        let keys: Vec<&String> = parsed.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["layers.0.shapes.0.c.k", "layers.0.shapes.1.c.k"]);
        assert_eq!(parsed["layers.0.shapes.1.c.k"], json!("#0000ff"));
    }

    #[test]
    fn test_render_inventory_json() {
        let text = render_inventory_json(&sites()).expect("渲染失败");
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["json_path"], json!("$.layers[0].shapes[0].c.k"));
        assert_eq!(parsed[1]["label"], json!("Check"));
        assert_eq!(parsed[1]["alpha"], json!(0.5));
    }

    #[test]
    fn test_parse_edit_map() {
        let edits = parse_edit_map(r##"{"a.c.k": "#fff", "b.c.k": null, "c.k": false}"##).unwrap();
        assert_eq!(
            edits,
            vec![
                ("a.c.k".to_string(), Some("#fff".to_string())),
                ("b.c.k".to_string(), None),
                ("c.k".to_string(), None),
            ]
        );
        assert!(matches!(parse_edit_map("[1]"), Err(AppError::State(_))));
        assert!(matches!(parse_edit_map("{"), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_parse_set_arg() {
        assert_eq!(
            parse_set_arg("layers.0.c.k=#ff0000"),
            Ok(("layers.0.c.k".to_string(), "#ff0000".to_string()))
        );
        assert_eq!(
            parse_set_arg("c.k=rgb(1, 2, 3)"),
            Ok(("c.k".to_string(), "rgb(1, 2, 3)".to_string()))
        );
        assert!(parse_set_arg("no-equals").is_err());
        assert!(parse_set_arg("=red").is_err());
    }
}
