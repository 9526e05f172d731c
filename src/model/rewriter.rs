//! 着色回写：按 路径 -> 颜色字符串 的编辑映射生成新文档，只改动被寻址数组的 RGB 三个分量

use std::borrow::Cow;

use jsonpath_rust::{query::queryable::Queryable, JsonPath};
use serde_json::Value;

use crate::model::color::{encode_color, is_falsy_color};
use crate::model::path::StructuralPath;
use crate::model::session::AppError;

/// 产生副本时的选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorizeOptions {
    /// 为 true 且没有任何编辑生效时直接借用输入文档；默认总是深拷贝
    pub share_unmodified_subtrees: bool,
}

/// 编辑映射中的颜色值；`None` 或空白字符串表示跳过
pub trait ColorInput {
    fn as_color_str(&self) -> Option<&str>;
}

impl ColorInput for str {
    fn as_color_str(&self) -> Option<&str> {
        Some(self)
    }
}

impl ColorInput for String {
    fn as_color_str(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<T: ColorInput + ?Sized> ColorInput for &T {
    fn as_color_str(&self) -> Option<&str> {
        (**self).as_color_str()
    }
}

impl<T: ColorInput> ColorInput for Option<T> {
    fn as_color_str(&self) -> Option<&str> {
        self.as_ref().and_then(|c| c.as_color_str())
    }
}

/// 被跳过的单条编辑
#[derive(Debug)]
pub struct SkippedEdit {
    pub path: String,
    pub reason: AppError,
}

/// 着色结果
#[derive(Debug)]
pub struct Colorized<'a> {
    pub document: Cow<'a, Value>,
    /// 实际写入的路径（按编辑映射的迭代顺序）
    pub applied: Vec<String>,
    pub skipped: Vec<SkippedEdit>,
}

/// 着色并总是返回一份独立的新文档
pub fn colorize<I, K, C>(doc: &Value, edits: I) -> Value
where
    I: IntoIterator<Item = (K, C)>,
    K: AsRef<str>,
    C: ColorInput,
{
    colorize_with(doc, edits, &ColorizeOptions::default())
        .document
        .into_owned()
}

/// 着色并报告每条编辑的结果
///
/// 键可以是点分路径（按 `doc` 的实际结构解析），也可以是以 `$` 开头的 JSONPath
/// （匹配到的每个数组都会被写入）；两者都成立时按点分路径处理。无效颜色与结构不匹配只跳过该条编辑，
/// 其余编辑照常生效；输入文档永远不会被修改。
pub fn colorize_with<'a, I, K, C>(doc: &'a Value, edits: I, opts: &ColorizeOptions) -> Colorized<'a>
where
    I: IntoIterator<Item = (K, C)>,
    K: AsRef<str>,
    C: ColorInput,
{
    let mut out: Option<Value> = None;
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for (key, color) in edits {
        let key = key.as_ref();
        let Some(color) = color.as_color_str().filter(|c| !is_falsy_color(c)) else {
            tracing::debug!("空颜色，跳过: {}", key);
            continue;
        };

        let rgb = match encode_color(color) {
            Ok(raw) => [raw[0], raw[1], raw[2]],
            Err(e) => {
                tracing::warn!("颜色无效，跳过 {}: {}", key, e);
                skipped.push(SkippedEdit { path: key.to_string(), reason: e.into() });
                continue;
            }
        };

        let target = out.get_or_insert_with(|| doc.clone());
        match write_rgb(doc, target, key, rgb) {
            Ok(()) => applied.push(key.to_string()),
            Err(e) => {
                tracing::warn!("回写失败，跳过 {}: {}", key, e);
                skipped.push(SkippedEdit { path: key.to_string(), reason: e });
            }
        }
    }

    tracing::debug!("着色完成: 写入 {} 条，跳过 {} 条", applied.len(), skipped.len());

    let document = match out {
        Some(v) if !applied.is_empty() => Cow::Owned(v),
        _ if opts.share_unmodified_subtrees => Cow::Borrowed(doc),
        Some(v) => Cow::Owned(v),
        None => Cow::Owned(doc.clone()),
    };
    Colorized { document, applied, skipped }
}

/// 把 RGB 三个分量写入 `key` 指向的数组；先校验全部目标再写入，失败时不做任何改动
fn write_rgb(source: &Value, target: &mut Value, key: &str, rgb: [f64; 3]) -> Result<(), AppError> {
    // 先按文档结构解析点分路径，`$` 开头的键（如 `$x.c.k`）也可能是普通成员名
    let json_path = match StructuralPath::resolve(source, key) {
        Some(path) => path.to_json_path(),
        None if key.starts_with('$') => key.to_string(),
        None => return Err(AppError::StructuralMismatch(format!("路径不存在: {}", key))),
    };

    let paths: Vec<String> = target
        .query_only_path(&json_path)
        .map_err(|e| AppError::JsonPath(e.to_string()))?;
    if paths.is_empty() {
        return Err(AppError::StructuralMismatch(format!("未匹配到任何节点: {}", key)));
    }

    for p in &paths {
        let ok = matches!(
            target.reference_mut(p),
            Some(Value::Array(items)) if items.len() >= 3 && items[..3].iter().all(Value::is_number)
        );
        if !ok {
            return Err(AppError::StructuralMismatch(format!(
                "{} 不是颜色数组: {}",
                key, p
            )));
        }
    }

    for p in &paths {
        if let Some(Value::Array(items)) = target.reference_mut(p) {
            // 下标 3（alpha）保持原值
            for (slot, v) in items.iter_mut().zip(rgb) {
                *slot = fraction_value(v);
            }
        }
    }
    Ok(())
}

/// 整数值（0 或 1）写成整数，与文档中常见的 `[1, 0, 0, 1]` 写法保持一致
fn fraction_value(v: f64) -> Value {
    if v.fract() == 0.0 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}
