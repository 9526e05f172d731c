//! 颜色位点清单：深度优先前序遍历整棵 JSON，收集所有 `c.k` 静态颜色数组

use serde_json::Value;

use crate::model::color::{raw_color_array, Color};
use crate::model::path::{is_color_path, Segment, StructuralPath};

/// 名称轨迹的展示分隔符
pub const LABEL_SEPARATOR: &str = " / ";

/// 祖先对象上约定的名称字段
const NAME_FIELD: &str = "nm";

/// 一个被发现的颜色位点（以路径为身份）
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSite {
    /// 从根出发的结构路径
    pub path: StructuralPath,
    /// 祖先 `nm` 字段拼接而成的标签，可能为空
    pub label: String,
    /// 解码后的颜色
    pub color: Color,
}

impl ColorSite {
    /// 点分路径，用作编辑映射的键
    pub fn dotted_path(&self) -> String {
        self.path.to_dotted()
    }

    pub fn hex(&self) -> String {
        self.color.to_hex()
    }
}

/// 遍历文档，按前序与兄弟自然顺序返回颜色位点
///
/// 只有路径以 `c.k` 结尾且值恰好为 4 个数字的数组才算位点；
/// 动画（关键帧）形式的 `c.k` 会被静默跳过。
pub fn walk(root: &Value) -> Vec<ColorSite> {
    fn visit_child(
        out: &mut Vec<ColorSite>,
        trail: &mut Vec<String>,
        path: StructuralPath,
        child: &Value,
    ) {
        if is_color_path(&path) {
            if let Some(raw) = raw_color_array(child) {
                out.push(ColorSite {
                    path: path.clone(),
                    label: trail.join(LABEL_SEPARATOR),
                    color: Color::decode(raw),
                });
            }
        }

        // 子对象自身的名称只影响其后代的标签
        let pushed = match child.get(NAME_FIELD) {
            Some(Value::String(name)) => {
                trail.push(name.clone());
                true
            }
            _ => false,
        };
        descend(out, trail, &path, child);
        if pushed {
            trail.pop();
        }
    }

    fn descend(out: &mut Vec<ColorSite>, trail: &mut Vec<String>, path: &StructuralPath, v: &Value) {
        match v {
            Value::Object(map) => {
                for (k, child) in map {
                    visit_child(out, trail, path.child(Segment::Key(k.clone())), child);
                }
            }
            Value::Array(arr) => {
                for (idx, child) in arr.iter().enumerate() {
                    visit_child(out, trail, path.child(Segment::Index(idx)), child);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    let mut trail = Vec::new();
    descend(&mut out, &mut trail, &StructuralPath::root(), root);
    tracing::debug!("颜色位点遍历完成: {} 个", out.len());
    out
}
