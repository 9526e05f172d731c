//! 结构路径（StructuralPath）：带标签的键/索引序列，以及颜色路径判定

use std::fmt;

use serde_json::Value;

/// 路径段：对象键或数组索引（内部始终区分，只在边界处拍平成字符串）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    fn is_key(&self, name: &str) -> bool {
        matches!(self, Segment::Key(k) if k == name)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Segment {
    fn from(k: &str) -> Self {
        Segment::Key(k.to_string())
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment::Index(i)
    }
}

/// 从文档根出发的结构路径
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructuralPath {
    segments: Vec<Segment>,
}

impl StructuralPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// 追加一段，返回新路径（父路径保持不变）
    pub fn child(&self, seg: impl Into<Segment>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(seg.into());
        Self { segments }
    }

    /// 展示/存储用的点分形式，如 `layers.0.shapes.2.c.k`
    ///
    /// 注意：该形式无法区分数组索引与数字形式的对象键，只用于展示与编辑映射的键。
    pub fn to_dotted(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// RFC 9535 JSONPath（用于精确寻址与回写）
    pub fn to_json_path(&self) -> String {
        let mut out = String::from("$");
        for seg in &self.segments {
            match seg {
                Segment::Index(i) => out.push_str(&format!("[{}]", i)),
                Segment::Key(k) => {
                    // 成员名简写只允许字母或下划线开头，否则使用 bracket-notation
                    let shorthand = k
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                        && k.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                    if shorthand {
                        out.push('.');
                        out.push_str(k);
                    } else {
                        let escaped = k.replace('\\', "\\\\").replace('\'', "\\'");
                        out.push_str(&format!("['{}']", escaped));
                    }
                }
            }
        }
        out
    }

    /// 按目标文档的实际结构解析点分路径：遇到数组时 token 必须是十进制索引，遇到对象时作为键。
    ///
    /// 不做任何"像数字就当索引"的猜测；路径在该文档中不存在时返回 `None`。
    pub fn resolve(doc: &Value, dotted: &str) -> Option<Self> {
        if dotted.is_empty() {
            return Some(Self::root());
        }
        let mut path = Self::root();
        let mut cur = doc;
        for token in dotted.split('.') {
            match cur {
                Value::Array(arr) => {
                    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                        return None;
                    }
                    let idx: usize = token.parse().ok()?;
                    cur = arr.get(idx)?;
                    path.segments.push(Segment::Index(idx));
                }
                Value::Object(map) => {
                    cur = map.get(token)?;
                    path.segments.push(Segment::Key(token.to_string()));
                }
                _ => return None,
            }
        }
        Some(path)
    }

    /// 取出路径指向的值
    pub fn lookup<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(doc, |cur, seg| match (seg, cur) {
            (Segment::Key(k), Value::Object(map)) => map.get(k),
            (Segment::Index(i), Value::Array(arr)) => arr.get(*i),
            _ => None,
        })
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

impl<S: Into<Segment>> FromIterator<S> for StructuralPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// 颜色路径判定：最后两段依次为键 `c` 与键 `k`（任意深度、任意祖先）
pub fn is_color_path(path: &StructuralPath) -> bool {
    match path.segments() {
        [.., c, k] => c.is_key("c") && k.is_key("k"),
        _ => false,
    }
}
