//! 颜色编解码：文档内的 `[r, g, b, a]` 小数数组 <-> 8 位 RGB + alpha

use std::{fmt, str::FromStr};

use colorsys::{ColorAlpha, Hsl, Rgb};
use serde_json::Value;
use thiserror::Error;

use crate::model::named_colors::lookup_named_color;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorError {
    #[error("无法识别的颜色: {0}")]
    InvalidColor(String),
    #[error("不是四元数字颜色数组: {0}")]
    MalformedArray(String),
}

/// 8 位 RGB 加 [0,1] alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

/// JS 风格的四舍五入（.5 向上）
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// 超出 [0,1] 的 alpha 视为不透明
fn bound_alpha(a: f64) -> f64 {
    if (0.0..=1.0).contains(&a) {
        a
    } else {
        1.0
    }
}

// 大于 1 的通道值夹紧到 255，不按 0..=255 刻度重新解释
fn channel_from_fraction(x: f64) -> u8 {
    round_half_up(clamp01(x) * 255.0) as u8
}

/// 通道先量化为 0..=100 的整数百分比再除以 100（有意保留的精度损失，误差上限 1/100）
fn fraction_from_channel(c: u8) -> f64 {
    round_half_up(f64::from(c) / 255.0 * 100.0) / 100.0
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a: clamp01(a) }
    }

    /// 解码原始数组（超出 [0,1] 的通道夹紧到 0..=255，超出范围的 alpha 取 1）
    pub fn decode(raw: [f64; 4]) -> Self {
        let [r, g, b, a] = raw;
        Self {
            r: channel_from_fraction(r),
            g: channel_from_fraction(g),
            b: channel_from_fraction(b),
            a: bound_alpha(a),
        }
    }

    /// 编码回原始数组，经过整数百分比量化
    pub fn encode(&self) -> [f64; 4] {
        [
            fraction_from_channel(self.r),
            fraction_from_channel(self.g),
            fraction_from_channel(self.b),
            self.a,
        ]
    }

    /// 规范化十六进制 `#rrggbb`（不含 alpha）
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn from_colorsys(rgb: &Rgb) -> Self {
        let ch = |v: f64| round_half_up(v.clamp(0.0, 255.0)) as u8;
        Self::new(
            ch(rgb.red()),
            ch(rgb.green()),
            ch(rgb.blue()),
            rgb.get_alpha(),
        )
    }

    fn parse_hex(digits: &str) -> Option<Self> {
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        // #rgba / #rrggbbaa：alpha 单独取出，其余交给 colorsys
        let (rgb_digits, alpha) = match digits.len() {
            3 | 6 => (digits, 1.0),
            4 => {
                let a = u8::from_str_radix(&digits[3..].repeat(2), 16).ok()?;
                (&digits[..3], f64::from(a) / 255.0)
            }
            8 => {
                let a = u8::from_str_radix(&digits[6..], 16).ok()?;
                (&digits[..6], f64::from(a) / 255.0)
            }
            _ => return None,
        };
        let rgb = Rgb::from_hex_str(&format!("#{}", rgb_digits)).ok()?;
        let mut color = Self::from_colorsys(&rgb);
        color.a = alpha;
        Some(color)
    }

    /// `rgb()`/`rgba()` 函数写法：逗号或空白分隔，alpha 可用 `/` 引出；通道与 alpha 都可写成百分比
    fn parse_rgb_function(text: &str) -> Option<Self> {
        let inner = text
            .strip_prefix("rgba(")
            .or_else(|| text.strip_prefix("rgb("))?
            .strip_suffix(')')?;

        let parts: Vec<&str> = if inner.contains(',') {
            inner.split(',').map(str::trim).collect()
        } else {
            inner
                .split(|c: char| c.is_whitespace() || c == '/')
                .filter(|p| !p.is_empty())
                .collect()
        };

        let (channels, alpha) = match parts.as_slice() {
            [r, g, b] => ([*r, *g, *b], None),
            [r, g, b, a] => ([*r, *g, *b], Some(*a)),
            _ => return None,
        };

        let mut rgb = [0.0; 3];
        for (slot, part) in rgb.iter_mut().zip(channels) {
            *slot = match part.strip_suffix('%') {
                Some(pct) => round_half_up(pct.trim().parse::<f64>().ok()? * 255.0 / 100.0),
                None => part.parse::<f64>().ok()?,
            };
            if !slot.is_finite() {
                return None;
            }
        }
        let alpha = match alpha {
            Some(part) => {
                let a = match part.strip_suffix('%') {
                    Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
                    None => part.parse::<f64>().ok()?,
                };
                if !a.is_finite() {
                    return None;
                }
                a
            }
            None => 1.0,
        };

        Some(Self::from_colorsys(&Rgb::new(rgb[0], rgb[1], rgb[2], Some(alpha))))
    }
}

impl FromStr for Color {
    type Err = ColorError;

    /// 接受 hex、`rgb()`/`rgba()`、`hsl()`/`hsla()` 以及 CSS 命名颜色
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ColorError::InvalidColor(s.to_string());
        let text = s.trim().to_ascii_lowercase();
        if text.is_empty() {
            return Err(invalid());
        }

        if let Some((r, g, b, a)) = lookup_named_color(&text) {
            return Ok(Self::new(r, g, b, a));
        }
        if text.starts_with("rgb") {
            return Self::parse_rgb_function(&text).ok_or_else(invalid);
        }
        if text.starts_with("hsl") {
            let hsl = Hsl::from_str(&text).map_err(|_| invalid())?;
            return Ok(Self::from_colorsys(&Rgb::from(hsl)));
        }

        let digits = text.strip_prefix('#').unwrap_or(&text);
        Self::parse_hex(digits).ok_or_else(invalid)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// 值为恰好 4 个数字的数组时取出分量
pub fn raw_color_array(value: &Value) -> Option<[f64; 4]> {
    match value {
        Value::Array(items) if items.len() == 4 => {
            let mut out = [0.0; 4];
            for (slot, item) in out.iter_mut().zip(items) {
                let n = item.as_f64()?;
                if !n.is_finite() {
                    return None;
                }
                *slot = n;
            }
            Some(out)
        }
        _ => None,
    }
}

/// 颜色字符串 -> 原始四元数组
pub fn encode_color(color: &str) -> Result<[f64; 4], ColorError> {
    Ok(color.parse::<Color>()?.encode())
}

/// 原始四元数组 -> `#rrggbb`
pub fn decode_color(raw: &[Value]) -> Result<String, ColorError> {
    let value = Value::Array(raw.to_vec());
    let arr =
        raw_color_array(&value).ok_or_else(|| ColorError::MalformedArray(value.to_string()))?;
    Ok(Color::decode(arr).to_hex())
}

/// 批量编辑中的"空"颜色（空白字符串）视为跳过
pub fn is_falsy_color(color: &str) -> bool {
    color.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn arr(v: Value) -> Vec<Value> {
        v.as_array().cloned().expect("测试数据应该是数组")
    }

    #[test]
    fn test_decode_primaries() {
        assert_eq!(decode_color(&arr(json!([1, 0, 0, 1]))).unwrap(), "#ff0000");
        assert_eq!(decode_color(&arr(json!([0, 1, 0, 1]))).unwrap(), "#00ff00");
        assert_eq!(decode_color(&arr(json!([0, 0, 1, 0.5]))).unwrap(), "#0000ff");
    }

    #[test]
    fn test_decode_rounds_half_up() {
        let c = Color::decode([0.5, 0.25, 0.75, 1.0]);
        assert_eq!((c.r, c.g, c.b), (128, 64, 191));
        assert_eq!(c.to_hex(), "#8040bf");
    }

    #[test]
    fn test_decode_keeps_alpha_and_clamps_out_of_range() {
        let c = Color::decode([1.5, -0.2, 0.0, 0.3]);
        assert_eq!((c.r, c.g, c.b), (255, 0, 0));
        assert_eq!(c.a, 0.3);
    }

    #[test]
    fn test_decode_out_of_range_alpha_is_opaque() {
        assert_eq!(Color::decode([0.0, 0.0, 0.0, -0.2]).a, 1.0);
        assert_eq!(Color::decode([0.0, 0.0, 0.0, 1.5]).a, 1.0);
        assert_eq!(Color::decode([0.0, 0.0, 0.0, 0.0]).a, 0.0, "0 是合法 alpha");

        let c = Color::decode([2.0, 0.5, -1.0, 1.5]);
        assert_eq!(c.to_hex(), "#ff8000");
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_round_trip_within_one_percent() {
        let raw = [0.5, 0.25, 0.75, 1.0];
        let hex = Color::decode(raw).to_hex();
        let back = encode_color(&hex).expect("解码出的十六进制应该可以再编码");
        for i in 0..3 {
            assert!(
                (back[i] - raw[i]).abs() <= 0.01,
                "通道 {} 往返误差应在 1/100 以内: {} vs {}",
                i,
                back[i],
                raw[i]
            );
        }
    }

    #[test]
    fn test_round_trip_is_lossy_by_percentage_quantization() {
        // 0.123 -> 31 -> 12% -> 0.12，不是原值
        let back = Color::decode([0.123, 0.0, 0.0, 1.0]).encode();
        assert_eq!(back[0], 0.12, "百分比量化会丢失精度");
    }

    #[test]
    fn test_encode_values_are_whole_percentages() {
        let encoded = encode_color("#336699").unwrap();
        assert_eq!(encoded[..3], [0.2, 0.4, 0.6]);
        assert_eq!(encoded[3], 1.0);
    }

    #[test]
    fn test_parse_syntaxes() {
        let red = Color::new(255, 0, 0, 1.0);
        assert_eq!("#ff0000".parse::<Color>().unwrap(), red);
        assert_eq!("#F00".parse::<Color>().unwrap(), red);
        assert_eq!("ff0000".parse::<Color>().unwrap(), red);
        assert_eq!("red".parse::<Color>().unwrap(), red);
        assert_eq!("  Red ".parse::<Color>().unwrap(), red, "应该忽略大小写与空白");
        assert_eq!("rgb(255, 0, 0)".parse::<Color>().unwrap(), red);

        let teal = "rgba(0, 128, 128, 0.5)".parse::<Color>().unwrap();
        assert_eq!((teal.r, teal.g, teal.b), (0, 128, 128));
        assert!((teal.a - 0.5).abs() < 1e-9);

        let green = "hsl(120, 100%, 50%)".parse::<Color>().unwrap();
        assert_eq!(green.to_hex(), "#00ff00");
    }

    #[test]
    fn test_parse_css_rgb_variants() {
        let red = Color::new(255, 0, 0, 1.0);
        assert_eq!("rgb(100%, 0%, 0%)".parse::<Color>().unwrap(), red, "百分比通道");
        assert_eq!("rgb(255 0 0)".parse::<Color>().unwrap(), red, "空白分隔");
        assert_eq!("RGB(255,0,0)".parse::<Color>().unwrap(), red);

        let half = "rgb(50%, 20%, 0%)".parse::<Color>().unwrap();
        assert_eq!((half.r, half.g, half.b), (128, 51, 0));

        let slash = "rgb(0 128 128 / 0.5)".parse::<Color>().unwrap();
        assert_eq!((slash.r, slash.g, slash.b), (0, 128, 128));
        assert!((slash.a - 0.5).abs() < 1e-9);

        let pct_alpha = "rgba(0, 0, 255, 25%)".parse::<Color>().unwrap();
        assert_eq!(pct_alpha.to_hex(), "#0000ff");
        assert!((pct_alpha.a - 0.25).abs() < 1e-9);

        for bad in ["rgb(255, 0)", "rgb(1, 2, 3, 4, 5)", "rgb(x 0 0)", "rgb(255 0 0"] {
            assert!(bad.parse::<Color>().is_err(), "应该拒绝: {:?}", bad);
        }
    }

    #[test]
    fn test_parse_hex_with_alpha() {
        let c = "#ff000080".parse::<Color>().unwrap();
        assert_eq!(c.to_hex(), "#ff0000");
        assert!((c.a - 128.0 / 255.0).abs() < 1e-9);

        let short = "#f008".parse::<Color>().unwrap();
        assert_eq!(short.to_hex(), "#ff0000");
        assert!((short.a - 136.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_colors() {
        for bad in ["not-a-color", "#ff0000f", "#gggggg", "", "   ", "rgb(a, b)"] {
            assert!(
                matches!(bad.parse::<Color>(), Err(ColorError::InvalidColor(_))),
                "应该拒绝: {:?}",
                bad
            );
        }
        assert!(encode_color("bogus").is_err());
    }

    #[test]
    fn test_raw_color_array_shape() {
        assert!(raw_color_array(&json!([0, 0.5, 1, 1])).is_some());
        assert!(raw_color_array(&json!([0, 0.5, 1])).is_none(), "三元素不是颜色");
        assert!(raw_color_array(&json!([0, 0.5, 1, 1, 0])).is_none());
        assert!(raw_color_array(&json!([0, "0.5", 1, 1])).is_none());
        assert!(raw_color_array(&json!({"a": 0, "k": [1, 0, 0, 1]})).is_none());
        assert!(decode_color(&arr(json!([1, 2]))).is_err());
    }

    #[test]
    fn test_falsy_color() {
        assert!(is_falsy_color(""));
        assert!(is_falsy_color("  "));
        assert!(!is_falsy_color("#000"));
    }
}
