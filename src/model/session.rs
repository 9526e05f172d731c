//! Session：当前接受的文档及其颜色位点清单；负责 编辑 -> 回写 -> 重新遍历 的串行循环

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::model::color::{Color, ColorError};
use crate::model::rewriter::{colorize_with, ColorInput, ColorizeOptions, SkippedEdit};
use crate::model::walker::{walk, ColorSite};
use crate::utils::fs::{parse_json_str, read_json_file, write_json_file};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("颜色错误: {0}")]
    InvalidColor(#[from] ColorError),
    #[error("结构不匹配: {0}")]
    StructuralMismatch(String),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("状态错误: {0}")]
    State(String),
}

#[derive(Debug, Default)]
pub struct Session {
    pub source_path: Option<PathBuf>,
    pub dom: Option<Value>,
    pub sites: Vec<ColorSite>,
    pub options: ColorizeOptions,
}

impl Session {
    pub fn with_options(options: ColorizeOptions) -> Self {
        Self { options, ..Self::default() }
    }

    /// 加载JSON文件并遍历颜色位点；失败时保留之前的文档
    pub fn load_file(&mut self, p: &Path) -> Result<(), AppError> {
        let dom = read_json_file(p)?;
        self.accept(dom);
        self.source_path = Some(p.to_path_buf());
        tracing::info!("文件加载完成: {}，{} 个颜色位点", p.display(), self.sites.len());
        Ok(())
    }

    /// 接受一段原始JSON文本（手动编辑后的文档）；解析失败时状态不变
    pub fn load_str(&mut self, text: &str) -> Result<(), AppError> {
        let dom = parse_json_str(text)?;
        self.accept(dom);
        Ok(())
    }

    /// 替换文档并从头重新遍历（不做增量修补）
    fn accept(&mut self, dom: Value) {
        self.sites = walk(&dom);
        self.dom = Some(dom);
    }

    fn dom(&self) -> Result<&Value, AppError> {
        self.dom
            .as_ref()
            .ok_or_else(|| AppError::State("文档尚未加载".into()))
    }

    /// 按点分路径查找当前清单中的位点
    pub fn site(&self, path: &str) -> Option<&ColorSite> {
        self.sites.iter().find(|s| s.dotted_path() == path)
    }

    /// 修改单个位点的颜色；颜色无效时返回错误且状态不变，成功时返回刷新后的位点
    pub fn set_color(&mut self, path: &str, color: &str) -> Result<&ColorSite, AppError> {
        color.parse::<Color>()?;
        if self.site(path).is_none() {
            return Err(AppError::StructuralMismatch(format!(
                "当前清单中没有该位点: {}",
                path
            )));
        }
        let skipped = self.apply_edits([(path, color)])?;
        if let Some(first) = skipped.into_iter().next() {
            return Err(first.reason);
        }
        self.site(path)
            .ok_or_else(|| AppError::StructuralMismatch(format!("回写后位点消失: {}", path)))
    }

    /// 批量应用编辑，随后重新遍历；返回被跳过的编辑
    pub fn apply_edits<I, K, C>(&mut self, edits: I) -> Result<Vec<SkippedEdit>, AppError>
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: ColorInput,
    {
        let dom = self.dom()?;
        let result = colorize_with(dom, edits, &self.options);
        let skipped = result.skipped;
        if !result.applied.is_empty() {
            let next = result.document.into_owned();
            self.accept(next);
        }
        Ok(skipped)
    }

    /// 导出当前清单为 路径 -> `#rrggbb` 的编辑映射（可直接作为 apply 的输入）
    pub fn edit_map(&self) -> BTreeMap<String, String> {
        self.sites
            .iter()
            .map(|s| (s.dotted_path(), s.hex()))
            .collect()
    }

    /// 将当前文档保存到指定路径
    pub fn save_to_file(&self, path: &Path) -> Result<(), AppError> {
        write_json_file(path, self.dom()?)?;
        tracing::info!("JSON文件已保存到: {}", path.display());
        Ok(())
    }
}
