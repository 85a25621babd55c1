//! 数据集模块
//!
//! 启动时把人员档案 CSV 读入内存，之后在整个进程生命周期内只读共享。

pub mod loader;
pub mod record;

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use loader::load_dataset;
pub use record::{ColumnKind, ProfileRecord, cell_text};

/// CSV 解析错误
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("第 {line} 行有 {found} 个字段，多于表头的 {expected} 个")]
    ExtraFields {
        line: u64,
        expected: usize,
        found: usize,
    },
}

/// 数据集的固定列集合
pub const PROFILE_COLUMNS: &[&str] = &[
    "timestamp",
    "id",
    "name",
    "city",
    "country_code",
    "region",
    "current_company:company_id",
    "current_company:name",
    "position",
    "following",
    "about",
    "posts",
    "groups",
    "current_company",
    "experience",
    "url",
    "people_also_viewed",
    "educations_details",
    "education",
    "avatar",
    "languages",
    "certifications",
    "recommendations",
    "recommendations_count",
    "volunteer_experience",
    "courses",
];

/// 预览中单元格的最大字符数
const PREVIEW_CELL_WIDTH: usize = 40;

/// 列描述
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// 内存中的档案表
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<ProfileRecord>,
    source: PathBuf,
}

impl Dataset {
    pub fn new(columns: Vec<Column>, rows: Vec<ProfileRecord>, source: impl Into<PathBuf>) -> Self {
        Self {
            columns,
            rows,
            source: source.into(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// 精确匹配列名，否则退回到唯一的大小写不敏感匹配
    pub fn resolve_column(&self, name: &str) -> Option<&str> {
        if let Some(column) = self.columns.iter().find(|c| c.name == name) {
            return Some(column.name.as_str());
        }
        let mut candidates = self
            .columns
            .iter()
            .filter(|c| c.name.eq_ignore_ascii_case(name));
        match (candidates.next(), candidates.next()) {
            (Some(column), None) => Some(column.name.as_str()),
            _ => None,
        }
    }

    pub fn rows(&self) -> &[ProfileRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// 类似 `df.head(n)` 的文本表格，用于提示词
    pub fn preview(&self, n: usize) -> String {
        let header: Vec<String> = self.columns.iter().map(|c| clip(&c.name)).collect();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(n)
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| row.text(&c.name).map(|t| clip(&t)).unwrap_or_else(|| "NaN".into()))
                    .collect()
            })
            .collect();

        let index_width = body.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = header
            .iter()
            .enumerate()
            .map(|(i, h)| {
                body.iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&" ".repeat(index_width));
        for (h, w) in header.iter().zip(&widths) {
            out.push_str("  ");
            out.push_str(&pad(h, *w));
        }
        for (idx, row) in body.iter().enumerate() {
            out.push('\n');
            out.push_str(&pad(&idx.to_string(), index_width));
            for (cell, w) in row.iter().zip(&widths) {
                out.push_str("  ");
                out.push_str(&pad(cell, *w));
            }
        }
        out.trim_end().to_string()
    }
}

fn clip(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= PREVIEW_CELL_WIDTH {
        return flat;
    }
    let mut clipped: String = flat.chars().take(PREVIEW_CELL_WIDTH - 3).collect();
    clipped.push_str("...");
    clipped
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let mut out = text.to_string();
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(len)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let csv = "name,city,about\nJane Doe,Austin,\"Builds things,\nlots of things\"\nJohn Roe,Dallas,\n";
        Dataset::from_reader(csv.as_bytes(), "memory").unwrap()
    }

    #[test]
    fn test_preview_has_header_and_rows() {
        let preview = sample().preview(5);
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("name"));
        assert!(lines[0].contains("city"));
        assert!(lines[1].starts_with('0'));
        assert!(lines[1].contains("Jane Doe"));
        assert!(lines[2].contains("NaN"));
    }

    #[test]
    fn test_preview_respects_row_limit() {
        let preview = sample().preview(1);
        assert_eq!(preview.lines().count(), 2);
    }

    #[test]
    fn test_preview_clips_long_cells() {
        let long = "x".repeat(200);
        let csv = format!("about\n{long}\n");
        let dataset = Dataset::from_reader(csv.as_bytes(), "memory").unwrap();
        let preview = dataset.preview(1);
        assert!(preview.contains("..."));
        assert!(!preview.contains(&long));
    }
}
