//! CSV 加载

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::dataset::record::{ColumnKind, ProfileRecord, infer_value};
use crate::dataset::{Column, Dataset, DatasetError, PROFILE_COLUMNS};
use crate::error::StartupError;

/// 从文件加载数据集
///
/// 文件不存在时返回 [`StartupError::MissingDataset`]；不做部分加载，
/// 任何一行解析失败都会让整个加载失败。字段少于表头的行按空值补齐，
/// 字段多于表头的行视为解析错误。
pub fn load_dataset(path: &Path) -> Result<Dataset, StartupError> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StartupError::MissingDataset {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(StartupError::Io(e)),
    };

    let dataset =
        Dataset::from_reader(file, path).map_err(|source| StartupError::DatasetParse {
            path: path.to_path_buf(),
            source,
        })?;

    let missing: Vec<&str> = PROFILE_COLUMNS
        .iter()
        .copied()
        .filter(|c| !dataset.has_column(c))
        .collect();
    if !missing.is_empty() {
        warn!(path = %path.display(), missing = ?missing, "Dataset lacks expected profile columns");
    }

    info!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "Dataset loaded"
    );
    Ok(dataset)
}

impl Dataset {
    /// 从任意 CSV 输入构建数据集，首行为表头
    pub fn from_reader<R: Read>(
        reader: R,
        source: impl Into<PathBuf>,
    ) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() > headers.len() {
                return Err(DatasetError::ExtraFields {
                    line: record.position().map(|p| p.line()).unwrap_or_default(),
                    expected: headers.len(),
                    found: record.len(),
                });
            }
            records.push(record);
        }

        let mut kinds = vec![ColumnKind::Empty; headers.len()];
        for record in &records {
            for (kind, raw) in kinds.iter_mut().zip(record.iter()) {
                *kind = kind.widen(ColumnKind::of(&infer_value(raw)));
            }
        }

        // 文本列保留原始字符串，避免 "00123" 这类值被改写
        let rows: Vec<ProfileRecord> = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .zip(&kinds)
                    .zip(record.iter().chain(std::iter::repeat("")))
                    .map(|((name, kind), raw)| {
                        let value = match kind {
                            ColumnKind::Text if !raw.trim().is_empty() => {
                                serde_json::Value::String(raw.to_string())
                            }
                            _ => infer_value(raw),
                        };
                        (name.clone(), value)
                    })
                    .collect()
            })
            .collect();

        let columns: Vec<Column> = headers
            .into_iter()
            .zip(kinds)
            .map(|(name, kind)| Column { name, kind })
            .collect();

        Ok(Dataset::new(columns, rows, source))
    }
}
