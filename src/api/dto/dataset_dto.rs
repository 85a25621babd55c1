//! 数据集 DTO

use serde::Serialize;

use crate::dataset::Column;

#[derive(Debug, Serialize)]
pub struct DatasetInfoResponse {
    pub source: String,
    pub rows: usize,
    pub columns: Vec<Column>,
}
