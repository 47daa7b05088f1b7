use std::fmt;

use serde::Deserialize;
use time::OffsetDateTime;

/// One aggregated row: a category label and its total amount.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    #[serde(alias = "StageName")]
    pub category: String,
    #[serde(alias = "totalAmount")]
    pub amount: f64,
}

impl Record {
    pub fn new(category: impl Into<String>, amount: f64) -> Self {
        Self {
            category: category.into(),
            amount,
        }
    }
}

/// Ordered, pre-aggregated records driving all three charts.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    received_at: OffsetDateTime,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            received_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn received_at(&self) -> OffsetDateTime {
        self.received_at
    }

    /// Projects the records into index-aligned label and amount columns.
    pub fn series(&self) -> Series {
        let (labels, amounts) = self
            .records
            .iter()
            .map(|r| (r.category.clone(), r.amount))
            .unzip();
        Series { labels, amounts }
    }
}

impl From<Vec<Record>> for Dataset {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

/// Parallel columns derived from a [`Dataset`]; `labels[i]` and `amounts[i]`
/// always come from the same record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub labels: Vec<String>,
    pub amounts: Vec<f64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Bar, ChartKind::Line, ChartKind::Pie];

    /// Stable identifier of the render target this kind draws into.
    pub fn target_id(&self) -> &'static str {
        match self {
            ChartKind::Bar => "barChart",
            ChartKind::Line => "lineChart",
            ChartKind::Pie => "pieChart",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
        }
    }

    pub(crate) fn slot(&self) -> usize {
        match self {
            ChartKind::Bar => 0,
            ChartKind::Line => 1,
            ChartKind::Pie => 2,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub category: String,
    pub amount: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            category: "category".into(),
            amount: "amount".into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub columns: ColumnMapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Parquet,
    Json,
}

impl DataFormat {
    pub fn detect(path: &std::path::Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(DataFormat::Csv),
            "parquet" | "parq" => Some(DataFormat::Parquet),
            "json" => Some(DataFormat::Json),
            _ => None,
        }
    }
}
