//! Tabular data: loading, typing, profiling

mod dataset;
mod loader;
mod registry;

pub use dataset::{
    infer_column_type, CellValue, Column, ColumnProfile, ColumnType, NumericSummary,
    TabularDataset,
};
pub use loader::TabularLoader;
pub use registry::DatasetRegistry;

use crate::error::Result;
use crate::types::Chunk;

/// Descriptor chunk that makes a dataset retrievable by the narrative path
pub fn descriptor_chunk(dataset: &TabularDataset) -> Result<Chunk> {
    Ok(Chunk::tabular(dataset.filename(), dataset.describe()?))
}
