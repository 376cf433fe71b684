//! Datasets keyed by filename

use super::dataset::TabularDataset;

/// Loaded datasets in first-upload order; filenames are unique
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    datasets: Vec<TabularDataset>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a dataset, fully replacing any dataset with the same filename.
    /// Returns the replaced dataset.
    pub fn insert(&mut self, dataset: TabularDataset) -> Option<TabularDataset> {
        match self
            .datasets
            .iter_mut()
            .find(|d| d.filename() == dataset.filename())
        {
            Some(slot) => {
                tracing::info!("Replacing dataset {}", dataset.filename());
                Some(std::mem::replace(slot, dataset))
            }
            None => {
                self.datasets.push(dataset);
                None
            }
        }
    }

    pub fn get(&self, filename: &str) -> Option<&TabularDataset> {
        self.datasets.iter().find(|d| d.filename() == filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.get(filename).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TabularDataset> {
        self.datasets.iter()
    }

    pub fn filenames(&self) -> Vec<String> {
        self.datasets.iter().map(|d| d.filename().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn clear(&mut self) {
        self.datasets.clear();
    }
}
