//! Delimited text reader for spectra with one target column.
//!
//! Every row is a sample; every column except the target (and any ignored
//! columns) is a wavelength.
use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use ndarray::{Array1, Array2};

use crate::benchmarking::data_handling::Dataset;

/// Configuration for reading spectra files.
#[derive(Debug, Clone)]
pub struct SpectraReaderConfig {
    /// Column holding the regression target.
    pub target_column: String,
    pub delimiter: u8,
    /// Columns that are neither target nor wavelength, e.g. sample ids.
    pub ignore_columns: Vec<String>,
}

impl Default for SpectraReaderConfig {
    fn default() -> Self {
        Self {
            target_column: "target".to_string(),
            delimiter: b',',
            ignore_columns: vec!["id".to_string(), "sample".to_string()],
        }
    }
}

/// Read a comma separated spectra file into a [`Dataset`] named after the
/// file stem.
pub fn read_spectra_csv<P: AsRef<Path>>(path: P, target_column: &str, train_size: f64) -> Result<Dataset> {
    let config = SpectraReaderConfig {
        target_column: target_column.to_string(),
        ..Default::default()
    };
    read_spectra_with_config(path, &config, train_size)
}

pub fn read_spectra_with_config<P: AsRef<Path>>(
    path: P,
    config: &SpectraReaderConfig,
    train_size: f64,
) -> Result<Dataset> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open spectra file: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read spectra header row")?
        .clone();

    let target_idx = find_column(&headers, &config.target_column)
        .ok_or_else(|| anyhow!("Missing target column '{}'", config.target_column))?;
    let wavelength_indices = resolve_wavelength_indices(&headers, config, target_idx);
    if wavelength_indices.is_empty() {
        return Err(anyhow!("No wavelength columns detected in {}", path.display()));
    }

    let mut values = Vec::new();
    let mut targets = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let target = record
            .get(target_idx)
            .ok_or_else(|| anyhow!("Missing target value at row {}", row_idx + 1))?
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Invalid target at row {}", row_idx + 1))?;
        targets.push(target);

        for &idx in &wavelength_indices {
            let value = record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing value at row {}", row_idx + 1))?;
            let parsed = value.trim().parse::<f64>().with_context(|| {
                format!(
                    "Invalid value in column '{}' at row {}",
                    headers.get(idx).unwrap_or(""),
                    row_idx + 1
                )
            })?;
            values.push(parsed);
        }
    }

    let x = Array2::from_shape_vec((targets.len(), wavelength_indices.len()), values)
        .context("Failed to build spectra matrix")?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "spectra".to_string());

    log::info!(
        "Read {} spectra with {} wavelengths from {}",
        x.nrows(),
        x.ncols(),
        path.display()
    );
    Ok(Dataset::new(name, x, Array1::from_vec(targets), train_size))
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn resolve_wavelength_indices(headers: &StringRecord, config: &SpectraReaderConfig, target_idx: usize) -> Vec<usize> {
    let ignore: HashSet<String> = config
        .ignore_columns
        .iter()
        .map(|name| name.to_ascii_lowercase())
        .collect();

    headers
        .iter()
        .enumerate()
        .filter(|&(idx, header)| idx != target_idx && !ignore.contains(&header.trim().to_ascii_lowercase()))
        .map(|(idx, _)| idx)
        .collect()
}
