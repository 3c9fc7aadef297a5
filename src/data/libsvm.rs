//! LibSVM format dataset implementation
//!
//! Supports loading datasets in the libsvm format:
//! label index:value index:value ...
//!
//! Example:
//! +1 1:0.5 3:1.2 7:0.8
//! -1 2:0.3 5:2.1

use crate::core::{Dataset, KernelSpaceError, Result, Sample, SparseVector};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Dataset read from LibSVM format text
///
/// Labels are kept as written so multiclass data survives loading;
/// [`binary_samples`](LibSVMDataset::binary_samples) maps them to ±1.
#[derive(Debug, Clone)]
pub struct LibSVMDataset {
    samples: Vec<Sample>,
    dimensions: usize,
}

impl LibSVMDataset {
    /// Load a dataset from a LibSVM format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from a reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut samples = Vec::new();
        let mut dimensions = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let sample = Self::parse_line(line).map_err(|e| {
                KernelSpaceError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;
            dimensions = dimensions.max(sample.features.dim());
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(KernelSpaceError::EmptyDataset);
        }

        Ok(Self {
            samples,
            dimensions,
        })
    }

    /// Wrap samples that are already in memory
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(KernelSpaceError::EmptyDataset);
        }
        let dimensions = samples.iter().map(|s| s.features.dim()).max().unwrap_or(0);
        Ok(Self {
            samples,
            dimensions,
        })
    }

    /// Parse a single line in libsvm format
    fn parse_line(line: &str) -> std::result::Result<Sample, String> {
        let mut parts = line.split_whitespace();
        let label_str = parts.next().ok_or("Empty line")?;
        let label = label_str
            .parse::<f64>()
            .map_err(|_| format!("Invalid label: {label_str}"))?;

        let mut indices = Vec::new();
        let mut values = Vec::new();
        for feature_str in parts {
            let (index_str, value_str) = feature_str
                .split_once(':')
                .ok_or_else(|| format!("Invalid feature format: {feature_str}"))?;
            let index = index_str
                .parse::<usize>()
                .map_err(|_| format!("Invalid feature index: {index_str}"))?;
            let value = value_str
                .parse::<f64>()
                .map_err(|_| format!("Invalid feature value: {value_str}"))?;

            // libsvm uses 1-based indexing, convert to 0-based
            if index == 0 {
                return Err(format!("Feature index must be positive: {index}"));
            }
            indices.push(index - 1);
            values.push(value);
        }

        Ok(Sample::new(SparseVector::new(indices, values), label))
    }

    /// Samples with positive labels mapped to `+1` and the rest to `-1`
    pub fn binary_samples(&self) -> Vec<Sample> {
        self.samples
            .iter()
            .map(|s| {
                let label = if s.label > 0.0 { 1.0 } else { -1.0 };
                Sample::new(s.features.clone(), label)
            })
            .collect()
    }

    /// Feature vectors in file order
    pub fn features(&self) -> Vec<SparseVector> {
        self.samples.iter().map(|s| s.features.clone()).collect()
    }

    /// Distinct labels in ascending order
    pub fn classes(&self) -> Vec<f64> {
        let mut classes: Vec<f64> = self.samples.iter().map(|s| s.label).collect();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();
        classes
    }

    /// Write the dataset back out in LibSVM format
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for sample in &self.samples {
            write!(writer, "{}", sample.label)?;
            for (i, v) in sample.features.iter() {
                write!(writer, " {}:{}", i + 1, v)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

impl Dataset for LibSVMDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn get_sample(&self, i: usize) -> Sample {
        self.samples[i].clone()
    }

    fn get_labels(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.label).collect()
    }
}
