//! Quality report assembly
//!
//! Builds the structured quality report and control chart data from a
//! session's transfer records. Serialization to JSON is provided; chart
//! rendering is a consumer concern.

use crate::config::QualitySpec;
use crate::core::TransferRecord;
use crate::error::{IoResultExt, Result};
use crate::stats::SpcAnalyzer;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Aggregate throughput statistics for a session
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThroughputStats {
    /// Sample mean (Mbps)
    pub mean: f64,
    /// Population standard deviation (Mbps)
    pub std_dev: f64,
    /// Process capability index against the spec limits
    pub cpk: f64,
    /// Sigma level derived from the defect rate
    pub sigma_level: f64,
}

/// Six Sigma quality report for a transfer session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Aggregate throughput statistics
    pub throughput_stats: ThroughputStats,
    /// The raw records the statistics were derived from
    pub transfer_records: Vec<TransferRecord>,
}

impl QualityReport {
    /// Save the report as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_path(path)?;
        Ok(())
    }
}

/// Control chart data for an external renderer: the time-ordered
/// throughput sequence plus center and 3-sigma reference lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlChartData {
    /// Throughput values in transfer order (Mbps)
    pub values: Vec<f64>,
    /// Center line (mean)
    pub center: f64,
    /// Upper control limit
    pub upper_limit: f64,
    /// Lower control limit
    pub lower_limit: f64,
}

impl ControlChartData {
    /// Save the chart data as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_path(path)?;
        Ok(())
    }
}

/// Assembles quality reports from transfer records
pub struct QualityReportBuilder<'a> {
    records: &'a [TransferRecord],
    spec: QualitySpec,
}

impl<'a> QualityReportBuilder<'a> {
    /// Create a builder over the given records and specification limits
    pub fn new(records: &'a [TransferRecord], spec: QualitySpec) -> Self {
        Self { records, spec }
    }

    fn analyzer(&self) -> SpcAnalyzer {
        SpcAnalyzer::new(self.records.iter().map(|r| r.throughput_mbps).collect())
    }

    /// Build the quality report.
    ///
    /// `None` when there are no records; with fewer than 2 records the
    /// statistics carry their documented sentinel values.
    pub fn build(&self) -> Option<QualityReport> {
        if self.records.is_empty() {
            return None;
        }

        let analyzer = self.analyzer();

        Some(QualityReport {
            throughput_stats: ThroughputStats {
                mean: analyzer.mean(),
                std_dev: analyzer.std_dev(),
                cpk: analyzer
                    .capability_index(self.spec.upper_spec_limit, self.spec.lower_spec_limit),
                sigma_level: analyzer.sigma_level(self.spec.defect_threshold),
            },
            transfer_records: self.records.to_vec(),
        })
    }

    /// Build control chart data; `None` below 2 samples
    pub fn chart_data(&self) -> Option<ControlChartData> {
        let analyzer = self.analyzer();
        let limits = analyzer.control_limits()?;

        Some(ControlChartData {
            values: self.records.iter().map(|r| r.throughput_mbps).collect(),
            center: limits.center,
            upper_limit: limits.upper_limit,
            lower_limit: limits.lower_limit,
        })
    }
}
