//! Standardized metrics collection and reporting for CI/CD integration.
//!
//! Terrain and streaming tests export a [`MetricsReport`] as JSON so runs can
//! be compared for regressions.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use voxelgen_world::WorldStats;

/// Top-level metrics report containing all subsystem metrics.
///
/// This is the standardized format for metrics.json files exported by tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Test/benchmark identifier
    pub test_name: String,

    /// Timestamp when metrics were collected (ISO 8601)
    pub timestamp: String,

    /// Overall test result
    pub result: TestResult,

    /// Terrain generation metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terrain: Option<TerrainMetrics>,

    /// Chunk streaming metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming: Option<StreamingMetrics>,

    /// Test execution metrics
    pub test_execution: TestExecutionMetrics,
}

/// Overall test result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    /// Test passed all validations
    Pass,
    /// Test failed
    Fail,
    /// Test was skipped
    Skip,
}

/// Terrain generation performance and quality metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainMetrics {
    /// Total chunks generated
    pub chunks_generated: usize,

    /// Total placements generated
    pub blocks_generated: usize,

    /// Average generation time per chunk (microseconds)
    pub avg_gen_time_us: f64,

    /// Min generation time (microseconds)
    pub min_gen_time_us: u128,

    /// Max generation time (microseconds)
    pub max_gen_time_us: u128,

    /// Total generation time (milliseconds)
    pub total_gen_time_ms: f64,

    /// Chunks per second throughput
    pub chunks_per_second: f64,

    /// Number of unique biomes present
    pub unique_biomes: usize,

    /// Chunk seam validation results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seam_validation: Option<SeamValidation>,
}

impl TerrainMetrics {
    /// Summarize per-chunk `(generation time, placement count)` samples.
    pub fn from_samples(samples: &[(Duration, usize)], unique_biomes: usize) -> Self {
        let micros: Vec<u128> = samples.iter().map(|(d, _)| d.as_micros()).collect();
        let total_us: u128 = micros.iter().sum();
        let chunks = samples.len();
        let total_ms = total_us as f64 / 1000.0;

        Self {
            chunks_generated: chunks,
            blocks_generated: samples.iter().map(|(_, n)| n).sum(),
            avg_gen_time_us: if chunks == 0 {
                0.0
            } else {
                total_us as f64 / chunks as f64
            },
            min_gen_time_us: micros.iter().copied().min().unwrap_or(0),
            max_gen_time_us: micros.iter().copied().max().unwrap_or(0),
            total_gen_time_ms: total_ms,
            chunks_per_second: if total_ms > 0.0 {
                chunks as f64 / (total_ms / 1000.0)
            } else {
                0.0
            },
            unique_biomes,
            seam_validation: None,
        }
    }

    /// Attach chunk seam validation results.
    pub fn with_seams(mut self, seams: SeamValidation) -> Self {
        self.seam_validation = Some(seams);
        self
    }
}

/// Chunk boundary seam validation metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeamValidation {
    /// Total seams checked
    pub total_seams: usize,

    /// Seams that passed validation
    pub seams_valid: usize,

    /// Seams that failed validation
    pub seams_failed: usize,

    /// Maximum height difference observed at seams
    pub max_seam_diff: i32,

    /// Average height difference at seams
    pub avg_seam_diff: f64,
}

impl SeamValidation {
    /// Summarize the largest column height jump of each seam against `tolerance`.
    pub fn from_seam_diffs(seam_diffs: &[i32], tolerance: i32) -> Self {
        let total = seam_diffs.len();
        let failed = seam_diffs.iter().filter(|&&diff| diff > tolerance).count();
        let sum: i64 = seam_diffs.iter().map(|&diff| i64::from(diff)).sum();

        Self {
            total_seams: total,
            seams_valid: total - failed,
            seams_failed: failed,
            max_seam_diff: seam_diffs.iter().copied().max().unwrap_or(0),
            avg_seam_diff: if total == 0 {
                0.0
            } else {
                sum as f64 / total as f64
            },
        }
    }
}

/// Chunk streaming behavior over a simulated walk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamingMetrics {
    /// Update ticks executed
    pub updates: usize,

    /// Chunks requested across all updates
    pub chunks_requested: usize,

    /// Chunks released across all updates
    pub chunks_released: usize,

    /// Largest loaded-chunk count seen after an update
    pub peak_loaded_chunks: usize,

    /// Live blocks when the run ended
    pub final_total_blocks: usize,

    /// Placements the host declined
    pub realization_failures: usize,

    /// Generation jobs that panicked
    pub worker_faults: usize,

    /// Completions discarded after the player moved on
    pub discarded: usize,
}

impl StreamingMetrics {
    /// Fold the final world stats into the counters.
    pub fn finish(mut self, stats: &WorldStats) -> Self {
        self.final_total_blocks = stats.total_blocks;
        self.realization_failures = stats.faults.realization_failures;
        self.worker_faults = stats.faults.worker_faults;
        self.discarded = stats.faults.discarded;
        self
    }
}

/// Test execution and infrastructure metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestExecutionMetrics {
    /// Total test duration (seconds)
    pub duration_seconds: f64,

    /// Number of assertions checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertions_checked: Option<usize>,

    /// Number of validations passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validations_passed: Option<usize>,
}

/// Builder for constructing metrics reports
pub struct MetricsReportBuilder {
    report: MetricsReport,
}

impl MetricsReportBuilder {
    /// Create a new builder with test name
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            report: MetricsReport {
                test_name: test_name.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                result: TestResult::Pass,
                terrain: None,
                streaming: None,
                test_execution: TestExecutionMetrics {
                    duration_seconds: 0.0,
                    assertions_checked: None,
                    validations_passed: None,
                },
            },
        }
    }

    /// Set test result
    pub fn result(mut self, result: TestResult) -> Self {
        self.report.result = result;
        self
    }

    /// Set terrain metrics
    pub fn terrain(mut self, metrics: TerrainMetrics) -> Self {
        self.report.terrain = Some(metrics);
        self
    }

    /// Set streaming metrics
    pub fn streaming(mut self, metrics: StreamingMetrics) -> Self {
        self.report.streaming = Some(metrics);
        self
    }

    /// Set test execution metrics
    pub fn execution(mut self, metrics: TestExecutionMetrics) -> Self {
        self.report.test_execution = metrics;
        self
    }

    /// Build the metrics report
    pub fn build(self) -> MetricsReport {
        self.report
    }
}

/// Sink for writing metrics reports to JSON files
pub struct MetricsSink {
    path: std::path::PathBuf,
}

impl MetricsSink {
    /// Create a new metrics sink at the specified path
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        Ok(Self { path })
    }

    /// Write metrics report to file
    pub fn write(&self, report: &MetricsReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)
            .with_context(|| format!("creating {}", self.path.display()))?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn terrain_metrics_from_samples() {
        let samples = [
            (Duration::from_micros(1000), 300),
            (Duration::from_micros(3000), 500),
        ];
        let metrics = TerrainMetrics::from_samples(&samples, 3);
        assert_eq!(metrics.chunks_generated, 2);
        assert_eq!(metrics.blocks_generated, 800);
        assert_eq!(metrics.min_gen_time_us, 1000);
        assert_eq!(metrics.max_gen_time_us, 3000);
        assert!((metrics.avg_gen_time_us - 2000.0).abs() < f64::EPSILON);
        assert!((metrics.chunks_per_second - 500.0).abs() < 1e-6);

        let empty = TerrainMetrics::from_samples(&[], 0);
        assert_eq!(empty.avg_gen_time_us, 0.0);
        assert_eq!(empty.chunks_per_second, 0.0);
    }

    #[test]
    fn seam_validation_counts_failures() {
        let seams = SeamValidation::from_seam_diffs(&[1, 3, 9, 2], 7);
        assert_eq!(seams.total_seams, 4);
        assert_eq!(seams.seams_valid, 3);
        assert_eq!(seams.seams_failed, 1);
        assert_eq!(seams.max_seam_diff, 9);
        assert!((seams.avg_seam_diff - 3.75).abs() < f64::EPSILON);

        let terrain = TerrainMetrics::from_samples(&[], 0).with_seams(seams);
        assert_eq!(terrain.seam_validation.unwrap().seams_failed, 1);

        let none = SeamValidation::from_seam_diffs(&[], 7);
        assert_eq!(none.avg_seam_diff, 0.0);
    }

    #[test]
    fn metrics_report_parses_back() {
        let report = MetricsReportBuilder::new("test_example")
            .result(TestResult::Pass)
            .streaming(StreamingMetrics {
                updates: 10,
                chunks_requested: 30,
                chunks_released: 5,
                peak_loaded_chunks: 25,
                ..Default::default()
            })
            .build();

        let json = serde_json::to_string_pretty(&report).unwrap();
        let parsed: MetricsReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.test_name, "test_example");
        assert!(parsed.terrain.is_none());
        assert_eq!(parsed.streaming.unwrap().peak_loaded_chunks, 25);
        assert!(!json.contains("\"terrain\""));
    }

    #[test]
    fn metrics_sink_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "voxelgen-metrics-{}.json",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        let report = MetricsReportBuilder::new("sink_test")
            .result(TestResult::Pass)
            .build();

        let sink = MetricsSink::create(&path).unwrap();
        sink.write(&report).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("sink_test"));
        assert!(contents.contains("\"result\": \"pass\""));

        fs::remove_file(&path).ok();
    }
}
