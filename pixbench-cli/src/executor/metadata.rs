//! System Metadata Collection
//!
//! Collects host information and the effective configuration for the JSON
//! report.
//!
//! Linux-specific data (CPU model, memory) gracefully degrades on other
//! platforms, returning "Unknown" or 0 values.

use crate::config::{BenchmarkConfig, default_jobs};
use chrono::Utc;
use pixbench_core::is_tracking;
use pixbench_report::{ReportConfig, ReportMeta, SCHEMA_VERSION, SystemInfo};

/// Build report metadata for a benchmark configuration
pub fn build_report_meta(config: &BenchmarkConfig) -> ReportMeta {
    let system = SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: u32::try_from(default_jobs()).unwrap_or(u32::MAX),
        memory_gb: memory_gb().unwrap_or(0.0),
        memory_tracking: is_tracking(),
    };

    ReportMeta {
        schema_version: SCHEMA_VERSION,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        system,
        config: ReportConfig {
            input_dir: config.input_dir.clone(),
            output_dir: config.output_dir.clone(),
            report_dir: config.report_dir.clone(),
            target_sizes: config.target_sizes.clone(),
            quality: config.quality,
            backends: config.backend_ids().iter().map(|s| s.to_string()).collect(),
            jobs: config.jobs,
        },
    }
}

/// First `key: value` entry in a /proc style listing
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn proc_field<'a>(listing: &'a str, key: &str) -> Option<&'a str> {
    listing.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        (name.trim() == key).then(|| value.trim())
    })
}

#[cfg(target_os = "linux")]
fn cpu_model() -> Option<String> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    proc_field(&cpuinfo, "model name").map(str::to_string)
}

#[cfg(not(target_os = "linux"))]
fn cpu_model() -> Option<String> {
    None
}

/// `MemTotal` is reported in kB
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn mem_total_gb(meminfo: &str) -> Option<f64> {
    let kb: u64 = proc_field(meminfo, "MemTotal")?
        .trim_end_matches("kB")
        .trim()
        .parse()
        .ok()?;
    Some(kb as f64 / (1024.0 * 1024.0))
}

#[cfg(target_os = "linux")]
fn memory_gb() -> Option<f64> {
    mem_total_gb(&std::fs::read_to_string("/proc/meminfo").ok()?)
}

#[cfg(not(target_os = "linux"))]
fn memory_gb() -> Option<f64> {
    None
}
