//! Request diagnostics: runtime, throughput, memory delta and loaded code units.
//!
//! Values are point-in-time snapshots taken when the primary flush is
//! formatted. Nothing is averaged or retried.

use chrono::{DateTime, Local};
use std::collections::BTreeSet;

use crate::domain::RequestContext;

/// Source of process-level measurements.
pub trait RuntimeProbe: Send + Sync {
    /// Current resident memory in bytes
    fn memory_usage(&self) -> u64;

    /// Number of loaded code units (executable file mappings)
    fn loaded_units(&self) -> usize;
}

/// Reads `/proc/self`. Reports 0 where procfs is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessProbe;

impl RuntimeProbe for ProcessProbe {
    fn memory_usage(&self) -> u64 {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|status| parse_vm_rss(&status))
            .unwrap_or(0)
    }

    fn loaded_units(&self) -> usize {
        std::fs::read_to_string("/proc/self/maps")
            .map(|maps| count_executable_mappings(&maps))
            .unwrap_or(0)
    }
}

/// Fixed measurements.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProbe {
    pub memory: u64,
    pub units: usize,
}

impl RuntimeProbe for StaticProbe {
    fn memory_usage(&self) -> u64 {
        self.memory
    }

    fn loaded_units(&self) -> usize {
        self.units
    }
}

/// `VmRSS:     1234 kB` -> bytes
fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

fn count_executable_mappings(maps: &str) -> usize {
    maps.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let perms = fields.nth(1)?;
            let path = fields.nth(3)?;
            (perms.contains('x') && path.starts_with('/')).then_some(path)
        })
        .collect::<BTreeSet<_>>()
        .len()
}

/// Snapshot of request cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    /// Elapsed seconds since the request started
    pub runtime: f64,
    /// Resident memory delta in kilobytes
    pub memory_kb: f64,
    pub files: usize,
}

impl Diagnostics {
    pub fn capture(context: &RequestContext, now: DateTime<Local>, probe: &dyn RuntimeProbe) -> Self {
        let elapsed = (now - context.begin_time)
            .num_microseconds()
            .map(|us| us as f64 / 1_000_000.0)
            .unwrap_or(0.0)
            .max(0.0);
        let memory = probe.memory_usage() as i64 - context.begin_memory as i64;

        Self {
            runtime: round_to(elapsed, 10),
            memory_kb: memory as f64 / 1024.0,
            files: probe.loaded_units(),
        }
    }

    /// `0.001234s`
    pub fn runtime_display(&self) -> String {
        format!("{}s", number_format(self.runtime, 6))
    }

    /// Inverse of runtime, `∞` when no time elapsed.
    pub fn reqs_display(&self) -> String {
        if self.runtime > 0.0 {
            format!("{}req/s", number_format(1.0 / self.runtime, 2))
        } else {
            "∞req/s".to_string()
        }
    }

    pub fn memory_display(&self) -> String {
        format!("{}kb", number_format(self.memory_kb, 2))
    }

    /// Line inserted after the text-mode banner.
    pub fn text_line(&self) -> String {
        format!(
            "[runtime: {}] [throughput: {}] [memory: {}] [files: {}]",
            self.runtime_display(),
            self.reqs_display(),
            self.memory_display(),
            self.files
        )
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Fixed decimals with `,` thousands separators.
pub fn number_format(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac_part) = frac_part {
        grouped.push('.');
        grouped.push_str(frac_part);
    }

    let is_zero = grouped.chars().all(|c| matches!(c, '0' | '.' | ','));
    if value < 0.0 && !is_zero {
        grouped.insert(0, '-');
    }
    grouped
}
