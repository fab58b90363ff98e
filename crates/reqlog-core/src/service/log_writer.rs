//! Log writer - end-of-request flush of a log batch
//!
//! One `save` call runs, in order:
//! 1. the datastore sink (best effort, never blocks file logging)
//! 2. `max_files` retention
//! 3. classification into apart and combined writes
//! 4. per destination: rotation check, formatting, append

use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{LogBatch, LogConfig, RequestContext};
use crate::error::Result;
use crate::repository::RequestLogRepository;
use crate::service::classifier::{classify, CategoryMessages};
use crate::service::clock::{Clock, SystemClock};
use crate::service::db_sink::{build_request_record, SinkStatus, SkipReason};
use crate::service::diagnostics::{Diagnostics, ProcessProbe, RuntimeProbe};
use crate::service::formatter::{FormatContext, Formatter};
use crate::service::rotator::{
    self, apart_destination, master_destination, Destination, EvictionOutcome, RotationOutcome,
};

/// What happened to one destination.
#[derive(Debug)]
pub struct WriteReport {
    pub destination: Destination,
    pub rotation: RotationOutcome,
    /// Bytes appended
    pub append: Result<usize>,
}

/// Everything observed during one save.
#[derive(Debug)]
pub struct SaveReport {
    pub sink: SinkStatus,
    /// Present when `max_files` is configured and there was something to write
    pub eviction: Option<EvictionOutcome>,
    /// Creation of the master directory
    pub directory: Option<Result<()>>,
    /// Apart writes first, then the combined write
    pub writes: Vec<WriteReport>,
}

impl SaveReport {
    fn new(sink: SinkStatus) -> Self {
        Self {
            sink,
            eviction: None,
            directory: None,
            writes: Vec::new(),
        }
    }

    /// The combined write, if the call had one.
    pub fn combined(&self) -> Option<&WriteReport> {
        self.writes.iter().find(|w| !w.destination.is_apart())
    }

    /// Overall flag handed back to the framework.
    ///
    /// Follows the combined append when there is one; otherwise every apart
    /// append must have succeeded. An empty batch is a success.
    pub fn success(&self) -> bool {
        match self.combined() {
            Some(write) => write.append.is_ok(),
            None => self.writes.iter().all(|w| w.append.is_ok()),
        }
    }
}

/// Log writer
///
/// Holds an immutable configuration snapshot. Not synchronized: callers use
/// one writer per request or process and call `save` once per flush point.
pub struct LogWriter {
    config: LogConfig,
    clock: Arc<dyn Clock>,
    probe: Arc<dyn RuntimeProbe>,
    repository: Option<Arc<dyn RequestLogRepository>>,
}

impl LogWriter {
    /// Create a writer; empty configuration values are replaced by defaults.
    pub fn new(config: LogConfig) -> Self {
        Self {
            config: config.normalized(),
            clock: Arc::new(SystemClock),
            probe: Arc::new(ProcessProbe),
            repository: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn RuntimeProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Enable the datastore sink.
    pub fn with_repository(mut self, repository: Arc<dyn RequestLogRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Persist `batch`. `append` marks the primary end-of-request flush,
    /// which carries diagnostics in debug mode.
    pub fn save(&self, batch: &LogBatch, context: &RequestContext, append: bool) -> bool {
        self.save_with_report(batch, context, append).success()
    }

    /// Same as [`save`](Self::save) but returns every step's outcome.
    pub fn save_with_report(
        &self,
        batch: &LogBatch,
        context: &RequestContext,
        append: bool,
    ) -> SaveReport {
        let now = self.clock.now();
        let mut report = SaveReport::new(self.write_db(batch, context, now));

        let classified = classify(batch, &self.config);
        if classified.is_empty() {
            return report;
        }

        if self.config.max_files > 0 {
            report.eviction = Some(rotator::evict_oldest(&self.config.path, self.config.max_files));
        }

        let master = master_destination(&self.config, now);
        report.directory = Some(rotator::ensure_dir(master.dir()));

        let timestamp = now.format(&self.config.time_format).to_string();
        let diagnostics = (context.debug && append)
            .then(|| Diagnostics::capture(context, now, self.probe.as_ref()));
        let formatter = Formatter::new(&self.config);

        for group in &classified.apart {
            let destination = apart_destination(&self.config, &master, &group.category, now);
            let ctx = FormatContext {
                timestamp: &timestamp,
                request: &context.request,
                diagnostics: None,
                apart: true,
            };
            report.writes.push(self.write(
                &formatter,
                destination,
                std::slice::from_ref(group),
                &ctx,
                now,
            ));
        }

        if !classified.combined.is_empty() {
            let ctx = FormatContext {
                timestamp: &timestamp,
                request: &context.request,
                diagnostics: diagnostics.as_ref(),
                apart: false,
            };
            report
                .writes
                .push(self.write(&formatter, master, &classified.combined, &ctx, now));
        }

        report
    }

    fn write(
        &self,
        formatter: &Formatter<'_>,
        destination: Destination,
        groups: &[CategoryMessages],
        ctx: &FormatContext<'_>,
        now: DateTime<Local>,
    ) -> WriteReport {
        let rotation = rotator::rotate_if_oversized(&destination.path, self.config.file_size, now);

        let append = formatter.format(groups, ctx).and_then(|payload| {
            rotator::append(&destination.path, &payload)
        });
        match &append {
            Ok(bytes) => debug!("Appended {} bytes to {:?}", bytes, destination.path),
            Err(e) => warn!("{}", e),
        }

        WriteReport {
            destination,
            rotation,
            append,
        }
    }

    fn write_db(
        &self,
        batch: &LogBatch,
        context: &RequestContext,
        now: DateTime<Local>,
    ) -> SinkStatus {
        let Some(repository) = &self.repository else {
            return SinkStatus::Skipped(SkipReason::NoRepository);
        };

        let record = match build_request_record(batch, context, &self.config, now) {
            Ok(record) => record,
            Err(reason) => return SinkStatus::Skipped(reason),
        };

        match repository.insert(&self.config.db_table, &record) {
            Ok(()) => {
                debug!(
                    "Recorded slow request {} {} ({}s) in {}",
                    record.method, record.uri, record.runtime, self.config.db_table
                );
                SinkStatus::Inserted
            }
            Err(e) => {
                warn!("Failed to record request in {}: {:#}", self.config.db_table, e);
                SinkStatus::Failed(format!("{:#}", e))
            }
        }
    }
}
