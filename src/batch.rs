//! # Batch Export
//!
//! Converts a set of tables concurrently on a bounded rayon pool. Each table is an
//! independent task; a failing table is recorded in the [`BatchReport`] and never
//! stops its siblings. [`BatchExporter::export`] returns only after every task ends.
use crate::convert::log_outcome;
use crate::convert::ConversionJob;
use crate::convert::TableConverter;
use crate::convert::TableReport;
use crate::output::TableWriter;
use crate::schema::Audience;
use crate::serialize::OutputProfile;
use crate::source::SheetSource;
use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuildError;
use tracing::info;
use tracing::warn;

/// A table whose conversion was abandoned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableFailure {
    pub table: String,
    pub audience: Audience,
    /// 1-based row the failure refers to, if any
    pub row: Option<usize>,
    pub message: String,
}

/// Outcome of one batch, in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<TableReport>,
    pub failed: Vec<TableFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Appends the outcome of another batch.
    pub fn merge(&mut self, other: BatchReport) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }
}

pub struct BatchExporter<'a> {
    converter: TableConverter<'a>,
    thread_pool: ThreadPool,
}

impl<'a> BatchExporter<'a> {
    /// Creates an exporter whose pool runs `threads` workers (rayon's default when `None`).
    ///
    /// # Errors
    ///
    /// Returns the pool build error when the worker threads cannot be spawned.
    pub fn new(
        source: &'a dyn SheetSource,
        profile: OutputProfile,
        threads: Option<usize>,
    ) -> Result<Self, ThreadPoolBuildError> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|index| format!("sheet2lua-{index}"))
            .build()?;
        Ok(Self {
            converter: TableConverter::new(source, profile),
            thread_pool,
        })
    }

    /// Converts every table for `audience` and writes the documents through `writer`.
    pub fn export<S: AsRef<str> + Sync>(
        &self,
        tables: &[S],
        audience: Audience,
        writer: &dyn TableWriter,
    ) -> BatchReport {
        info!(tables = tables.len(), audience = %audience, threads = self.thread_pool.current_num_threads(), "Export started");
        let outcomes: Vec<Result<TableReport, TableFailure>> = self.thread_pool.install(|| {
            tables
                .par_iter()
                .map(|table| {
                    let job = ConversionJob::new(table.as_ref(), audience);
                    let result = self.converter.try_convert(&job, writer);
                    log_outcome(&job, &result);
                    result.map_err(|error| TableFailure {
                        row: error.row(),
                        message: error.to_string(),
                        table: job.table,
                        audience,
                    })
                })
                .collect()
        });

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(table) => report.succeeded.push(table),
                Err(failure) => report.failed.push(failure),
            }
        }
        if report.is_success() {
            info!(audience = %audience, succeeded = report.succeeded.len(), "Export finished");
        } else {
            warn!(audience = %audience, succeeded = report.succeeded.len(), failed = report.failed.len(), "Export finished with failures");
        }
        report
    }
}
