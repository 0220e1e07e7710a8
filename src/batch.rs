//! Build many independent windows in parallel.

use std::thread;

use tracing::{debug, info};

use crate::config::WindowConfig;
use crate::errors::PoaError;
use crate::window::Window;

/// The outcome of building a single window
pub struct WindowReport {
    pub window: Window,

    /// Reads that could not be added, with their position in the input
    pub failed_reads: Vec<(usize, PoaError)>,
}

/// Add all reads to a fresh window. Failing reads are recorded and skipped, which
/// after a failed merge means all remaining reads fail as well.
pub fn build_window<R>(config: WindowConfig, reads: &[R]) -> Result<WindowReport, PoaError>
where
    R: AsRef<[u8]>,
{
    let mut window = Window::new(config)?;
    let mut failed_reads = Vec::new();

    for (i, read) in reads.iter().enumerate() {
        if let Err(e) = window.add_read(read.as_ref()) {
            failed_reads.push((i, e));
        }
    }

    Ok(WindowReport { window, failed_reads })
}

/// Build one window per entry of `windows`, using `threads` worker threads.
///
/// Workers take window indices from a shared queue, so large and small windows
/// balance out. The reports are returned in input order.
pub fn process_windows<R>(
    config: WindowConfig,
    windows: &[Vec<R>],
    threads: usize,
) -> Vec<Result<WindowReport, PoaError>>
where
    R: AsRef<[u8]> + Sync,
{
    let num_workers = threads.clamp(1, windows.len().max(1));
    info!(windows = windows.len(), workers = num_workers, "Processing windows...");

    let (tx_jobs, rx_jobs) = crossbeam_channel::unbounded();
    let (tx_out, rx_out) = crossbeam_channel::unbounded();

    for ix in 0..windows.len() {
        tx_jobs.send(ix).expect("Job queue receiver dropped early");
    }
    drop(tx_jobs);

    thread::scope(|scope| {
        for worker in 0..num_workers {
            let thread_rx = rx_jobs.clone();
            let thread_tx = tx_out.clone();

            scope.spawn(move || {
                while let Ok(ix) = thread_rx.recv() {
                    debug!(worker, window = ix, "build_window");
                    let report = build_window(config, &windows[ix]);

                    if thread_tx.send((ix, report)).is_err() {
                        break;
                    }
                }
            });
        }
    });

    drop(tx_out);

    let mut reports: Vec<Option<Result<WindowReport, PoaError>>> = (0..windows.len()).map(|_| None).collect();
    for (ix, report) in rx_out.iter() {
        reports[ix] = Some(report);
    }

    // Every index was sent exactly once, and workers only stop when the queue is drained
    reports.into_iter().flatten().collect()
}
