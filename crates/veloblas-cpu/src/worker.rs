//! In-order submission worker.
//!
//! One thread drains the submission channel in order. Dependencies are
//! events of earlier submissions (already resolved or ahead of this task in
//! the same queue) or externally completed events, so waiting on them here
//! cannot deadlock.

use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::Receiver;
use tracing::{debug, trace};

use veloblas_core::{Completion, Event, KernelOptions};

use crate::engine::Counters;
use crate::invocation::{BoundArg, HostKernelFn, KernelInvocation};

/// One submitted kernel, fully resolved.
pub(crate) struct Task {
    pub(crate) label: String,
    pub(crate) body: HostKernelFn,
    pub(crate) args: Vec<BoundArg>,
    pub(crate) options: KernelOptions,
    pub(crate) deps: Vec<Event>,
    pub(crate) completion: Completion,
}

pub(crate) enum WorkerMsg {
    Run(Task),
    Shutdown,
}

pub(crate) fn spawn(
    receiver: Receiver<WorkerMsg>,
    counters: Arc<Counters>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("veloblas-cpu".to_string())
        .spawn(move || run(receiver, counters))
}

fn run(receiver: Receiver<WorkerMsg>, counters: Arc<Counters>) {
    while let Ok(msg) = receiver.recv() {
        match msg {
            WorkerMsg::Run(task) => run_task(task, &counters),
            WorkerMsg::Shutdown => break,
        }
    }
    trace!("worker stopped");
}

fn run_task(task: Task, counters: &Counters) {
    for dep in &task.deps {
        if let Err(err) = dep.wait() {
            debug!(label = %task.label, dep = %dep.id(), "dependency failed, kernel skipped");
            counters.failed.fetch_add(1, Ordering::Relaxed);
            task.completion
                .fail(format!("dependency {} failed: {err}", dep.id()));
            return;
        }
    }

    let invocation = KernelInvocation::new(&task.args, &task.options);
    match (task.body)(&invocation) {
        Ok(()) => {
            trace!(label = %task.label, "kernel complete");
            counters.completed.fetch_add(1, Ordering::Relaxed);
            task.completion.complete();
        }
        Err(err) => {
            debug!(label = %task.label, error = %err, "kernel failed");
            counters.failed.fetch_add(1, Ordering::Relaxed);
            task.completion.fail(err.to_string());
        }
    }
}
