//! Implementation selection and dispatch.
//!
//! A [`Dispatcher`] maps each [`Function`] to the ordered list of its
//! registered implementation variants. One dispatch enumerates the variants
//! in registration order, lets each accept or reject the parameters against a
//! fresh [`Score`], picks the accepting variant with the strictly greatest
//! fitness (ties keep the earliest registration, so repeated dispatches with
//! identical parameters are reproducible), and executes exactly that one.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::function::{Function, Implementation};
use crate::score::Score;

/// Outcome of implementation selection for one dispatch.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Name of the winning variant.
    pub variant: &'static str,
    /// Registration index of the winner.
    pub index: usize,
    /// Score the winner produced during acceptance.
    pub score: Score,
    /// How many variants accepted the parameters.
    pub accepted: usize,
}

/// Counters maintained across dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchMetrics {
    /// Dispatches that selected a variant and reached execution.
    pub dispatches: u64,
    /// Dispatches that failed because nothing accepted the parameters.
    pub no_candidate: u64,
    /// Dispatches whose execution entry point returned an error.
    pub failures: u64,
}

#[derive(Default)]
struct MetricCounters {
    dispatches: AtomicU64,
    no_candidate: AtomicU64,
    failures: AtomicU64,
}

struct Registered<F: Function> {
    variants: Vec<Arc<dyn Implementation<F>>>,
}

/// Registry and selector over competing implementation variants.
///
/// Holds the execution engine the winning variants run against. Registration
/// normally happens once at initialization; dispatches from multiple threads
/// afterwards are independent and may proceed in parallel.
pub struct Dispatcher {
    engine: Arc<dyn Engine>,
    functions: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    metrics: MetricCounters,
}

impl Dispatcher {
    /// Create a dispatcher over the given engine.
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Dispatcher {
            engine,
            functions: RwLock::new(HashMap::new()),
            metrics: MetricCounters::default(),
        }
    }

    /// The engine submissions run against.
    #[inline]
    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// Append an implementation variant for `F`.
    ///
    /// Registration order is the tie-break order during selection.
    pub fn register<F: Function>(&self, implementation: impl Implementation<F>) {
        let name = implementation.name();
        let mut functions = self.functions.write();
        let entry = functions
            .entry(TypeId::of::<F>())
            .or_insert_with(|| Box::new(Registered::<F> { variants: vec![] }));
        let registered = entry
            .downcast_mut::<Registered<F>>()
            .expect("registry entry holds a different function's variants");
        registered.variants.push(Arc::new(implementation));
        debug!(
            function = F::NAME,
            variant = name,
            index = registered.variants.len() - 1,
            "implementation registered"
        );
    }

    /// Names of the registered variants for `F`, in registration order.
    pub fn variant_names<F: Function>(&self) -> Vec<&'static str> {
        let functions = self.functions.read();
        match functions.get(&TypeId::of::<F>()) {
            Some(entry) => entry
                .downcast_ref::<Registered<F>>()
                .expect("registry entry holds a different function's variants")
                .variants
                .iter()
                .map(|imp| imp.name())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Run the selection protocol without executing the winner.
    pub fn select<F: Function>(&self, params: &F::Params) -> Result<Selection> {
        self.pick::<F>(params).map(|(_, selection)| selection)
    }

    /// Select the best-scoring accepting variant and execute it.
    ///
    /// Exactly one variant's execution entry point runs per successful
    /// dispatch. The returned event depends on every event in `deps`.
    pub fn dispatch<F: Function>(&self, params: &F::Params, deps: &[Event]) -> Result<Event> {
        let (implementation, selection) = match self.pick::<F>(params) {
            Ok(picked) => picked,
            Err(err) => {
                self.metrics.no_candidate.fetch_add(1, Ordering::Relaxed);
                return Err(err);
            }
        };
        self.metrics.dispatches.fetch_add(1, Ordering::Relaxed);
        debug!(
            function = F::NAME,
            variant = selection.variant,
            fitness = selection.score.fitness(),
            accepted = selection.accepted,
            deps = deps.len(),
            "dispatching"
        );
        let result = implementation.execute(self.engine.as_ref(), params, deps);
        if result.is_err() {
            self.metrics.failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Snapshot of the dispatch counters.
    pub fn metrics(&self) -> DispatchMetrics {
        DispatchMetrics {
            dispatches: self.metrics.dispatches.load(Ordering::Relaxed),
            no_candidate: self.metrics.no_candidate.load(Ordering::Relaxed),
            failures: self.metrics.failures.load(Ordering::Relaxed),
        }
    }

    fn pick<F: Function>(
        &self,
        params: &F::Params,
    ) -> Result<(Arc<dyn Implementation<F>>, Selection)> {
        let functions = self.functions.read();
        let registered = functions
            .get(&TypeId::of::<F>())
            .ok_or(Error::UnknownFunction(F::NAME))?
            .downcast_ref::<Registered<F>>()
            .expect("registry entry holds a different function's variants");

        let mut accepted = 0usize;
        let mut best: Option<(usize, Score, &Arc<dyn Implementation<F>>)> = None;
        for (index, implementation) in registered.variants.iter().enumerate() {
            let mut score = Score::default();
            if implementation.accept(params, &mut score) {
                accepted += 1;
                trace!(
                    function = F::NAME,
                    variant = implementation.name(),
                    fitness = score.fitness(),
                    "candidate accepted"
                );
                // Strict comparison keeps the first-registered on ties.
                let better = match &best {
                    Some((_, best_score, _)) => score.fitness() > best_score.fitness(),
                    None => true,
                };
                if better {
                    best = Some((index, score, implementation));
                }
            } else {
                trace!(
                    function = F::NAME,
                    variant = implementation.name(),
                    "candidate rejected"
                );
            }
        }

        match best {
            Some((index, score, implementation)) => {
                let selection = Selection {
                    variant: implementation.name(),
                    index,
                    score,
                    accepted,
                };
                Ok((implementation.clone(), selection))
            }
            None => Err(Error::NoImplementation {
                function: F::NAME,
                params: format!("{params:?}"),
            }),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("engine", &self.engine.name())
            .field("functions", &self.functions.read().len())
            .finish()
    }
}
