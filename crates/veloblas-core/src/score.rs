//! Score records written by acceptance tests.

/// Fitness record a candidate implementation fills during acceptance.
///
/// One fresh record per candidate per dispatch, starting unset at zero. An
/// accepting candidate writes a fitness value with [`set`](Score::set);
/// larger values are more preferred, and magnitudes are meaningful only
/// relative to the other candidates evaluated in the same dispatch, not on
/// any absolute scale. Optional named annotations carry
/// implementation-specific detail (a preferred stride, a computed work-group
/// count) for diagnostics.
///
/// A rejecting candidate must leave the record untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Score {
    fitness: f32,
    written: bool,
    annotations: Vec<(&'static str, f32)>,
}

impl Score {
    /// Record a fitness value.
    #[inline]
    pub fn set(&mut self, fitness: f32) {
        self.fitness = fitness;
        self.written = true;
    }

    /// The recorded fitness, zero if never written.
    #[inline]
    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    /// True once a fitness value has been recorded.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.written
    }

    /// Attach a named annotation.
    pub fn annotate(&mut self, name: &'static str, value: f32) {
        self.annotations.push((name, value));
    }

    /// Look up an annotation by name.
    pub fn annotation(&self, name: &str) -> Option<f32> {
        self.annotations
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// All annotations in insertion order.
    pub fn annotations(&self) -> &[(&'static str, f32)] {
        &self.annotations
    }
}
