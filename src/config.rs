use std::time::Duration;

/// Knobs for one optimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Enter the exact model in every tournament.
    pub exact: bool,
    pub exact_time_limit: Duration,
    /// Subsets larger than this skip the exact model.
    pub exact_max_items: usize,
    /// Try to save a sheet after the first allocation.
    pub refine: bool,
    /// Evaluate tournament trials on the rayon pool.
    pub parallel: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            exact: false,
            exact_time_limit: Duration::from_secs(20),
            exact_max_items: 12,
            refine: true,
            parallel: true,
        }
    }
}

impl SolverConfig {
    pub fn with_exact(mut self, enable: bool) -> Self {
        self.exact = enable;
        self
    }

    pub fn with_exact_time_limit(mut self, limit: Duration) -> Self {
        self.exact_time_limit = limit;
        self
    }

    pub fn with_exact_max_items(mut self, max: usize) -> Self {
        self.exact_max_items = max.max(1);
        self
    }

    pub fn with_refine(mut self, enable: bool) -> Self {
        self.refine = enable;
        self
    }

    pub fn with_parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }
}
