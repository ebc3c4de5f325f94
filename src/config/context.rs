// src/config/context.rs

use std::time::Duration;

use crate::report::OutputFormat;

/// Settings for a single run.
///
/// Built once from the manifest plus CLI overrides and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Maximum number of units running at once.
    pub concurrency: usize,
    /// Overall run timeout.
    pub timeout: Option<Duration>,
    /// Per-unit timeout.
    pub unit_timeout: Option<Duration>,
    pub format: OutputFormat,
    /// Signal running units on cancellation instead of letting them finish.
    pub hard_cancel: bool,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            concurrency: 1,
            timeout: None,
            unit_timeout: None,
            format: OutputFormat::Text,
            hard_cancel: false,
        }
    }
}

/// Values given on the command line; `None` keeps the manifest value.
#[derive(Debug, Clone, Default)]
pub struct ContextOverrides {
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
    pub unit_timeout: Option<Duration>,
    pub format: Option<OutputFormat>,
    pub hard_cancel: bool,
}

impl ExecutionContext {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_unit_timeout(mut self, timeout: Duration) -> Self {
        self.unit_timeout = Some(timeout);
        self
    }

    pub fn with_hard_cancel(mut self, hard_cancel: bool) -> Self {
        self.hard_cancel = hard_cancel;
        self
    }

    /// Layer CLI overrides on top of these settings.
    pub fn apply(mut self, overrides: &ContextOverrides) -> Self {
        if let Some(n) = overrides.concurrency {
            self.concurrency = n;
        }
        if let Some(t) = overrides.timeout {
            self.timeout = Some(t);
        }
        if let Some(t) = overrides.unit_timeout {
            self.unit_timeout = Some(t);
        }
        if let Some(f) = overrides.format {
            self.format = f;
        }
        self.hard_cancel |= overrides.hard_cancel;
        self
    }
}
