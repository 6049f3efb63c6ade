//! Run configuration.

use serde::Serialize;

/// Which filters take part in the elimination pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Activation {
    /// No filters; the candidate pool passes through untouched
    #[default]
    None,
    /// Exactly these filter ids, applied in the order given
    Ids(Vec<String>),
    /// Every listed filter whose `enabled` column was true
    EnabledByDefault,
    /// Every listed filter
    All,
}

/// Order for the bulk activation modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ActivationOrder {
    /// Load order across all filter sources
    #[default]
    Registry,
    /// Most initial eliminations first, zero-cut filters last
    InitialCuts,
}

/// Settings for one pairing run.
///
/// ```ignore
/// let config = RunConfig::default()
///     .with_activation(Activation::EnabledByDefault)
///     .with_order(ActivationOrder::InitialCuts)
///     .with_inject_tracked(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    /// Tracked combinations are never removed; only the would-be eliminator is recorded
    pub preserve_tracked: bool,
    /// Tracked combinations that were not generated join the candidate pool
    pub inject_tracked: bool,
    pub activation: Activation,
    pub order: ActivationOrder,
    /// Leave filters with zero initial eliminations out of the listing
    pub hide_zero_cuts: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            preserve_tracked: true,
            inject_tracked: false,
            activation: Activation::None,
            order: ActivationOrder::Registry,
            hide_zero_cuts: true,
        }
    }
}

impl RunConfig {
    pub fn with_preserve_tracked(mut self, preserve: bool) -> Self {
        self.preserve_tracked = preserve;
        self
    }

    pub fn with_inject_tracked(mut self, inject: bool) -> Self {
        self.inject_tracked = inject;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_order(mut self, order: ActivationOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_hide_zero_cuts(mut self, hide: bool) -> Self {
        self.hide_zero_cuts = hide;
        self
    }
}

/// Raw text for one run, as a user would paste it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunInputs {
    pub tens: String,
    pub ones: String,
    pub tracked: String,
    pub seed: String,
    pub prev_seed: String,
}

impl RunInputs {
    pub fn new(tens: impl Into<String>, ones: impl Into<String>) -> Self {
        Self {
            tens: tens.into(),
            ones: ones.into(),
            ..Self::default()
        }
    }

    pub fn with_tracked(mut self, tracked: impl Into<String>) -> Self {
        self.tracked = tracked.into();
        self
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = seed.into();
        self
    }

    pub fn with_prev_seed(mut self, prev_seed: impl Into<String>) -> Self {
        self.prev_seed = prev_seed.into();
        self
    }
}
