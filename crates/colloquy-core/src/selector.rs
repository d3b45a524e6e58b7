//! Weighted speaker selection
//!
//! Picks one actor from the population with probability proportional to
//! its weight, after capping each group's aggregate pull at a baseline
//! group's total. Every draw is seeded from the shared tick and the
//! population size only, so all participants agree on the outcome.
//!
//! # Algorithm
//!
//! 1. Sum weights per [`PopulationGroup`].
//! 2. Baseline = primary total if positive, else the largest other total.
//! 3. Scale each group by `baseline / total` when it exceeds the baseline.
//! 4. With an effective total below 1.0, a first roll may return silence.
//! 5. A second, salted roll picks a point on the cumulative scale.

use crate::actor::{Actor, Population, PopulationGroup};
use crate::hash::{hash_combine, SELECTION_SALT};
use crate::rng::with_seed;
use crate::time::Tick;
use crate::ActorId;

const GROUPS: usize = PopulationGroup::ALL.len();

/// Outcome of a selection round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The chosen actor
    Actor(ActorId),
    /// Nobody speaks this round
    Silence,
}

impl Selection {
    /// The chosen actor, if any
    pub fn actor(self) -> Option<ActorId> {
        match self {
            Selection::Actor(id) => Some(id),
            Selection::Silence => None,
        }
    }

    /// Whether the round is silent
    pub fn is_silence(self) -> bool {
        matches!(self, Selection::Silence)
    }
}

/// Group totals and scale factors computed for one population
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPlan {
    totals: [f64; GROUPS],
    scales: [f64; GROUPS],
    baseline: f64,
    effective_total: f64,
}

impl SelectionPlan {
    /// Compute the plan; `None` when no group carries any weight
    pub fn build(population: &Population) -> Option<Self> {
        let mut totals = [0.0; GROUPS];
        for actor in population.iter() {
            totals[actor.group.index()] += actor.selection_weight();
        }

        let primary = totals[PopulationGroup::Primary.index()];
        let baseline = if primary > 0.0 {
            primary
        } else {
            PopulationGroup::ALL
                .iter()
                .filter(|g| **g != PopulationGroup::Primary)
                .map(|g| totals[g.index()])
                .fold(0.0, f64::max)
        };
        if baseline <= 0.0 {
            return None;
        }

        let mut scales = [1.0; GROUPS];
        for (scale, &total) in scales.iter_mut().zip(totals.iter()) {
            if total > baseline {
                *scale = baseline / total;
            }
        }

        let effective_total = totals.iter().zip(scales.iter()).map(|(t, s)| t * s).sum();

        Some(Self {
            totals,
            scales,
            baseline,
            effective_total,
        })
    }

    /// The baseline group total
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Raw weight total of a group
    pub fn group_total(&self, group: PopulationGroup) -> f64 {
        self.totals[group.index()]
    }

    /// Scale factor in (0, 1] applied to a group
    pub fn scale(&self, group: PopulationGroup) -> f64 {
        self.scales[group.index()]
    }

    /// A group's total after scaling
    pub fn effective_group_total(&self, group: PopulationGroup) -> f64 {
        self.group_total(group) * self.scale(group)
    }

    /// Sum of all scaled group totals
    pub fn effective_total(&self) -> f64 {
        self.effective_total
    }

    /// Scaled weight of one actor
    pub fn effective_weight(&self, actor: &Actor) -> f64 {
        actor.selection_weight() * self.scale(actor.group)
    }

    /// Scan `population` in order and return the first actor whose
    /// inclusive cumulative effective weight exceeds `r`.
    ///
    /// Falls back to the last actor with positive weight when the scan
    /// runs out (floating-point rounding), or silence if there is none.
    pub fn pick(&self, population: &Population, r: f64) -> Selection {
        let mut cumulative = 0.0;
        for actor in population.iter() {
            cumulative += self.effective_weight(actor);
            if r < cumulative {
                return Selection::Actor(actor.id);
            }
        }

        population
            .iter()
            .filter(|a| a.selection_weight() > 0.0)
            .last()
            .map_or(Selection::Silence, |a| Selection::Actor(a.id))
    }
}

/// Deterministic weighted selector
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedSelector;

impl WeightedSelector {
    /// Create a selector
    pub fn new() -> Self {
        Self
    }

    /// Pick a speaker for `tick`, or silence
    pub fn select(&self, population: &Population, tick: Tick) -> Selection {
        let Some(plan) = SelectionPlan::build(population) else {
            return Selection::Silence;
        };
        let effective_total = plan.effective_total();
        if effective_total <= 0.0 {
            return Selection::Silence;
        }

        let seed = hash_combine(tick as u32, population.len() as u32);

        let silence_roll = with_seed(seed as u64, |rng| rng.next_f64());
        if effective_total < 1.0 && silence_roll > effective_total {
            tracing::trace!(tick, effective_total, silence_roll, "low appetite, staying silent");
            return Selection::Silence;
        }

        let salted = hash_combine(seed, SELECTION_SALT);
        let r = with_seed(salted as u64, |rng| rng.next_f64()) * effective_total;

        let selection = plan.pick(population, r);
        tracing::trace!(tick, effective_total, r, ?selection, "speaker selected");
        selection
    }
}
