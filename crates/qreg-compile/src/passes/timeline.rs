//! Per-version overwrite and last-use timelines.

use rustc_hash::FxHashMap;
use tracing::debug;

use qreg_ir::{DependencyDag, QuantumFunction, RegisterId, Slot};

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;

/// Lifetime of one produced register version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLifetime {
    /// The produced slot.
    pub slot: Slot,
    /// Position of the producing operation.
    pub producer: usize,
    /// Position of the next operation writing the same register, if any.
    pub next_overwrite: Option<usize>,
    /// Highest position reading this version, if it is read at all.
    pub last_use: Option<usize>,
}

impl SlotLifetime {
    /// Whether the version may be read at `position`.
    ///
    /// `in_place` marks the read by which the overwriting operation consumes
    /// its own left operand; that read happens at the overwrite position.
    pub fn is_readable_at(&self, position: usize, in_place: bool) -> bool {
        let before_overwrite = match self.next_overwrite {
            None => true,
            Some(next) if in_place => position <= next,
            Some(next) => position < next,
        };
        let within_use = self.last_use.is_some_and(|last| position <= last);
        position > self.producer && before_overwrite && within_use
    }
}

/// Overwrite and last-use positions for every produced register version.
///
/// Lifetimes are keyed by producer position, so a slot produced twice (a
/// single-producer violation) still gets two distinct entries.
#[derive(Debug, Clone, Default)]
pub struct RegisterTimeline {
    lifetimes: Vec<Option<SlotLifetime>>,
    latest: FxHashMap<Slot, usize>,
}

impl RegisterTimeline {
    /// Compute the timeline of an instruction list.
    pub fn build(dag: &DependencyDag) -> Self {
        let n = dag.num_ops();
        let mut lifetimes: Vec<Option<SlotLifetime>> = vec![None; n];
        let mut latest = FxHashMap::default();
        let mut next_writer: FxHashMap<RegisterId, usize> = FxHashMap::default();

        for position in (0..n).rev() {
            let Some(result) = dag.operation(position).and_then(|op| op.result()) else {
                continue;
            };
            lifetimes[position] = Some(SlotLifetime {
                slot: result.slot,
                producer: position,
                next_overwrite: next_writer.get(&result.register()).copied(),
                last_use: None,
            });
            next_writer.insert(result.register(), position);
        }

        for consumer in 0..n {
            for producer in dag.operand_producers(consumer).iter().flatten() {
                if let Some(lifetime) = lifetimes[*producer].as_mut() {
                    lifetime.last_use = Some(lifetime.last_use.map_or(consumer, |u| u.max(consumer)));
                }
            }
            if let Some(lifetime) = &lifetimes[consumer] {
                latest.insert(lifetime.slot, consumer);
            }
        }

        Self { lifetimes, latest }
    }

    /// Lifetime of the value produced at `position`.
    pub fn of_producer(&self, position: usize) -> Option<&SlotLifetime> {
        self.lifetimes.get(position).and_then(Option::as_ref)
    }

    /// Lifetime of the last producer of `slot`.
    pub fn of_slot(&self, slot: Slot) -> Option<&SlotLifetime> {
        self.latest.get(&slot).and_then(|&p| self.of_producer(p))
    }

    /// Position overwriting `slot`'s register next; `None` means never.
    pub fn next_overwrite(&self, slot: Slot) -> Option<usize> {
        self.of_slot(slot).and_then(|l| l.next_overwrite)
    }

    /// Highest position reading `slot`.
    pub fn last_use(&self, slot: Slot) -> Option<usize> {
        self.of_slot(slot).and_then(|l| l.last_use)
    }

    /// Iterate over every lifetime in producer order.
    pub fn iter(&self) -> impl Iterator<Item = &SlotLifetime> {
        self.lifetimes.iter().flatten()
    }

    /// Versions produced but never read.
    pub fn unused(&self) -> impl Iterator<Item = &SlotLifetime> {
        self.iter().filter(|l| l.last_use.is_none())
    }
}

/// Analysis pass publishing the [`RegisterTimeline`] of a function.
pub struct TimelineAnalysis;

impl Pass for TimelineAnalysis {
    fn name(&self) -> &'static str {
        "timeline-analysis"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(
        &self,
        function: &mut QuantumFunction,
        properties: &mut PropertySet,
    ) -> CompileResult<()> {
        let dag = DependencyDag::build(function.ops());
        let timeline = RegisterTimeline::build(&dag);
        debug!(
            "Timeline: {} versions, {} never read",
            timeline.iter().count(),
            timeline.unused().count()
        );
        properties.insert(timeline);
        Ok(())
    }
}
