//! Ordered phase pipeline.

use super::{Phase, PhaseContext};
use crate::core::CompileResult;
use crate::ir::Graph;
use log::debug;

/// Phases applied to a graph in registration order.
#[derive(Default)]
pub struct PhaseSuite {
    phases: Vec<Box<dyn Phase>>,
}

impl PhaseSuite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a phase at the end of the pipeline.
    pub fn append<P: Phase + 'static>(&mut self, phase: P) {
        self.phases.push(Box::new(phase));
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Phase names in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.phases.iter().map(|phase| phase.name()).collect()
    }

    /// Apply every phase once, in order. Returns whether any phase changed
    /// the graph.
    pub fn run(&self, graph: &mut Graph, context: &PhaseContext<'_, '_>) -> CompileResult<bool> {
        context.session.set_current_unit(graph.name());
        let mut changed = false;
        for phase in &self.phases {
            changed |= phase.apply(graph, context)?;
        }
        debug!(
            "suite finished on {}: {} phases, {}",
            graph.name(),
            self.phases.len(),
            if changed { "changed" } else { "unchanged" }
        );
        Ok(changed)
    }
}
