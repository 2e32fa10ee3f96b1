// This module provides arena-based session management for a single compilation job using
// the bumpalo crate. CompilationSession borrows the arena, interns strings (unit and phase
// names) into it, and accumulates SessionStats: phase runs and timings, canonicalizer
// rewrites, value-numbering hits, constant folds, removed nodes, inlined snippets, lowered
// instructions and emitted epilogues. Frame layouts built during emission allocate their
// register lists in the same arena. A session belongs to exactly one job and is never
// shared across threads; the RefCell interior keeps the recording API on `&self` so the
// session can be threaded through phases that only hold shared references.

//! Arena-based compilation session management.
//!
//! All per-job bookkeeping is tied to the session lifetime, which in turn is
//! bounded by the arena it borrows.

use bumpalo::Bump;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Per-phase counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PhaseStat {
    pub runs: usize,
    pub changes: usize,
    pub time: Duration,
}

/// Arena-based compilation session.
pub struct CompilationSession<'arena> {
    arena: &'arena Bump,
    stats: RefCell<SessionStats>,
    interned_strings: RefCell<HashMap<String, &'arena str>>,
    current_unit: RefCell<Option<&'arena str>>,
}

impl<'arena> CompilationSession<'arena> {
    /// Create a new compilation session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(SessionStats::default()),
            interned_strings: RefCell::new(HashMap::new()),
            current_unit: RefCell::new(None),
        }
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    /// Intern a string in the arena.
    pub fn intern_str(&self, s: &str) -> &'arena str {
        let mut strings = self.interned_strings.borrow_mut();
        if let Some(&interned) = strings.get(s) {
            return interned;
        }

        let interned = self.arena.alloc_str(s);
        strings.insert(s.to_string(), interned);
        interned
    }

    /// Set the compilation unit being compiled.
    pub fn set_current_unit(&self, name: &str) {
        let name = self.intern_str(name);
        *self.current_unit.borrow_mut() = Some(name);
    }

    pub fn current_unit(&self) -> Option<&'arena str> {
        *self.current_unit.borrow()
    }

    /// Record one application of a phase.
    pub fn record_phase(&self, name: &str, changed: bool, elapsed: Option<Duration>) {
        let mut stats = self.stats.borrow_mut();
        stats.phases_run += 1;
        let entry = stats.phase_stats.entry(name.to_string()).or_default();
        entry.runs += 1;
        if changed {
            entry.changes += 1;
        }
        if let Some(elapsed) = elapsed {
            entry.time += elapsed;
        }
    }

    pub fn record_rewrite(&self) {
        self.stats.borrow_mut().canonical_rewrites += 1;
    }

    pub fn record_constant_fold(&self) {
        self.stats.borrow_mut().constant_folds += 1;
    }

    pub fn record_gvn_hit(&self) {
        self.stats.borrow_mut().gvn_hits += 1;
    }

    pub fn record_nodes_removed(&self, count: usize) {
        self.stats.borrow_mut().nodes_removed += count;
    }

    pub fn record_snippet_inlined(&self) {
        self.stats.borrow_mut().snippets_inlined += 1;
    }

    /// Record a lowered instruction.
    pub fn record_instruction(&self, name: &str) {
        let mut stats = self.stats.borrow_mut();
        stats.instructions_lowered += 1;
        *stats.instruction_counts.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn record_epilogue(&self) {
        self.stats.borrow_mut().epilogues_emitted += 1;
    }

    /// Get compilation statistics.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

/// Compilation session statistics.
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    /// Phase applications, including nested ones.
    pub phases_run: usize,
    pub phase_stats: HashMap<String, PhaseStat>,
    pub canonical_rewrites: usize,
    pub constant_folds: usize,
    pub gvn_hits: usize,
    pub nodes_removed: usize,
    pub snippets_inlined: usize,
    pub instructions_lowered: usize,
    pub instruction_counts: HashMap<String, usize>,
    pub epilogues_emitted: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compilation Session Statistics:")?;
        writeln!(f, "  Phases run: {}", self.phases_run)?;
        writeln!(f, "  Canonical rewrites: {}", self.canonical_rewrites)?;
        writeln!(f, "  Constant folds: {}", self.constant_folds)?;
        writeln!(f, "  GVN hits: {}", self.gvn_hits)?;
        writeln!(f, "  Nodes removed: {}", self.nodes_removed)?;
        writeln!(f, "  Snippets inlined: {}", self.snippets_inlined)?;
        writeln!(f, "  Instructions lowered: {}", self.instructions_lowered)?;
        writeln!(f, "  Epilogues emitted: {}", self.epilogues_emitted)?;

        if !self.phase_stats.is_empty() {
            writeln!(f, "  Phase breakdown:")?;
            let mut sorted: Vec<_> = self.phase_stats.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            for (name, stat) in sorted {
                writeln!(
                    f,
                    "    {}: {} runs, {} changed, {:?}",
                    name, stat.runs, stat.changes, stat.time
                )?;
            }
        }

        if !self.instruction_counts.is_empty() {
            writeln!(f, "  Instruction breakdown:")?;
            let mut sorted: Vec<_> = self.instruction_counts.iter().collect();
            sorted.sort_by_key(|(name, count)| (std::cmp::Reverse(**count), name.to_string()));

            for (name, count) in sorted.into_iter().take(10) {
                writeln!(f, "    {}: {}", name, count)?;
            }
        }

        Ok(())
    }
}
