#![forbid(unsafe_code)]

//! Turn discovery boundary.
//!
//! Finding turn elements in a host document is the host's business. The
//! engine only needs an ordered list of [`TurnRecord`]s, obtained through a
//! small chain of [`TurnSource`] strategies: each one either recognises the
//! document and returns its turns, or returns `None` and lets the next
//! strategy try. The first success wins.

use crate::marker::TurnRecord;

/// One discovery strategy.
pub trait TurnSource {
    /// Short stable name used in logs.
    fn name(&self) -> &str;

    /// Return the document's turns in order, or `None` when this strategy
    /// does not recognise the document.
    fn discover(&self) -> Option<Vec<TurnRecord>>;
}

/// A strategy backed by a closure.
pub struct FnSource<F> {
    name: &'static str,
    discover: F,
}

impl<F> FnSource<F>
where
    F: Fn() -> Option<Vec<TurnRecord>>,
{
    pub fn new(name: &'static str, discover: F) -> Self {
        Self { name, discover }
    }
}

impl<F> TurnSource for FnSource<F>
where
    F: Fn() -> Option<Vec<TurnRecord>>,
{
    fn name(&self) -> &str {
        self.name
    }

    fn discover(&self) -> Option<Vec<TurnRecord>> {
        (self.discover)()
    }
}

/// A discovery match and the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryMatch {
    pub strategy: String,
    pub turns: Vec<TurnRecord>,
}

/// Ordered list of strategies; first success wins.
#[derive(Default)]
pub struct DiscoveryChain {
    strategies: Vec<Box<dyn TurnSource>>,
}

impl std::fmt::Debug for DiscoveryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryChain")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl DiscoveryChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy; earlier strategies take priority.
    #[must_use]
    pub fn with(mut self, source: impl TurnSource + 'static) -> Self {
        self.strategies.push(Box::new(source));
        self
    }

    pub fn push(&mut self, source: impl TurnSource + 'static) {
        self.strategies.push(Box::new(source));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run strategies in order and return the first match.
    #[must_use]
    pub fn first_match(&self) -> Option<DiscoveryMatch> {
        self.strategies.iter().find_map(|source| {
            let turns = source.discover()?;
            tracing::trace!(
                target: "turnline.discovery",
                strategy = source.name(),
                turns = turns.len(),
                "discovery strategy matched"
            );
            Some(DiscoveryMatch {
                strategy: source.name().to_string(),
                turns,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::SourceRef;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn first_success_wins() {
        let chain = DiscoveryChain::new()
            .with(FnSource::new("nothing", || None))
            .with(FnSource::new("articles", || {
                Some(vec![TurnRecord::new("t1", SourceRef::new(1), 0.0, "hi")])
            }))
            .with(FnSource::new("fallback", || Some(Vec::new())));

        let found = chain.first_match().expect("articles strategy matches");
        assert_eq!(found.strategy, "articles");
        assert_eq!(found.turns.len(), 1);
    }

    #[test]
    fn later_strategies_not_run_after_match() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let chain = DiscoveryChain::new()
            .with(FnSource::new("first", || Some(Vec::new())))
            .with(FnSource::new("second", move || {
                counter.set(counter.get() + 1);
                None
            }));

        assert!(chain.first_match().is_some());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn empty_chain_matches_nothing() {
        let chain = DiscoveryChain::new();
        assert!(chain.is_empty());
        assert!(chain.first_match().is_none());
    }

    #[test]
    fn debug_lists_strategy_names() {
        let chain = DiscoveryChain::new()
            .with(FnSource::new("a", || None))
            .with(FnSource::new("b", || None));
        let debug = format!("{chain:?}");
        assert!(debug.contains("\"a\""));
        assert!(debug.contains("\"b\""));
    }
}
