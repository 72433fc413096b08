//! Per-call state for schema traversal.
//!
//! A [`CallContext`] lives for one top-level `validate`, `serialize` or
//! `deserialize` call. It tracks how many references have been followed
//! since the last step into a child value, and which `(container value,
//! schema)` pairs have already been visited, so that cyclic values are
//! processed once and the earlier result is reused on every revisit.
//!
//! Composition branches are tried under a [`Mark`]: every change to the
//! visited pairs is journaled while a mark is open, so rolling a branch back
//! costs as much as the branch did, not as much as the whole map.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::schema::{definition_name, RefFailure, Schema};
use crate::value::Value;

use super::Enforcer;

/// The operation a call performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Validate,
    Serialize,
    Deserialize,
}

impl Operation {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Operation::Validate => "validate",
            Operation::Serialize => "serialize",
            Operation::Deserialize => "deserialize",
        }
    }
}

/// What is known about one `(value, schema)` pair.
#[derive(Debug, Clone)]
struct Visit {
    /// The output produced (or being produced) for the pair.
    output: Option<Value>,
    /// The pair dispatched through its discriminator and the next visit
    /// should process the base schema itself.
    dispatching: bool,
}

/// The outcome of entering a `(value, schema)` pair.
#[derive(Debug)]
pub(crate) enum Entry {
    /// First visit.
    Fresh,
    /// Revisit after a discriminator dispatch: process normally.
    Resume,
    /// Already processed (or in progress further up): reuse the output.
    Done(Option<Value>),
}

type PairKey = (usize, usize);

/// A position in the visit journal, taken before trying a composition
/// branch. Marks nest and must be closed in reverse order, either with
/// [`CallContext::commit`] or [`CallContext::rollback`].
#[must_use]
pub(crate) struct Mark(usize);

/// The visits a rolled back branch produced, kept so the branch can be
/// reinstated once it is known to be the one that matched.
pub(crate) struct Branch(Vec<(PairKey, Option<Visit>)>);

pub(crate) struct CallContext<'e> {
    enforcer: &'e Enforcer,
    operation: Operation,
    coerce: bool,
    hops: usize,
    visited: HashMap<PairKey, Visit>,
    /// Previous state of every pair changed while a mark is open.
    journal: Vec<(PairKey, Option<Visit>)>,
    open_marks: usize,
}

impl<'e> CallContext<'e> {
    pub(crate) fn new(enforcer: &'e Enforcer, operation: Operation, coerce: bool) -> Self {
        Self {
            enforcer,
            operation,
            coerce,
            hops: 0,
            visited: HashMap::new(),
            journal: Vec::new(),
            open_marks: 0,
        }
    }

    pub(crate) fn enforcer(&self) -> &'e Enforcer {
        self.enforcer
    }

    pub(crate) fn operation(&self) -> Operation {
        self.operation
    }

    pub(crate) fn coerce(&self) -> bool {
        self.coerce
    }

    /// Resolves a reference, counting it against the depth limit.
    ///
    /// Only consecutive hops count: the counter starts over inside every
    /// child value (see [`CallContext::descend`]), so deep data is fine and
    /// only reference loops that never reach a child value are cut off.
    /// Every successful call must be paired with [`CallContext::unfollow`]
    /// once the target has been processed.
    pub(crate) fn follow(&mut self, name: &str) -> Result<Arc<Schema>, RefFailure> {
        let max_depth = self.enforcer.config().max_depth;
        if self.hops >= max_depth {
            return Err(RefFailure::TooDeep(max_depth));
        }
        let target = self
            .enforcer
            .definitions()
            .get(definition_name(name))
            .ok_or_else(|| RefFailure::Unresolved(name.to_string()))?;
        self.hops += 1;
        Ok(target)
    }

    pub(crate) fn unfollow(&mut self) {
        self.hops = self.hops.saturating_sub(1);
    }

    /// Runs `f` for a child value (an array item or object property).
    pub(crate) fn descend<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let hops = std::mem::take(&mut self.hops);
        let result = f(self);
        self.hops = hops;
        result
    }

    /// Records a visit to `(value, schema)`. Scalars are never tracked.
    pub(crate) fn enter(&mut self, schema: &Schema, value: &Value) -> Entry {
        let Some(key) = pair_key(schema, value) else {
            return Entry::Fresh;
        };
        match self.visited.get(&key) {
            None => {
                self.write(
                    key,
                    Some(Visit {
                        output: None,
                        dispatching: false,
                    }),
                );
                Entry::Fresh
            }
            Some(visit) if visit.dispatching => {
                let output = visit.output.clone();
                self.write(
                    key,
                    Some(Visit {
                        output,
                        dispatching: false,
                    }),
                );
                Entry::Resume
            }
            Some(visit) => Entry::Done(visit.output.clone()),
        }
    }

    /// Whether `(value, schema)` has been entered during this call.
    pub(crate) fn visited(&self, schema: &Schema, value: &Value) -> bool {
        pair_key(schema, value).is_some_and(|key| self.visited.contains_key(&key))
    }

    /// Stores the output for a pair entered earlier.
    pub(crate) fn set_output(&mut self, schema: &Schema, value: &Value, output: Value) {
        self.update(schema, value, |visit| visit.output = Some(output));
    }

    /// Marks a pair as dispatching through its discriminator.
    pub(crate) fn mark_dispatching(&mut self, schema: &Schema, value: &Value) {
        self.update(schema, value, |visit| visit.dispatching = true);
    }

    /// Opens a mark before trying a composition branch.
    pub(crate) fn mark(&mut self) -> Mark {
        self.open_marks += 1;
        Mark(self.journal.len())
    }

    /// Keeps everything recorded since `mark`.
    pub(crate) fn commit(&mut self, mark: Mark) {
        debug_assert!(mark.0 <= self.journal.len());
        self.close();
    }

    /// Undoes everything recorded since `mark` and returns what was undone.
    pub(crate) fn rollback(&mut self, mark: Mark) -> Branch {
        let changes = self.journal.split_off(mark.0);
        let mut branch = Vec::new();
        let mut seen = HashSet::new();
        for (key, _) in &changes {
            if seen.insert(*key) {
                branch.push((*key, self.visited.get(key).cloned()));
            }
        }
        for (key, previous) in changes.into_iter().rev() {
            match previous {
                Some(visit) => self.visited.insert(key, visit),
                None => self.visited.remove(&key),
            };
        }
        self.close();
        Branch(branch)
    }

    /// Reinstates a branch undone by [`CallContext::rollback`].
    pub(crate) fn reinstate(&mut self, branch: Branch) {
        for (key, visit) in branch.0 {
            self.write(key, visit);
        }
    }

    fn close(&mut self) {
        self.open_marks = self.open_marks.saturating_sub(1);
        if self.open_marks == 0 {
            self.journal.clear();
        }
    }

    fn update(&mut self, schema: &Schema, value: &Value, change: impl FnOnce(&mut Visit)) {
        let Some(key) = pair_key(schema, value) else {
            return;
        };
        if let Some(mut visit) = self.visited.get(&key).cloned() {
            change(&mut visit);
            self.write(key, Some(visit));
        }
    }

    fn write(&mut self, key: PairKey, visit: Option<Visit>) {
        let previous = match visit {
            Some(visit) => self.visited.insert(key, visit),
            None => self.visited.remove(&key),
        };
        if self.open_marks > 0 {
            self.journal.push((key, previous));
        }
    }
}

fn pair_key(schema: &Schema, value: &Value) -> Option<PairKey> {
    value
        .identity()
        .map(|id| (id, schema as *const Schema as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Version;
    use crate::schema::SchemaBuilder;

    #[test]
    fn test_scalars_are_not_tracked() {
        let enforcer = Enforcer::new(Version::V3);
        let mut ctx = CallContext::new(&enforcer, Operation::Validate, false);
        let schema = Schema::integer().build();
        let value = Value::Integer(1);

        assert!(matches!(ctx.enter(&schema, &value), Entry::Fresh));
        assert!(matches!(ctx.enter(&schema, &value), Entry::Fresh));
    }

    #[test]
    fn test_revisit_returns_stored_output() {
        let enforcer = Enforcer::new(Version::V3);
        let mut ctx = CallContext::new(&enforcer, Operation::Serialize, false);
        let schema = Schema::object().build();
        let value = Value::object([("a", Value::Integer(1))]);
        let output = Value::object([("a", Value::Integer(2))]);

        assert!(matches!(ctx.enter(&schema, &value), Entry::Fresh));
        ctx.set_output(&schema, &value, output.clone());
        match ctx.enter(&schema, &value) {
            Entry::Done(Some(stored)) => assert_eq!(stored.identity(), output.identity()),
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[test]
    fn test_dispatching_resumes_once() {
        let enforcer = Enforcer::new(Version::V3);
        let mut ctx = CallContext::new(&enforcer, Operation::Validate, false);
        let schema = Schema::object().build();
        let value = Value::object(Vec::<(String, Value)>::new());

        ctx.enter(&schema, &value);
        ctx.mark_dispatching(&schema, &value);
        assert!(matches!(ctx.enter(&schema, &value), Entry::Resume));
        assert!(matches!(ctx.enter(&schema, &value), Entry::Done(None)));
    }

    #[test]
    fn test_rollback_forgets_later_visits() {
        let enforcer = Enforcer::new(Version::V3);
        let mut ctx = CallContext::new(&enforcer, Operation::Validate, false);
        let schema = Schema::array(Schema::any()).build();
        let value = Value::array(Vec::new());

        let before = ctx.mark();
        ctx.enter(&schema, &value);
        let _ = ctx.rollback(before);
        assert!(matches!(ctx.enter(&schema, &value), Entry::Fresh));
    }

    #[test]
    fn test_rollback_reverts_changes_to_earlier_visits() {
        let enforcer = Enforcer::new(Version::V3);
        let mut ctx = CallContext::new(&enforcer, Operation::Serialize, false);
        let schema = Schema::object().build();
        let value = Value::object([("a", Value::Integer(1))]);

        ctx.enter(&schema, &value);
        let before = ctx.mark();
        ctx.set_output(&schema, &value, Value::Integer(2));
        ctx.mark_dispatching(&schema, &value);
        let _ = ctx.rollback(before);

        assert!(matches!(ctx.enter(&schema, &value), Entry::Done(None)));
    }

    #[test]
    fn test_reinstate_replays_a_rolled_back_branch() {
        let enforcer = Enforcer::new(Version::V3);
        let mut ctx = CallContext::new(&enforcer, Operation::Serialize, false);
        let schema = Schema::object().build();
        let first = Value::object([("a", Value::Integer(1))]);
        let second = Value::object([("b", Value::Integer(2))]);

        let outer = ctx.mark();
        ctx.enter(&schema, &first);
        let inner = ctx.mark();
        ctx.enter(&schema, &second);
        ctx.set_output(&schema, &second, Value::Integer(2));
        let branch = ctx.rollback(inner);
        assert!(!ctx.visited(&schema, &second));

        ctx.reinstate(branch);
        match ctx.enter(&schema, &second) {
            Entry::Done(Some(output)) => assert_eq!(output, Value::Integer(2)),
            other => panic!("unexpected entry {:?}", other),
        }

        // The outer mark still undoes both the branch and the earlier visit
        let _ = ctx.rollback(outer);
        assert!(!ctx.visited(&schema, &first));
        assert!(!ctx.visited(&schema, &second));
        assert!(ctx.journal.is_empty());
    }

    #[test]
    fn test_commit_keeps_visits() {
        let enforcer = Enforcer::new(Version::V3);
        let mut ctx = CallContext::new(&enforcer, Operation::Validate, false);
        let schema = Schema::array(Schema::any()).build();
        let value = Value::array(Vec::new());

        let before = ctx.mark();
        ctx.enter(&schema, &value);
        ctx.commit(before);

        assert!(ctx.visited(&schema, &value));
        assert!(ctx.journal.is_empty());
    }

    #[test]
    fn test_follow_counts_depth() {
        let enforcer = Enforcer::new(Version::V3).with_max_depth(1);
        enforcer
            .definitions()
            .register("Name", Schema::string())
            .unwrap();
        let mut ctx = CallContext::new(&enforcer, Operation::Validate, false);

        assert!(ctx.follow("#/components/schemas/Name").is_ok());
        assert_eq!(ctx.follow("Name").unwrap_err(), RefFailure::TooDeep(1));
        // A child value starts a fresh chain
        assert!(ctx.descend(|ctx| ctx.follow("Name")).is_ok());
        ctx.unfollow();
        assert_eq!(
            ctx.follow("Missing").unwrap_err(),
            RefFailure::Unresolved("Missing".to_string())
        );
    }
}
