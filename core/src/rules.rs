//! Two-tier rule/action fixed-point engine.
//!
//! A [`Rule`] is a predicate over some live context `C`. When it evaluates
//! true the rule is "pending" and its paired [`Action`] runs. The engine keeps
//! running passes until a pass launches no action.
//!
//! Within one pass every rule is evaluated before any action starts, then all
//! fired actions run concurrently. The first failure aborts the whole run.
//! Actions must make their rule evaluate false, or bound themselves; the
//! engine caps passes per tier so a rule that never settles is reported as
//! [`EngineError::PassLimitExceeded`] rather than spinning forever.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use futures_util::future::try_join_all;
use thiserror::Error;
use verity_types::DeclineReason;

/// Pass budget per registered rule, used for the default pass cap.
pub const PASSES_PER_RULE: usize = 4;

pub type BoxError = Box<dyn Error + Send + Sync>;

pub type ActionFut<'a> = Pin<Box<dyn Future<Output = Result<(), ActionError>> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Corrections run while editing and at the start of a submission.
    Regular,
    /// Last-step work that only runs once every regular tier settled.
    Final,
}

impl Tier {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Regular => "regular",
            Tier::Final => "final",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait Rule<C: ?Sized>: Send + Sync {
    /// Unique name within one engine.
    fn name(&self) -> &'static str;
    fn evaluate(&self, ctx: &C) -> bool;
}

pub trait Action<C: ?Sized>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Tier this action must be registered in, if it cares.
    fn tier(&self) -> Option<Tier> {
        None
    }

    fn execute<'a>(&'a self, ctx: &'a C) -> ActionFut<'a>;
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("declined by user ({0})")]
    Declined(DeclineReason),
    #[error("action {action} failed: {source}")]
    Failed {
        action: &'static str,
        #[source]
        source: BoxError,
    },
}

impl ActionError {
    pub fn failed(action: &'static str, source: impl Into<BoxError>) -> Self {
        ActionError::Failed {
            action,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn is_declined(&self) -> bool {
        matches!(self, ActionError::Declined(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("rule name must not be empty")]
    EmptyName,
    #[error("duplicate rule registered: {name}")]
    DuplicateRule { name: &'static str },
    #[error("action {action} belongs to the {declared} tier, not {registered}")]
    TierMismatch {
        action: &'static str,
        declared: Tier,
        registered: Tier,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{tier} tier aborted by rule {rule}: {source}")]
    Action {
        tier: Tier,
        rule: &'static str,
        #[source]
        source: ActionError,
    },
    #[error("{tier} tier did not settle within {limit} passes")]
    PassLimitExceeded { tier: Tier, limit: usize },
}

impl EngineError {
    #[must_use]
    pub fn is_declined(&self) -> bool {
        matches!(self, EngineError::Action { source, .. } if source.is_declined())
    }
}

/// Outcome of a settled tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Passes that launched at least one action.
    pub passes: usize,
    pub actions_run: usize,
}

struct Entry<C: ?Sized> {
    rule: Box<dyn Rule<C>>,
    action: Option<Box<dyn Action<C>>>,
}

pub struct RuleActionEngine<C: ?Sized> {
    regular: Vec<Entry<C>>,
    final_tier: Vec<Entry<C>>,
    pass_limit: Option<usize>,
}

impl<C: ?Sized> Default for RuleActionEngine<C> {
    fn default() -> Self {
        Self {
            regular: Vec::new(),
            final_tier: Vec::new(),
            pass_limit: None,
        }
    }
}

impl<C: ?Sized> fmt::Debug for RuleActionEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |entries: &[Entry<C>]| -> Vec<&'static str> {
            entries.iter().map(|e| e.rule.name()).collect()
        };
        f.debug_struct("RuleActionEngine")
            .field("regular", &names(&self.regular))
            .field("final", &names(&self.final_tier))
            .field("pass_limit", &self.pass_limit)
            .finish()
    }
}

impl<C: ?Sized + Sync> RuleActionEngine<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-tier pass cap.
    pub fn with_pass_limit(mut self, limit: usize) -> Self {
        self.pass_limit = Some(limit);
        self
    }

    /// Register a rule that only reports pending state.
    pub fn add_rule(
        &mut self,
        tier: Tier,
        rule: Box<dyn Rule<C>>,
    ) -> Result<(), RegistrationError> {
        self.check_name(rule.name())?;
        self.entries_mut(tier).push(Entry { rule, action: None });
        Ok(())
    }

    pub fn add_rule_and_action(
        &mut self,
        tier: Tier,
        rule: Box<dyn Rule<C>>,
        action: Box<dyn Action<C>>,
    ) -> Result<(), RegistrationError> {
        self.check_name(rule.name())?;
        if let Some(declared) = action.tier()
            && declared != tier
        {
            return Err(RegistrationError::TierMismatch {
                action: action.name(),
                declared,
                registered: tier,
            });
        }
        self.entries_mut(tier).push(Entry {
            rule,
            action: Some(action),
        });
        Ok(())
    }

    #[must_use]
    pub fn rule_count(&self, tier: Tier) -> usize {
        self.entries(tier).len()
    }

    /// Effective pass cap for `tier`.
    #[must_use]
    pub fn pass_limit(&self, tier: Tier) -> usize {
        self.pass_limit
            .unwrap_or_else(|| self.rule_count(tier) * PASSES_PER_RULE + 1)
    }

    #[must_use]
    pub fn has_pending_actions(&self, tier: Tier, ctx: &C) -> bool {
        self.entries(tier).iter().any(|e| e.rule.evaluate(ctx))
    }

    /// Names of the rules of `tier` that currently evaluate true.
    #[must_use]
    pub fn pending_rules(&self, tier: Tier, ctx: &C) -> Vec<&'static str> {
        self.entries(tier)
            .iter()
            .filter(|e| e.rule.evaluate(ctx))
            .map(|e| e.rule.name())
            .collect()
    }

    /// Run `tier` until no fired rule has an action left to launch.
    pub async fn run_pending_actions(&self, tier: Tier, ctx: &C) -> Result<RunReport, EngineError> {
        let limit = self.pass_limit(tier);
        let mut report = RunReport::default();

        loop {
            // Evaluate the whole tier before launching anything.
            let runnable: Vec<(&'static str, &dyn Action<C>)> = self
                .entries(tier)
                .iter()
                .filter(|e| e.rule.evaluate(ctx))
                .filter_map(|e| e.action.as_deref().map(|a| (e.rule.name(), a)))
                .collect();

            if runnable.is_empty() {
                tracing::debug!(
                    tier = %tier,
                    passes = report.passes,
                    actions_run = report.actions_run,
                    "tier settled"
                );
                return Ok(report);
            }
            if report.passes >= limit {
                tracing::warn!(tier = %tier, limit, "tier exceeded its pass limit");
                return Err(EngineError::PassLimitExceeded { tier, limit });
            }

            report.passes += 1;
            tracing::debug!(
                tier = %tier,
                pass = report.passes,
                rules = ?runnable.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
                "running pass"
            );

            try_join_all(runnable.iter().map(|(rule, action)| {
                let rule = *rule;
                async move {
                    action
                        .execute(ctx)
                        .await
                        .map_err(|source| EngineError::Action { tier, rule, source })
                }
            }))
            .await?;

            report.actions_run += runnable.len();
        }
    }

    fn check_name(&self, name: &'static str) -> Result<(), RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        let taken = self
            .regular
            .iter()
            .chain(&self.final_tier)
            .any(|e| e.rule.name() == name);
        if taken {
            return Err(RegistrationError::DuplicateRule { name });
        }
        Ok(())
    }

    fn entries(&self, tier: Tier) -> &[Entry<C>] {
        match tier {
            Tier::Regular => &self.regular,
            Tier::Final => &self.final_tier,
        }
    }

    fn entries_mut(&mut self, tier: Tier) -> &mut Vec<Entry<C>> {
        match tier {
            Tier::Regular => &mut self.regular,
            Tier::Final => &mut self.final_tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Counter context: rules fire while the value is below their threshold.
    #[derive(Default)]
    struct Ctx {
        value: AtomicUsize,
        log: Mutex<Vec<&'static str>>,
    }

    impl Ctx {
        fn value(&self) -> usize {
            self.value.load(Ordering::SeqCst)
        }
    }

    /// Fires when `value == step` and bumps the value by one.
    struct Step {
        name: &'static str,
        step: usize,
    }

    impl Rule<Ctx> for Step {
        fn name(&self) -> &'static str {
            self.name
        }
        fn evaluate(&self, ctx: &Ctx) -> bool {
            ctx.value() == self.step
        }
    }

    impl Action<Ctx> for Step {
        fn name(&self) -> &'static str {
            self.name
        }
        fn execute<'a>(&'a self, ctx: &'a Ctx) -> ActionFut<'a> {
            Box::pin(async move {
                ctx.log.lock().unwrap().push(self.name);
                ctx.value.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }
    }

    struct Always(&'static str);

    impl Rule<Ctx> for Always {
        fn name(&self) -> &'static str {
            self.0
        }
        fn evaluate(&self, _ctx: &Ctx) -> bool {
            true
        }
    }

    impl Action<Ctx> for Always {
        fn name(&self) -> &'static str {
            self.0
        }
        fn execute<'a>(&'a self, _ctx: &'a Ctx) -> ActionFut<'a> {
            Box::pin(async { Ok(()) })
        }
    }

    struct Failing;

    impl Action<Ctx> for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn execute<'a>(&'a self, _ctx: &'a Ctx) -> ActionFut<'a> {
            Box::pin(async { Err(ActionError::failed("failing", "boom")) })
        }
    }

    struct FinalOnly;

    impl Action<Ctx> for FinalOnly {
        fn name(&self) -> &'static str {
            "final_only"
        }
        fn tier(&self) -> Option<Tier> {
            Some(Tier::Final)
        }
        fn execute<'a>(&'a self, _ctx: &'a Ctx) -> ActionFut<'a> {
            Box::pin(async { Ok(()) })
        }
    }

    fn step(name: &'static str, step_at: usize) -> (Box<dyn Rule<Ctx>>, Box<dyn Action<Ctx>>) {
        (
            Box::new(Step { name, step: step_at }),
            Box::new(Step { name, step: step_at }),
        )
    }

    #[tokio::test]
    async fn chain_settles_after_one_pass_per_link() {
        let mut engine = RuleActionEngine::<Ctx>::new();
        // Registered out of order; each link enables the next.
        for (name, at) in [("third", 2), ("first", 0), ("second", 1)] {
            let (rule, action) = step(name, at);
            engine.add_rule_and_action(Tier::Regular, rule, action).unwrap();
        }
        let ctx = Ctx::default();

        let report = engine.run_pending_actions(Tier::Regular, &ctx).await.unwrap();

        assert_eq!(report.passes, 3);
        assert_eq!(report.actions_run, 3);
        assert_eq!(*ctx.log.lock().unwrap(), vec!["first", "second", "third"]);
        assert!(!engine.has_pending_actions(Tier::Regular, &ctx));
    }

    #[tokio::test]
    async fn idle_tier_resolves_without_passes() {
        let mut engine = RuleActionEngine::<Ctx>::new();
        let (rule, action) = step("never", 99);
        engine.add_rule_and_action(Tier::Final, rule, action).unwrap();

        let report = engine
            .run_pending_actions(Tier::Final, &Ctx::default())
            .await
            .unwrap();
        assert_eq!(report, RunReport::default());
    }

    #[tokio::test]
    async fn failure_aborts_the_tier() {
        let mut engine = RuleActionEngine::<Ctx>::new();
        engine
            .add_rule_and_action(Tier::Regular, Box::new(Always("bad")), Box::new(Failing))
            .unwrap();
        let (rule, action) = step("good", 0);
        engine.add_rule_and_action(Tier::Regular, rule, action).unwrap();

        let err = engine
            .run_pending_actions(Tier::Regular, &Ctx::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Action { rule: "bad", .. }));
        assert!(!err.is_declined());
    }

    #[tokio::test]
    async fn declined_action_is_reported_as_decline() {
        struct Decline;
        impl Action<Ctx> for Decline {
            fn name(&self) -> &'static str {
                "decline"
            }
            fn execute<'a>(&'a self, _ctx: &'a Ctx) -> ActionFut<'a> {
                Box::pin(async { Err(ActionError::Declined(DeclineReason::Close)) })
            }
        }

        let mut engine = RuleActionEngine::<Ctx>::new();
        engine
            .add_rule_and_action(Tier::Regular, Box::new(Always("ask")), Box::new(Decline))
            .unwrap();
        let err = engine
            .run_pending_actions(Tier::Regular, &Ctx::default())
            .await
            .unwrap_err();
        assert!(err.is_declined());
    }

    #[tokio::test]
    async fn non_settling_rule_hits_the_pass_cap() {
        let mut engine = RuleActionEngine::<Ctx>::new();
        engine
            .add_rule_and_action(Tier::Regular, Box::new(Always("loop")), Box::new(Always("loop")))
            .unwrap();
        assert_eq!(engine.pass_limit(Tier::Regular), PASSES_PER_RULE + 1);

        let err = engine
            .run_pending_actions(Tier::Regular, &Ctx::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::PassLimitExceeded { tier: Tier::Regular, limit } if limit == PASSES_PER_RULE + 1
        ));
    }

    #[tokio::test]
    async fn pass_limit_override_applies() {
        let mut engine = RuleActionEngine::<Ctx>::new().with_pass_limit(2);
        engine
            .add_rule_and_action(Tier::Regular, Box::new(Always("loop")), Box::new(Always("loop")))
            .unwrap();
        let err = engine
            .run_pending_actions(Tier::Regular, &Ctx::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PassLimitExceeded { limit: 2, .. }));
    }

    #[tokio::test]
    async fn actionless_rule_is_pending_but_never_runs() {
        let mut engine = RuleActionEngine::<Ctx>::new();
        engine.add_rule(Tier::Regular, Box::new(Always("flag"))).unwrap();
        let ctx = Ctx::default();

        assert!(engine.has_pending_actions(Tier::Regular, &ctx));
        assert_eq!(engine.pending_rules(Tier::Regular, &ctx), vec!["flag"]);
        let report = engine.run_pending_actions(Tier::Regular, &ctx).await.unwrap();
        assert_eq!(report.passes, 0);
    }

    #[test]
    fn duplicate_names_are_rejected_across_tiers() {
        let mut engine = RuleActionEngine::<Ctx>::new();
        engine.add_rule(Tier::Regular, Box::new(Always("dup"))).unwrap();
        let err = engine
            .add_rule(Tier::Final, Box::new(Always("dup")))
            .unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateRule { name: "dup" });
        assert_eq!(
            engine.add_rule(Tier::Final, Box::new(Always(""))).unwrap_err(),
            RegistrationError::EmptyName
        );
    }

    #[test]
    fn tier_affinity_is_checked() {
        let mut engine = RuleActionEngine::<Ctx>::new();
        let err = engine
            .add_rule_and_action(Tier::Regular, Box::new(Always("acct")), Box::new(FinalOnly))
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::TierMismatch {
                action: "final_only",
                declared: Tier::Final,
                registered: Tier::Regular,
            }
        );
        engine
            .add_rule_and_action(Tier::Final, Box::new(Always("acct")), Box::new(FinalOnly))
            .unwrap();
    }
}
