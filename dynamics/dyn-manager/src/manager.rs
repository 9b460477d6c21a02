//! The owning scheduler: the action queue, the staged startup sweep,
//! and the per-cycle steady-state pass.

use dyn_types::{DynError, Result, StateItems};

use crate::action::{Action, ActionKind};
use crate::world::World;

struct Queued {
    action: Box<dyn Action>,
    initialized: bool,
}

/// Owns the world and the ordered queue of pending actions.
///
/// Startup (`initialize_simulation`) runs a staged sweep: mass
/// initializations first, then attachments, then a fixpoint over the
/// state-setting actions that keeps passing over the queue until a
/// full pass applies nothing. After startup, `perform_actions` makes a
/// single pass per simulation cycle; conditions change gradually
/// across cycles, so multi-pass settling within one cycle is not
/// needed there.
pub struct DynManager {
    /// The shared simulation state the actions operate on.
    pub world: World,
    queue: Vec<Queued>,
    startup_complete: bool,
}

impl Default for DynManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DynManager {
    /// A manager over an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::with_world(World::new())
    }

    /// A manager over a pre-populated world.
    #[must_use]
    pub fn with_world(world: World) -> Self {
        Self {
            world,
            queue: Vec::new(),
            startup_complete: false,
        }
    }

    /// Number of actions still queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if the startup sweep has run.
    #[must_use]
    pub fn startup_complete(&self) -> bool {
        self.startup_complete
    }

    /// Queue an action.
    ///
    /// A named action already present (same type and user name) is
    /// reported and ignored, not an error. Unnamed actions are never
    /// treated as duplicates of each other: distinct instances share
    /// the "unnamed instance" identity without being the same action.
    /// After startup the action is initialized immediately instead of
    /// waiting for a sweep that will never come.
    pub fn add_action(&mut self, mut action: Box<dyn Action>) -> Result<()> {
        let ident = action.ident();
        if !action.user_name().is_empty() && self.queue.iter().any(|q| q.action.ident() == ident) {
            tracing::error!(
                code = "dyn_manager/queue",
                action = %ident,
                "action is already queued; ignoring"
            );
            return Ok(());
        }
        let mut initialized = false;
        if self.startup_complete {
            action.initialize(&mut self.world)?;
            initialized = true;
        }
        self.queue.push(Queued {
            action,
            initialized,
        });
        Ok(())
    }

    /// Remove a queued action by its user name. Returns whether one was
    /// removed.
    pub fn remove_action(&mut self, name: &str) -> bool {
        let before = self.queue.len();
        self.queue.retain(|q| q.action.user_name() != name);
        before != self.queue.len()
    }

    /// The startup sweep.
    ///
    /// 1. Mass initializations: initialize, apply immediately if ready.
    /// 2. Attachments: same.
    /// 3. State-setting fixpoint: initialize every state-setting
    ///    action, then keep passing over the whole queue, applying
    ///    everything ready, until a pass makes no progress. Actions
    ///    still blocked are reported through `report_failure`.
    /// 4. Everything else is initialized and left queued for the
    ///    steady-state passes.
    ///
    /// Reported blockage is escalated to a fatal error only through the
    /// final aggregate check: every dynamics body's frame must hold a
    /// complete state, whether or not the action meant to supply it
    /// ever ran.
    pub fn initialize_simulation(&mut self) -> Result<()> {
        self.run_stage(ActionKind::MassInit)?;
        self.run_stage(ActionKind::Attach)?;

        self.initialize_kind(Some(ActionKind::DynStateInit))?;
        while self.apply_pass(|_| true)? {}
        for q in &self.queue {
            if q.initialized && q.action.is_active() && q.action.kind() != ActionKind::Other {
                q.action.report_failure(&self.world);
            }
        }

        self.initialize_kind(None)?;
        self.startup_complete = true;
        self.check_state_consistency()
    }

    /// The steady-state pass: apply and remove every currently-ready
    /// action, once, leaving the rest queued for a future cycle.
    pub fn perform_actions(&mut self) -> Result<()> {
        self.apply_pass(|_| true).map(|_| ())
    }

    fn run_stage(&mut self, kind: ActionKind) -> Result<()> {
        self.initialize_kind(Some(kind))?;
        self.apply_pass(|action| action.kind() == kind)
            .map(|_| ())
    }

    /// Initialize every uninitialized queued action of `kind`, or all
    /// of them when `kind` is `None`. Initialization failures are
    /// configuration errors and propagate immediately.
    fn initialize_kind(&mut self, kind: Option<ActionKind>) -> Result<()> {
        for i in 0..self.queue.len() {
            let q = &mut self.queue[i];
            if q.initialized || kind.is_some_and(|k| q.action.kind() != k) {
                continue;
            }
            q.action.initialize(&mut self.world)?;
            q.initialized = true;
        }
        Ok(())
    }

    /// One pass over the queue: apply and remove every initialized,
    /// active, ready action matching `filter`, in queue order.
    ///
    /// The queue is drained into a kept list rather than erased in
    /// place, so removal can never skip or revisit an element. On an
    /// apply error, the failing action and everything after it go back
    /// in the queue before the error propagates.
    fn apply_pass(&mut self, filter: impl Fn(&dyn Action) -> bool) -> Result<bool> {
        let pending = std::mem::take(&mut self.queue);
        let mut kept = Vec::with_capacity(pending.len());
        let mut progressed = false;
        let mut result = Ok(());
        let mut iter = pending.into_iter();
        for mut q in iter.by_ref() {
            let runnable = q.initialized
                && q.action.is_active()
                && filter(q.action.as_ref())
                && q.action.is_ready(&self.world);
            if !runnable {
                kept.push(q);
                continue;
            }
            if let Err(err) = q.action.apply(&mut self.world) {
                kept.push(q);
                result = Err(err);
                break;
            }
            progressed = true;
        }
        kept.extend(iter);
        self.queue = kept;
        result.map(|()| progressed)
    }

    /// The aggregate post-sweep check: every dynamics body must have a
    /// fully valid state, regardless of which action was supposed to
    /// supply it. All shortfalls are listed in one error.
    fn check_state_consistency(&self) -> Result<()> {
        let mut missing = Vec::new();
        for (_, body) in self.world.bodies.iter() {
            if !body.is_dynamics() {
                continue;
            }
            let initialized = self.world.frames.frame(body.frame).initialized;
            if !initialized.contains(StateItems::POS_VEL_ATT_RATE) {
                missing.push(format!(
                    "{} missing {}",
                    body.name,
                    StateItems::POS_VEL_ATT_RATE.difference(initialized)
                ));
            }
        }
        if missing.is_empty() {
            return Ok(());
        }
        Err(DynError::InconsistentSetup {
            ident: "DynManager".into(),
            detail: format!(
                "dynamics state still missing after the startup sweep: {}",
                missing.join("; ")
            ),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    use crate::state_init::TransStateInit;

    fn manager_with_sat() -> DynManager {
        let mut manager = DynManager::new();
        manager.world.add_root_frame("inertial").unwrap();
        manager.world.add_dyn_body("sat", "inertial").unwrap();
        manager
    }

    fn trans_init(name: &str, subject: &str, reference: &str) -> Box<TransStateInit> {
        let mut action = TransStateInit::named(name);
        action.core.subject.set_dyn_body(subject);
        action.core.reference_frame = reference.into();
        action.core.position = Some(Vector3::zeros());
        Box::new(action)
    }

    #[test]
    fn duplicate_add_is_ignored_not_an_error() {
        let mut manager = manager_with_sat();
        manager
            .add_action(trans_init("pos", "sat", "inertial"))
            .unwrap();
        manager
            .add_action(trans_init("pos", "sat", "inertial"))
            .unwrap();
        assert_eq!(manager.pending(), 1);
    }

    #[test]
    fn distinct_unnamed_actions_both_queue() {
        let mut manager = manager_with_sat();
        manager.world.add_dyn_body("sat2", "inertial").unwrap();
        manager
            .add_action(trans_init("", "sat", "inertial"))
            .unwrap();
        manager
            .add_action(trans_init("", "sat2", "inertial"))
            .unwrap();
        assert_eq!(manager.pending(), 2);
    }

    #[test]
    fn remove_action_by_name() {
        let mut manager = manager_with_sat();
        manager
            .add_action(trans_init("pos", "sat", "inertial"))
            .unwrap();
        assert!(manager.remove_action("pos"));
        assert!(!manager.remove_action("pos"));
        assert_eq!(manager.pending(), 0);
    }

    #[test]
    fn post_startup_add_initializes_immediately() {
        let mut manager = manager_with_sat();
        // Give the sat a full state so the sweep's aggregate check
        // passes with an empty queue.
        let sat = manager.world.find_body("sat").unwrap();
        let frame = manager.world.bodies.body(sat).frame;
        manager
            .world
            .frames
            .frame_mut(frame)
            .initialized
            .insert(StateItems::POS_VEL_ATT_RATE);
        manager.initialize_simulation().unwrap();
        assert!(manager.startup_complete());

        // A bad reference now fails at add time, not at the next sweep.
        assert!(manager
            .add_action(trans_init("late", "sat", "nowhere"))
            .is_err());
    }

    #[test]
    fn sweep_fails_when_state_is_missing() {
        let mut manager = manager_with_sat();
        let err = manager.initialize_simulation().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("sat"));
        assert!(matches!(err, DynError::InconsistentSetup { .. }));
    }
}
