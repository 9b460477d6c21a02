//! The uniform action contract.
//!
//! Every queued unit of work — state-setting, topology-mutating, mass
//! initialization — implements [`Action`]. The lifecycle is strict:
//! *constructed* → `initialize` (resolve references, validate, take
//! subscriptions) → zero-or-more `is_ready` queries → `apply` (do the
//! work, release what `initialize` took) → removed from the queue. An
//! action that never becomes ready stays queued until the scheduler
//! gives up and reports it.

use dyn_types::{DynError, Result};

use crate::world::World;

/// Coarse action classification, used by the staged startup sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Sets mass properties and attachment points; no cross-body
    /// ordering dependency.
    MassInit,
    /// Grafts or prunes bodies (attach/detach family).
    Attach,
    /// Sets translational/rotational state; participates in the
    /// startup fixpoint.
    DynStateInit,
    /// Anything else; initialized last, scheduled at steady state.
    Other,
}

/// Identity of an action instance: the concrete type's label plus the
/// user-supplied instance name.
///
/// Built once at `initialize` time; an unnamed action reads as
/// `Type.unnamed instance` in every diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionIdent {
    type_label: &'static str,
    instance: String,
}

impl ActionIdent {
    /// Build the identity from a type label and the user name (empty
    /// for unnamed instances).
    #[must_use]
    pub fn new(type_label: &'static str, user_name: &str) -> Self {
        let instance = if user_name.is_empty() {
            "unnamed instance".to_owned()
        } else {
            user_name.to_owned()
        };
        Self {
            type_label,
            instance,
        }
    }

    /// The concrete action type's label.
    #[must_use]
    pub fn type_label(&self) -> &'static str {
        self.type_label
    }
}

impl std::fmt::Display for ActionIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.type_label, self.instance)
    }
}

/// Validate a required name string, citing the field and the kind of
/// thing it was supposed to name.
pub fn validate_name(ident: &ActionIdent, value: &str, field: &str, kind: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DynError::InvalidName {
            ident: ident.to_string(),
            field: field.into(),
            kind: kind.into(),
        });
    }
    Ok(())
}

/// A queued, declarative unit of work with a readiness predicate and an
/// apply step.
pub trait Action {
    /// The concrete type's label, used in identities and duplicate
    /// detection.
    fn type_label(&self) -> &'static str;

    /// The user-supplied instance name; empty for unnamed instances.
    fn user_name(&self) -> &str;

    /// The action's identity.
    fn ident(&self) -> ActionIdent {
        ActionIdent::new(self.type_label(), self.user_name())
    }

    /// Which scheduling stage this action belongs to.
    fn kind(&self) -> ActionKind;

    /// Whether the action participates at all. Once false, the action
    /// is permanently excluded from readiness.
    fn is_active(&self) -> bool;

    /// Resolve references, validate the configuration, and take any
    /// one-time tree subscriptions. Failures here are configuration
    /// errors and treated as fatal by the caller.
    fn initialize(&mut self, world: &mut World) -> Result<()>;

    /// Whether the action can run now. Base semantics: the active
    /// flag; state-setting actions intersect this with their
    /// dependency test. Re-evaluated every scheduler pass.
    fn is_ready(&self, world: &World) -> bool {
        let _ = world;
        self.is_active()
    }

    /// Do the work and release everything `initialize` acquired.
    fn apply(&mut self, world: &mut World) -> Result<()>;

    /// Diagnostic hook invoked for actions still active and unready
    /// when the startup fixpoint gives up. Must not mutate state.
    fn report_failure(&self, world: &World) {
        let _ = world;
        tracing::error!(
            code = "dyn_manager/never_ready",
            action = %self.ident(),
            "action never became ready"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ident_uses_unnamed_fallback() {
        let ident = ActionIdent::new("TransStateInit", "");
        assert_eq!(ident.to_string(), "TransStateInit.unnamed instance");
        let named = ActionIdent::new("TransStateInit", "sat_pos");
        assert_eq!(named.to_string(), "TransStateInit.sat_pos");
    }

    #[test]
    fn validate_name_rejects_empty() {
        let ident = ActionIdent::new("BodyAttachAligned", "dock");
        let err = validate_name(&ident, "", "subject_point", "attachment point").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("subject_point"));
        assert!(msg.contains("attachment point"));
        assert!(validate_name(&ident, "nose", "subject_point", "attachment point").is_ok());
    }
}
