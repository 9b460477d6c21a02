//! State-setting actions whose reference frame is named directly:
//! pure translation, pure rotation, and the combined form.

use dyn_types::{Result, StateItems};

use crate::action::{Action, ActionKind};
use crate::state_init::StateInitCore;
use crate::world::World;

macro_rules! delegate_to_core {
    ($label:literal) => {
        fn type_label(&self) -> &'static str {
            $label
        }

        fn user_name(&self) -> &str {
            &self.core.name
        }

        fn kind(&self) -> ActionKind {
            ActionKind::DynStateInit
        }

        fn is_active(&self) -> bool {
            self.core.active
        }

        fn is_ready(&self, world: &World) -> bool {
            self.core.is_ready_in(world)
        }

        fn apply(&mut self, world: &mut World) -> Result<()> {
            let reference = self.core.reference_id().ok_or_else(|| {
                dyn_types::DynError::NullPointer {
                    ident: self.core.ident_for($label).to_string(),
                    field: "reference frame (initialize never ran)".into(),
                }
            })?;
            self.core.apply_to_subject(world, reference)
        }

        fn report_failure(&self, world: &World) {
            self.core.report_failure_in(world, $label);
        }
    };
}

/// Sets the subject's translational state (position and/or velocity)
/// relative to a named reference frame.
#[derive(Debug, Default)]
pub struct TransStateInit {
    /// Shared configuration; set `position`/`velocity` here.
    pub core: StateInitCore,
}

impl TransStateInit {
    /// A named, active translational initializer.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            core: StateInitCore::named(name),
        }
    }
}

impl Action for TransStateInit {
    delegate_to_core!("TransStateInit");

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.core
            .initialize(world, self.type_label(), StateItems::POS_VEL)
    }
}

/// Sets the subject's rotational state (attitude and/or rate) relative
/// to a named reference frame.
#[derive(Debug, Default)]
pub struct RotStateInit {
    /// Shared configuration; set `attitude`/`rate` here.
    pub core: StateInitCore,
}

impl RotStateInit {
    /// A named, active rotational initializer.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            core: StateInitCore::named(name),
        }
    }
}

impl Action for RotStateInit {
    delegate_to_core!("RotStateInit");

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.core
            .initialize(world, self.type_label(), StateItems::ATT_RATE)
    }
}

/// Sets any combination of the subject's state items relative to a
/// named reference frame.
#[derive(Debug, Default)]
pub struct FullStateInit {
    /// Shared configuration; any of the four items may be supplied.
    pub core: StateInitCore,
}

impl FullStateInit {
    /// A named, active combined initializer.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            core: StateInitCore::named(name),
        }
    }
}

impl Action for FullStateInit {
    delegate_to_core!("FullStateInit");

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.core
            .initialize(world, self.type_label(), StateItems::POS_VEL_ATT_RATE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use dyn_types::{DynError, Orientation};

    fn world_with_sat() -> World {
        let mut world = World::new();
        world.add_root_frame("inertial").unwrap();
        world.add_dyn_body("sat", "inertial").unwrap();
        world
    }

    #[test]
    fn trans_init_rejects_rotational_items() {
        let mut world = world_with_sat();
        let mut action = TransStateInit::named("bad");
        action.core.subject.set_dyn_body("sat");
        action.core.reference_frame = "inertial".into();
        action.core.rate = Some(Vector3::zeros());
        assert!(matches!(
            action.initialize(&mut world),
            Err(DynError::IllegalValue { .. })
        ));
    }

    #[test]
    fn trans_init_applies_position_and_velocity() {
        let mut world = world_with_sat();
        let mut action = TransStateInit::named("sat_trans");
        action.core.subject.set_dyn_body("sat");
        action.core.reference_frame = "inertial".into();
        action.core.position = Some(Vector3::new(7e6, 0.0, 0.0));
        action.core.velocity = Some(Vector3::new(0.0, 7.5e3, 0.0));
        action.initialize(&mut world).unwrap();
        assert!(action.is_ready(&world));
        action.apply(&mut world).unwrap();

        let sat = world.find_body("sat").unwrap();
        let frame = world.bodies.body(sat).frame;
        let node = world.frames.frame(frame);
        assert_relative_eq!(
            node.state.position,
            Vector3::new(7e6, 0.0, 0.0),
            epsilon = 1e-9
        );
        assert_eq!(node.initialized, StateItems::POS_VEL);
        // The reference subscription is released by apply.
        assert_eq!(
            world
                .frames
                .frame(world.find_frame("inertial").unwrap())
                .subscribers(),
            0
        );
    }

    #[test]
    fn velocity_requires_position_on_reference() {
        let mut world = world_with_sat();
        // A bare (uninitialized) frame as reference.
        let bare = world.frames.add_frame("bare", None).unwrap();
        let root = world.find_frame("inertial").unwrap();
        world.frames.graft(bare, root).unwrap();

        let mut action = TransStateInit::named("vel_only");
        action.core.subject.set_dyn_body("sat");
        action.core.reference_frame = "bare".into();
        action.core.velocity = Some(Vector3::new(1.0, 0.0, 0.0));
        action.initialize(&mut world).unwrap();
        assert!(
            !action.is_ready(&world),
            "velocity-only init must wait for reference position"
        );

        // Once the reference holds a position, the action unblocks.
        world.frames.frame_mut(bare).initialized.insert(StateItems::POSITION);
        assert!(action.is_ready(&world));
    }

    #[test]
    fn reverse_sense_velocity_requires_position_and_rate() {
        let mut world = world_with_sat();
        let bare = world.frames.add_frame("bare", None).unwrap();
        let root = world.find_frame("inertial").unwrap();
        world.frames.graft(bare, root).unwrap();

        let mut action = TransStateInit::named("rev");
        action.core.subject.set_dyn_body("sat");
        action.core.reference_frame = "bare".into();
        action.core.reverse_sense = true;
        action.core.velocity = Some(Vector3::new(1.0, 0.0, 0.0));
        action.initialize(&mut world).unwrap();

        let required = action.core.required_items();
        assert!(required.contains(StateItems::ATTITUDE));
        assert!(required.contains(StateItems::POSITION));
        assert!(required.contains(StateItems::RATE));
        assert!(!action.is_ready(&world));
    }

    #[test]
    fn rot_init_against_own_frame_is_immediately_ready() {
        let mut world = world_with_sat();
        let mut action = RotStateInit::named("sat_rot");
        action.core.subject.set_dyn_body("sat");
        action.core.reference_frame = "sat.composite".into();
        action.core.attitude = Some(Orientation::EulerXyz(Vector3::new(0.0, 0.0, 0.1)));
        action.core.rate = Some(Vector3::new(0.0, 0.0, 0.01));
        action.initialize(&mut world).unwrap();

        // Setting attitude+rate needs attitude for the rate — but the
        // action itself supplies it, so the requirement vanishes.
        assert!(action.core.required_items().is_empty());
        assert!(action.is_ready(&world));
        action.apply(&mut world).unwrap();

        let sat = world.find_body("sat").unwrap();
        let node = world.frames.frame(world.bodies.body(sat).frame);
        assert!(node.initialized.contains(StateItems::ATT_RATE));
    }

    #[test]
    fn inactive_action_is_never_ready() {
        let mut world = world_with_sat();
        let mut action = FullStateInit::named("off");
        action.core.active = false;
        action.core.subject.set_dyn_body("sat");
        action.core.reference_frame = "inertial".into();
        action.core.position = Some(Vector3::zeros());
        action.initialize(&mut world).unwrap();
        assert!(!action.is_ready(&world));
    }
}
