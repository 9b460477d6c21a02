//! Attach/detach mechanics: the underlying tree-restructuring
//! operations the topology actions dispatch to.
//!
//! Every function returns `Ok(true)` on success and `Ok(false)` when
//! the operation is structurally impossible (subject already attached,
//! target inside the subject's own subtree, target not an ancestor on
//! detach). `Err` is reserved for kind violations, which indicate a
//! dispatch bug upstream, not a user configuration problem.

use nalgebra::{UnitQuaternion, Vector3};

use dyn_types::{AttachPoint, BodyId, DynError, FrameId, Result, StateItems};
use dyn_frames::{frame_state, FrameTree, RefFrameState};

use crate::body::BodySet;

const IDENT: &str = "mechanics";

/// Compute the subject-body offset and attitude that mate two named
/// attachment points.
///
/// Mating convention: the subject point frame is rotated 180° about its
/// z axis onto the parent point frame, so the two x axes anti-align
/// (the frames face each other) and the origins coincide.
///
/// Returns `(offset, attitude)` of the subject body frame relative to
/// the parent body frame.
#[must_use]
pub fn mate_points(
    parent_pt: &AttachPoint,
    subject_pt: &AttachPoint,
) -> (Vector3<f64>, UnitQuaternion<f64>) {
    let flip = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::PI);
    // parent body -> parent point -> (flip) subject point -> subject body
    let attitude = subject_pt.orientation.inverse() * flip * parent_pt.orientation;
    let offset = parent_pt.position - attitude.inverse() * subject_pt.position;
    (offset, attitude)
}

fn require_dyn(bodies: &BodySet, id: BodyId, role: &str) -> Result<()> {
    if bodies.body(id).is_dynamics() {
        Ok(())
    } else {
        Err(DynError::InvalidObject {
            ident: IDENT.into(),
            name: format!("{role} {}", bodies.body(id).name),
            expected: "dynamics-capable body".into(),
        })
    }
}

/// Attach one body under another in the mass tree and re-parent the
/// subject's composite frame accordingly.
///
/// `offset`/`attitude` place the subject body frame in the parent body
/// frame. The subject's frame inherits the parent frame's initialized
/// items: a fixed offset is exactly as valid as the frame it hangs
/// under.
fn attach_body_to_body(
    bodies: &mut BodySet,
    frames: &mut FrameTree,
    subject: BodyId,
    parent: BodyId,
    offset: Vector3<f64>,
    attitude: UnitQuaternion<f64>,
) -> Result<bool> {
    if bodies.body(subject).parent.is_some() {
        tracing::debug!(
            code = "dyn_body/attach",
            subject = %bodies.body(subject).name,
            "attach refused: subject already attached"
        );
        return Ok(false);
    }
    if bodies.is_mass_ancestor(subject, parent) {
        tracing::debug!(
            code = "dyn_body/attach",
            subject = %bodies.body(subject).name,
            parent = %bodies.body(parent).name,
            "attach refused: parent lies inside subject's subtree"
        );
        return Ok(false);
    }

    bodies.body_mut(subject).parent = Some(parent);
    bodies.body_mut(parent).children.push(subject);

    let subject_frame = bodies.body(subject).frame;
    let parent_frame = bodies.body(parent).frame;
    if frames.frame(subject_frame).parent.is_some() {
        frames.prune(subject_frame)?;
    }
    frames.graft(subject_frame, parent_frame)?;
    let inherited = frames.frame(parent_frame).initialized;
    let node = frames.frame_mut(subject_frame);
    node.state = frame_state(offset, Vector3::zeros(), attitude, Vector3::zeros());
    node.initialized = inherited;
    Ok(true)
}

/// Attach a dynamics body as a child dynamics body.
pub fn attach_dyn_to_dyn(
    bodies: &mut BodySet,
    frames: &mut FrameTree,
    subject: BodyId,
    parent: BodyId,
    offset: Vector3<f64>,
    attitude: UnitQuaternion<f64>,
) -> Result<bool> {
    require_dyn(bodies, subject, "subject")?;
    require_dyn(bodies, parent, "parent")?;
    attach_body_to_body(bodies, frames, subject, parent, offset, attitude)
}

/// Attach a mass body as a sub-mass-body of a dynamics body.
pub fn attach_mass_to_dyn(
    bodies: &mut BodySet,
    frames: &mut FrameTree,
    subject: BodyId,
    parent: BodyId,
    offset: Vector3<f64>,
    attitude: UnitQuaternion<f64>,
) -> Result<bool> {
    require_dyn(bodies, parent, "parent")?;
    attach_body_to_body(bodies, frames, subject, parent, offset, attitude)
}

/// Attach a mass body under another mass body.
pub fn attach_mass_to_mass(
    bodies: &mut BodySet,
    frames: &mut FrameTree,
    subject: BodyId,
    parent: BodyId,
    offset: Vector3<f64>,
    attitude: UnitQuaternion<f64>,
) -> Result<bool> {
    attach_body_to_body(bodies, frames, subject, parent, offset, attitude)
}

/// Kinematically attach a dynamics body to a free-standing frame.
///
/// The body moves with the frame; the offset fully specifies its state
/// there, so the composite frame comes out fully initialized.
pub fn attach_dyn_to_frame(
    bodies: &mut BodySet,
    frames: &mut FrameTree,
    subject: BodyId,
    target: FrameId,
    offset: Vector3<f64>,
    attitude: UnitQuaternion<f64>,
) -> Result<bool> {
    require_dyn(bodies, subject, "subject")?;
    if bodies.body(subject).parent.is_some() {
        tracing::debug!(
            code = "dyn_body/attach",
            subject = %bodies.body(subject).name,
            "frame attach refused: subject already attached to a body"
        );
        return Ok(false);
    }
    let subject_frame = bodies.body(subject).frame;
    if frames.is_ancestor(subject_frame, target) {
        tracing::debug!(
            code = "dyn_body/attach",
            subject = %bodies.body(subject).name,
            "frame attach refused: target frame lies under the subject"
        );
        return Ok(false);
    }
    if frames.frame(subject_frame).parent.is_some() {
        frames.prune(subject_frame)?;
    }
    frames.graft(subject_frame, target)?;
    let state = frame_state(offset, Vector3::zeros(), attitude, Vector3::zeros());
    frames.set_state(subject_frame, StateItems::POS_VEL_ATT_RATE, &state);
    Ok(true)
}

/// Shared detach bookkeeping: sever the subject from its direct mass
/// parent, provided `from` lies on its ancestor chain.
fn sever_mass_link(bodies: &mut BodySet, subject: BodyId, from: BodyId) -> Result<bool> {
    if subject == from || !bodies.is_mass_ancestor(from, subject) {
        tracing::debug!(
            code = "dyn_body/detach",
            subject = %bodies.body(subject).name,
            target = %bodies.body(from).name,
            "detach refused: target is not an ancestor of subject"
        );
        return Ok(false);
    }
    let Some(parent) = bodies.body(subject).parent else {
        return Ok(false);
    };
    bodies.body_mut(subject).parent = None;
    bodies.body_mut(parent).children.retain(|&c| c != subject);
    Ok(true)
}

/// Detach a dynamics body from a dynamics ancestor.
///
/// The subject's composite frame is re-rooted under its integration
/// frame with the same total state it had at separation, so the
/// detachment is kinematically seamless.
pub fn detach_dyn_from_dyn(
    bodies: &mut BodySet,
    frames: &mut FrameTree,
    subject: BodyId,
    from: BodyId,
) -> Result<bool> {
    require_dyn(bodies, subject, "subject")?;
    require_dyn(bodies, from, "detach target")?;

    let subject_frame = bodies.body(subject).frame;
    let integ = bodies
        .body(subject)
        .dynamics
        .as_ref()
        .map(|d| d.integ_frame)
        .ok_or_else(|| DynError::InvalidObject {
            ident: IDENT.into(),
            name: bodies.body(subject).name.clone(),
            expected: "dynamics-capable body".into(),
        })?;

    // Capture the separation state before touching any link.
    let state = frames.state_wrt(subject_frame, integ)?;
    if !sever_mass_link(bodies, subject, from)? {
        return Ok(false);
    }
    frames.prune(subject_frame)?;
    frames.graft(subject_frame, integ)?;
    frames.frame_mut(subject_frame).state = state;
    Ok(true)
}

/// Detach (jettison) a mass body from a dynamics ancestor.
///
/// The jettisoned body has no integration frame; its composite frame
/// becomes free-standing and its state items are no longer valid.
pub fn detach_mass_from_dyn(
    bodies: &mut BodySet,
    frames: &mut FrameTree,
    subject: BodyId,
    from: BodyId,
) -> Result<bool> {
    require_dyn(bodies, from, "detach target")?;
    detach_mass(bodies, frames, subject, from)
}

/// Detach a mass body from a mass-tree ancestor.
pub fn detach_mass_from_mass(
    bodies: &mut BodySet,
    frames: &mut FrameTree,
    subject: BodyId,
    from: BodyId,
) -> Result<bool> {
    detach_mass(bodies, frames, subject, from)
}

fn detach_mass(
    bodies: &mut BodySet,
    frames: &mut FrameTree,
    subject: BodyId,
    from: BodyId,
) -> Result<bool> {
    if !sever_mass_link(bodies, subject, from)? {
        return Ok(false);
    }
    let subject_frame = bodies.body(subject).frame;
    if frames.frame(subject_frame).parent.is_some() {
        frames.prune(subject_frame)?;
    }
    let node = frames.frame_mut(subject_frame);
    node.initialized = StateItems::NONE;
    Ok(true)
}
