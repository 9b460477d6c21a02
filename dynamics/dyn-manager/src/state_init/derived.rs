//! State-setting actions that construct their reference frame before
//! running the shared algorithm: relative to another body, from orbital
//! elements, from geodetic north-east-down, and from the
//! local-vertical/local-horizontal orbit frame.

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

use dyn_frames::{frame_state, RefFrameState};
use dyn_types::{DynError, FrameId, PlanetId, Result, StateItems};

use crate::action::{validate_name, Action, ActionIdent, ActionKind};
use crate::state_init::StateInitCore;
use crate::subject::SubjectRef;
use crate::world::World;

/// Sets the subject's state relative to another body's composite frame.
///
/// Unless the action is self-referential, the reference body's frame
/// must be fully initialized before this action runs: the reference is
/// itself in motion, so a partially-valid frame cannot anchor anything.
#[derive(Debug, Default)]
pub struct WrtBodyInit {
    /// Shared configuration. `reference_frame` is ignored; the
    /// reference is the body named below.
    pub core: StateInitCore,
    /// The body whose composite frame serves as the reference.
    pub reference_body: SubjectRef,

    self_referential: bool,
}

impl WrtBodyInit {
    /// A named, active body-relative initializer.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            core: StateInitCore::named(name),
            reference_body: SubjectRef::default(),
            self_referential: false,
        }
    }
}

impl Action for WrtBodyInit {
    fn type_label(&self) -> &'static str {
        "WrtBodyInit"
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

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.core
            .initialize_common(world, self.type_label(), StateItems::POS_VEL_ATT_RATE)?;
        let ident = self.core.ident_for(self.type_label());
        let reference =
            self.reference_body
                .resolve_body(world, &ident, "reference body")?;
        self.self_referential = Some(reference) == self.core.subject_id();
        let frame = world.bodies.body(reference).frame;
        self.core.finish_initialize(world, frame);
        Ok(())
    }

    fn is_ready(&self, world: &World) -> bool {
        if !self.core.is_ready_in(world) {
            return false;
        }
        if self.self_referential {
            return true;
        }
        let Some(reference) = self.core.reference_id() else {
            return false;
        };
        world
            .frames
            .frame(reference)
            .initialized
            .contains(StateItems::POS_VEL_ATT_RATE)
    }

    fn apply(&mut self, world: &mut World) -> Result<()> {
        let reference = required_reference(&self.core, self.type_label())?;
        self.core.apply_to_subject(world, reference)
    }

    fn report_failure(&self, world: &World) {
        self.core.report_failure_in(world, self.type_label());
    }
}

/// Classical orbital elements, angles in radians.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrbitalElements {
    /// Semi-major axis (m).
    pub semi_major_axis: f64,
    /// Eccentricity.
    pub eccentricity: f64,
    /// Inclination (rad).
    pub inclination: f64,
    /// Right ascension of the ascending node (rad).
    pub ascending_node: f64,
    /// Argument of periapsis (rad).
    pub arg_periapsis: f64,
    /// True anomaly (rad).
    pub true_anomaly: f64,
}

/// Conversion from orbital elements to planet-centered inertial
/// position and velocity. Supplied by the orbital-mechanics service.
pub trait ElementsToCartesian: std::fmt::Debug {
    /// Convert `elements` around a center with gravitational parameter
    /// `mu` (m³/s²) into inertial position (m) and velocity (m/s).
    fn to_cartesian(
        &self,
        mu: f64,
        elements: &OrbitalElements,
    ) -> Result<(Vector3<f64>, Vector3<f64>)>;
}

/// Sets the subject's position and velocity from orbital elements
/// around a named planet.
///
/// The conversion runs at apply time, so the declared items are fixed
/// at construction rather than derived from the user value fields.
#[derive(Debug)]
pub struct OrbitInit {
    /// Shared configuration; the value fields are ignored, the
    /// elements below are the input.
    pub core: StateInitCore,
    /// Name of the planet the elements are defined around.
    pub planet: String,
    /// The orbital elements.
    pub elements: OrbitalElements,

    converter: Box<dyn ElementsToCartesian>,
    planet_id: Option<PlanetId>,
}

impl OrbitInit {
    /// A named, active orbital-element initializer using `converter`.
    #[must_use]
    pub fn named(name: impl Into<String>, converter: Box<dyn ElementsToCartesian>) -> Self {
        let mut core = StateInitCore::named(name);
        core.declare(StateItems::POS_VEL);
        Self {
            core,
            planet: String::new(),
            elements: OrbitalElements::default(),
            converter,
            planet_id: None,
        }
    }
}

impl Action for OrbitInit {
    fn type_label(&self) -> &'static str {
        "OrbitInit"
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

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.core
            .initialize_common(world, self.type_label(), StateItems::POS_VEL)?;
        let ident = self.core.ident_for(self.type_label());
        let planet = resolve_planet(world, &ident, &self.planet)?;
        let inertial = world.planets.planet(planet).inertial_frame;
        self.planet_id = Some(planet);
        self.core.finish_initialize(world, inertial);
        Ok(())
    }

    fn is_ready(&self, world: &World) -> bool {
        self.core.is_ready_in(world)
    }

    fn apply(&mut self, world: &mut World) -> Result<()> {
        let ident = self.core.ident_for(self.type_label());
        let planet = self.planet_id.ok_or_else(|| DynError::NullPointer {
            ident: ident.to_string(),
            field: "planet (initialize never ran)".into(),
        })?;
        let mu = world.planets.planet(planet).mu;
        let (position, velocity) = self.converter.to_cartesian(mu, &self.elements)?;
        self.core.position = Some(position);
        self.core.velocity = Some(velocity);
        let reference = required_reference(&self.core, self.type_label())?;
        self.core.apply_to_subject(world, reference)
    }

    fn report_failure(&self, world: &World) {
        self.core.report_failure_in(world, self.type_label());
    }
}

/// Where a north-east-down frame is anchored.
#[derive(Debug, Clone)]
pub enum NedOrigin {
    /// Spherical geodetic coordinates on the planet, angles in radians,
    /// altitude in meters above the equatorial radius.
    Geodetic {
        /// Latitude (rad), positive north.
        latitude: f64,
        /// Longitude (rad), positive east.
        longitude: f64,
        /// Altitude above the equatorial radius (m).
        altitude: f64,
    },
    /// The current planet-fixed position of a named body.
    Body(String),
}

impl Default for NedOrigin {
    fn default() -> Self {
        Self::Geodetic {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
        }
    }
}

/// Sets the subject's state relative to a north-east-down frame
/// anchored on a named planet.
///
/// The NED frame is derived at apply time from the origin's
/// planet-fixed position using the spherical-planet convention, grafted
/// as a scratch frame under the planet-fixed frame for the duration of
/// the shared algorithm.
#[derive(Debug, Default)]
pub struct NedInit {
    /// Shared configuration; values are expressed in NED axes.
    pub core: StateInitCore,
    /// Name of the planet the frame is anchored on.
    pub planet: String,
    /// Where the frame's origin sits.
    pub origin: NedOrigin,

    planet_id: Option<PlanetId>,
    origin_frame: Option<FrameId>,
}

impl NedInit {
    /// A named, active north-east-down initializer.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            core: StateInitCore::named(name),
            ..Self::default()
        }
    }
}

impl Action for NedInit {
    fn type_label(&self) -> &'static str {
        "NedInit"
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

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.core
            .initialize_common(world, self.type_label(), StateItems::POS_VEL_ATT_RATE)?;
        let ident = self.core.ident_for(self.type_label());
        let planet = resolve_planet(world, &ident, &self.planet)?;
        if let NedOrigin::Body(name) = &self.origin {
            validate_name(&ident, name, "origin", "origin body")?;
            let body = world.find_body(name).ok_or_else(|| DynError::NullPointer {
                ident: ident.to_string(),
                field: format!("origin body '{name}'"),
            })?;
            self.origin_frame = Some(world.bodies.body(body).frame);
        }
        let fixed = world.planets.planet(planet).fixed_frame;
        self.planet_id = Some(planet);
        self.core.finish_initialize(world, fixed);
        Ok(())
    }

    fn is_ready(&self, world: &World) -> bool {
        if !self.core.is_ready_in(world) {
            return false;
        }
        match self.origin_frame {
            None => true,
            Some(frame) => world
                .frames
                .frame(frame)
                .initialized
                .contains(StateItems::POSITION),
        }
    }

    fn apply(&mut self, world: &mut World) -> Result<()> {
        let ident = self.core.ident_for(self.type_label());
        let planet = self.planet_id.ok_or_else(|| DynError::NullPointer {
            ident: ident.to_string(),
            field: "planet (initialize never ran)".into(),
        })?;
        let World {
            bodies,
            frames,
            planets,
        } = world;
        let planet = planets.planet(planet);
        let fixed = planet.fixed_frame;

        let origin = match (&self.origin, self.origin_frame) {
            (NedOrigin::Geodetic {
                latitude,
                longitude,
                altitude,
            }, _) => {
                let r = planet.equatorial_radius + altitude;
                Vector3::new(
                    r * latitude.cos() * longitude.cos(),
                    r * latitude.cos() * longitude.sin(),
                    r * latitude.sin(),
                )
            }
            (NedOrigin::Body(_), Some(frame)) => frames.state_wrt(frame, fixed)?.position,
            (NedOrigin::Body(_), None) => {
                return Err(DynError::NullPointer {
                    ident: ident.to_string(),
                    field: "origin body frame (initialize never ran)".into(),
                })
            }
        };
        if origin.norm() == 0.0 {
            return Err(DynError::IllegalValue {
                ident: ident.to_string(),
                detail: "north-east-down frame at the planet center is undefined".into(),
            });
        }

        let ned = ned_state(&origin);
        let core = &mut self.core;
        let state = frames.with_scratch(fixed, ned, |tree, scratch| {
            core.compute_final_state(tree, bodies, scratch)
        })?;
        core.push_state(frames, bodies, &state)
    }

    fn report_failure(&self, world: &World) {
        self.core.report_failure_in(world, self.type_label());
    }
}

/// The NED frame state relative to the planet-fixed frame for an origin
/// at `position` (planet-fixed axes), spherical-planet convention.
fn ned_state(position: &Vector3<f64>) -> RefFrameState {
    let latitude = (position.z / position.norm()).asin();
    let longitude = position.y.atan2(position.x);
    let (slat, clat) = (latitude.sin(), latitude.cos());
    let (slon, clon) = (longitude.sin(), longitude.cos());
    // Rows rotate planet-fixed vectors into north/east/down axes.
    let matrix = Matrix3::new(
        -slat * clon, -slat * slon, clat, //
        -slon, clon, 0.0, //
        -clat * clon, -clat * slon, -slat,
    );
    let attitude = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(matrix));
    // Fixed to the rotating planet: no velocity or rate of its own.
    frame_state(*position, Vector3::zeros(), attitude, Vector3::zeros())
}

/// Sets the subject's state relative to the local-vertical/
/// local-horizontal frame of an orbiting body.
///
/// LVLH convention: z toward the planet center, y along the negative
/// orbital angular momentum, x completing the triad (near the velocity
/// direction for a near-circular orbit). The frame rotates at the
/// orbital rate.
#[derive(Debug, Default)]
pub struct LvlhInit {
    /// Shared configuration; values are expressed in LVLH axes.
    pub core: StateInitCore,
    /// Name of the planet the orbit is around.
    pub planet: String,
    /// The body whose orbit defines the frame; the subject itself when
    /// unset.
    pub orbit_body: SubjectRef,

    planet_id: Option<PlanetId>,
    orbit_frame: Option<FrameId>,
    self_referential: bool,
}

impl LvlhInit {
    /// A named, active local-vertical/local-horizontal initializer.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            core: StateInitCore::named(name),
            ..Self::default()
        }
    }
}

impl Action for LvlhInit {
    fn type_label(&self) -> &'static str {
        "LvlhInit"
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

    fn initialize(&mut self, world: &mut World) -> Result<()> {
        self.core
            .initialize_common(world, self.type_label(), StateItems::POS_VEL_ATT_RATE)?;
        let ident = self.core.ident_for(self.type_label());
        let planet = resolve_planet(world, &ident, &self.planet)?;
        let orbit_body = if self.orbit_body.is_set() {
            self.orbit_body.resolve_body(world, &ident, "orbit body")?
        } else {
            self.core.subject_id().ok_or_else(|| DynError::NullPointer {
                ident: ident.to_string(),
                field: "subject".into(),
            })?
        };
        self.self_referential = Some(orbit_body) == self.core.subject_id();
        self.orbit_frame = Some(world.bodies.body(orbit_body).frame);
        let inertial = world.planets.planet(planet).inertial_frame;
        self.planet_id = Some(planet);
        self.core.finish_initialize(world, inertial);
        Ok(())
    }

    fn is_ready(&self, world: &World) -> bool {
        if !self.core.is_ready_in(world) {
            return false;
        }
        let Some(frame) = self.orbit_frame else {
            return false;
        };
        let needed = if self.self_referential {
            StateItems::POS_VEL
        } else {
            StateItems::POS_VEL_ATT_RATE
        };
        world.frames.frame(frame).initialized.contains(needed)
    }

    fn apply(&mut self, world: &mut World) -> Result<()> {
        let ident = self.core.ident_for(self.type_label());
        let planet = self.planet_id.ok_or_else(|| DynError::NullPointer {
            ident: ident.to_string(),
            field: "planet (initialize never ran)".into(),
        })?;
        let orbit_frame = self.orbit_frame.ok_or_else(|| DynError::NullPointer {
            ident: ident.to_string(),
            field: "orbit body frame (initialize never ran)".into(),
        })?;
        let World {
            bodies,
            frames,
            planets,
        } = world;
        let inertial = planets.planet(planet).inertial_frame;

        let orbit = frames.state_wrt(orbit_frame, inertial)?;
        let lvlh = lvlh_state(&ident, &orbit)?;
        let core = &mut self.core;
        let state = frames.with_scratch(inertial, lvlh, |tree, scratch| {
            core.compute_final_state(tree, bodies, scratch)
        })?;
        core.push_state(frames, bodies, &state)
    }

    fn report_failure(&self, world: &World) {
        self.core.report_failure_in(world, self.type_label());
    }
}

/// The LVLH frame state relative to the planet inertial frame for a
/// body with inertial state `orbit`.
fn lvlh_state(ident: &ActionIdent, orbit: &RefFrameState) -> Result<RefFrameState> {
    let r = orbit.position;
    let v = orbit.velocity;
    let h = r.cross(&v);
    if r.norm() == 0.0 || h.norm() < 1e-9 {
        return Err(DynError::IllegalValue {
            ident: ident.to_string(),
            detail: "degenerate orbit (radial or zero motion) has no orbit frame".into(),
        });
    }
    let z = -r.normalize();
    let y = -h.normalize();
    let x = y.cross(&z);
    // Rows rotate inertial vectors into LVLH axes.
    let matrix = Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]);
    let attitude = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(matrix));
    // The frame pivots about the orbit normal at the orbital rate.
    let omega = h / r.norm_squared();
    Ok(frame_state(r, v, attitude, attitude * omega))
}

fn resolve_planet(world: &World, ident: &ActionIdent, name: &str) -> Result<PlanetId> {
    validate_name(ident, name, "planet", "planet")?;
    world.find_planet(name).ok_or_else(|| DynError::NullPointer {
        ident: ident.to_string(),
        field: format!("planet '{name}'"),
    })
}

fn required_reference(core: &StateInitCore, type_label: &'static str) -> Result<FrameId> {
    core.reference_id().ok_or_else(|| DynError::NullPointer {
        ident: core.ident_for(type_label).to_string(),
        field: "reference frame (initialize never ran)".into(),
    })
}
