//! The simulation world: registries for bodies, frames, and planets.

use std::collections::HashMap;

use dyn_body::BodySet;
use dyn_frames::FrameTree;
use dyn_types::{BodyId, DynError, FrameId, PlanetId, Result, StateItems};

/// A registered planet: a named gravitational center with an inertial
/// frame and a rotating body-fixed frame.
///
/// Gravity-field evaluation and ephemerides are external services; the
/// scheduler only needs the frames and the constants that locate
/// derived frames (NED, LVLH, orbital-element references).
#[derive(Debug, Clone)]
pub struct Planet {
    /// Planet name, unique in the registry.
    pub name: String,
    /// Gravitational parameter μ = GM (m³/s²).
    pub mu: f64,
    /// Mean equatorial radius (m), used by NED geodesy.
    pub equatorial_radius: f64,
    /// Planet-centered inertial frame.
    pub inertial_frame: FrameId,
    /// Planet-centered, planet-fixed (rotating) frame.
    pub fixed_frame: FrameId,
}

/// The arena of planets.
#[derive(Debug, Default)]
pub struct PlanetSet {
    planets: Vec<Planet>,
    by_name: HashMap<String, PlanetId>,
}

impl PlanetSet {
    /// Look up a planet by name. Miss returns `None`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<PlanetId> {
        self.by_name.get(name).copied()
    }

    /// Immutable access to a planet.
    #[must_use]
    pub fn planet(&self, id: PlanetId) -> &Planet {
        &self.planets[id.index()]
    }
}

/// All shared simulation state the actions operate on.
#[derive(Debug, Default)]
pub struct World {
    /// The body registry and mass tree.
    pub bodies: BodySet,
    /// The reference-frame tree.
    pub frames: FrameTree,
    /// The planet registry.
    pub planets: PlanetSet,
}

impl World {
    /// An empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root inertial frame.
    ///
    /// A root frame's state is its own origin, so all four state items
    /// are trivially valid from the start.
    pub fn add_root_frame(&mut self, name: &str) -> Result<FrameId> {
        let id = self.frames.add_frame(name, None)?;
        self.frames
            .frame_mut(id)
            .initialized
            .insert(StateItems::POS_VEL_ATT_RATE);
        Ok(id)
    }

    /// Register a mass-only body.
    pub fn add_mass_body(&mut self, name: &str) -> Result<BodyId> {
        self.bodies.add_mass_body(&mut self.frames, name)
    }

    /// Register a dynamics-capable body integrating in the named frame.
    pub fn add_dyn_body(&mut self, name: &str, integ_frame: &str) -> Result<BodyId> {
        let frame = self
            .frames
            .find(integ_frame)
            .ok_or_else(|| DynError::NullPointer {
                ident: name.into(),
                field: format!("integration frame '{integ_frame}'"),
            })?;
        self.bodies.add_dyn_body(&mut self.frames, name, frame)
    }

    /// Register a planet, creating its inertial and planet-fixed
    /// frames (`<name>.inertial`, `<name>.pfix`).
    ///
    /// Both frames come out fully initialized: their states are
    /// maintained by the ephemeris service, not by actions.
    pub fn add_planet(&mut self, name: &str, mu: f64, equatorial_radius: f64) -> Result<PlanetId> {
        if self.planets.by_name.contains_key(name) {
            return Err(DynError::DuplicateEntry { name: name.into() });
        }
        let inertial = self.frames.add_frame(format!("{name}.inertial"), None)?;
        let fixed = self.frames.add_frame(format!("{name}.pfix"), None)?;
        self.frames.graft(fixed, inertial)?;
        for frame in [inertial, fixed] {
            self.frames
                .frame_mut(frame)
                .initialized
                .insert(StateItems::POS_VEL_ATT_RATE);
        }
        let id = PlanetId::new(self.planets.planets.len());
        self.planets.by_name.insert(name.into(), id);
        self.planets.planets.push(Planet {
            name: name.into(),
            mu,
            equatorial_radius,
            inertial_frame: inertial,
            fixed_frame: fixed,
        });
        Ok(id)
    }

    /// Look up a body by name. Miss returns `None`.
    #[must_use]
    pub fn find_body(&self, name: &str) -> Option<BodyId> {
        self.bodies.find(name)
    }

    /// Look up a frame by name. Miss returns `None`.
    #[must_use]
    pub fn find_frame(&self, name: &str) -> Option<FrameId> {
        self.frames.find(name)
    }

    /// Look up a planet by name. Miss returns `None`.
    #[must_use]
    pub fn find_planet(&self, name: &str) -> Option<PlanetId> {
        self.planets.find(name)
    }
}
