//! 2-D rectilinear waveguide mesh (a struck membrane).
//!
//! Every junction scatters the four incoming waves equally. Two wave buffers
//! alternate between passes: one is read while the other is written.

#[allow(unused_imports)]
use num_traits::float::Float;

use super::{velocity_gain, PhysicalModel};
use crate::exciter::{Exciter, ExciterKind};
use crate::utils::units::sanitize;

pub const GRID_SIZE: usize = 7;

const MESH_SIZE: usize = GRID_SIZE + 1;
const STRIKE_X: usize = 2;
const STRIKE_Y: usize = 4;
const PICKUP_X: usize = 2;
const PICKUP_Y: usize = 2;

/// Junction scattering gain, 2 / number of neighbours.
const SCATTERING: f32 = 0.5;

const DEFAULT_BOUNDARY: f32 = -0.99;
const SILENCE_THRESHOLD: f32 = 1.0e-6;

#[derive(Debug, Default, Clone, Copy)]
struct Junction {
    velocity: f32,
    // Incoming waves per buffer.
    north: [f32; 2],
    south: [f32; 2],
    east: [f32; 2],
    west: [f32; 2],
}

#[derive(Debug, Clone)]
pub struct Mesh {
    junctions: [[Junction; MESH_SIZE]; MESH_SIZE],
    tock: bool,
    boundary: f32,
    exciter: Exciter,
    velocity: f32,
    active: bool,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            junctions: [[Junction::default(); MESH_SIZE]; MESH_SIZE],
            tock: false,
            boundary: DEFAULT_BOUNDARY,
            exciter: Exciter::new(),
            velocity: 0.0,
            active: false,
        }
    }

    /// Magnitude of the edge reflection, 0.0..0.99.
    pub fn set_attenuation(&mut self, attenuation: f32) {
        self.boundary = -sanitize(attenuation, 0.0, -DEFAULT_BOUNDARY, -DEFAULT_BOUNDARY);
    }

    pub fn set_exciter(&mut self, kind: ExciterKind) {
        self.exciter.set_kind(kind);
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = sanitize(velocity, 0.0, 1.0, 0.0);
    }

    pub fn pluck(&mut self) {
        self.exciter.trigger();
        self.active = true;
    }

    #[inline]
    fn pass(&mut self, excitation: f32, src: usize, dst: usize) {
        let m = &mut self.junctions;

        for x in 0..GRID_SIZE {
            for y in 0..GRID_SIZE {
                m[x][y].velocity = SCATTERING
                    * (m[x][y].east[src]
                        + m[x][y + 1].west[src]
                        + m[x][y].north[src]
                        + m[x + 1][y].south[src]);
            }
        }

        m[STRIKE_X][STRIKE_Y].velocity += excitation;

        for x in 0..GRID_SIZE {
            for y in 0..GRID_SIZE {
                let v = m[x][y].velocity;
                m[x][y + 1].east[dst] = v - m[x][y + 1].west[src];
                m[x + 1][y].north[dst] = v - m[x + 1][y].south[src];
                m[x][y].west[dst] = v - m[x][y].east[src];
                m[x][y].south[dst] = v - m[x][y].north[src];
            }
        }

        // Edges.
        let b = self.boundary;
        for x in 0..GRID_SIZE {
            m[x][0].east[dst] = b * m[x][0].west[src];
            m[x][GRID_SIZE].west[dst] = b * m[x][GRID_SIZE].east[src];
        }
        for y in 0..GRID_SIZE {
            m[0][y].north[dst] = b * m[0][y].south[src];
            m[GRID_SIZE][y].south[dst] = b * m[GRID_SIZE][y].north[src];
        }
    }
}

impl PhysicalModel for Mesh {
    fn start(&mut self) {
        self.junctions = [[Junction::default(); MESH_SIZE]; MESH_SIZE];
        self.tock = false;
        self.exciter.init();
        self.active = false;
    }

    fn stop(&mut self) {
        self.exciter.stop();
        self.active = false;
    }

    fn note_on(&mut self, velocity: f32) {
        self.set_velocity(velocity);
        self.pluck();
    }

    fn note_off(&mut self, _velocity: f32) {}

    fn is_active(&self) -> bool {
        self.active
    }

    /// The mesh has a fixed size, its pitch does not follow the note.
    fn set_frequency(&mut self, _frequency: f32) {}

    #[inline]
    fn render(&mut self, out: &mut [f32]) {
        let gain = velocity_gain(self.velocity);
        let mut peak: f32 = 0.0;

        for sample in out.iter_mut() {
            let excitation = gain * self.exciter.next();
            if self.tock {
                self.pass(excitation, 1, 0);
            } else {
                self.pass(excitation, 0, 1);
            }
            self.tock = !self.tock;

            let y = self.junctions[PICKUP_X][PICKUP_Y].velocity;
            peak = peak.max(y.abs());
            *sample = y;
        }

        if !self.exciter.is_active() && peak < SILENCE_THRESHOLD {
            self.active = false;
        }
    }
}
