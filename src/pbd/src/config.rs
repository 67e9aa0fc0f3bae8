use serde::{Deserialize, Serialize};

use crate::V3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
	pub substeps: usize,
	pub gravity: V3,
	pub damping: f32,
	pub ground_height: f32,
	pub frame_dt: f32,
	pub particle_radius: f32,
	pub max_particle_count: usize,
	pub max_entity_count: usize,
}

impl Default for SimConfig {
	fn default() -> Self {
		Self {
			substeps: 20,
			gravity: V3::new(0., 0., -9.8),
			damping: 0.999,
			ground_height: 0.0,
			frame_dt: 1.0 / 60.0,
			particle_radius: 1.0,
			max_particle_count: 65536,
			max_entity_count: 8192,
		}
	}
}

impl SimConfig {
	pub fn with_substeps(mut self, substeps: usize) -> Self {
		self.substeps = substeps.max(1);
		self
	}

	pub fn with_gravity(mut self, gravity: V3) -> Self {
		self.gravity = gravity;
		self
	}

	pub fn with_damping(mut self, damping: f32) -> Self {
		self.damping = damping;
		self
	}

	pub fn with_ground_height(mut self, z: f32) -> Self {
		self.ground_height = z;
		self
	}

	pub fn with_frame_dt(mut self, dt: f32) -> Self {
		self.frame_dt = dt;
		self
	}

	pub fn with_particle_radius(mut self, r: f32) -> Self {
		self.particle_radius = r;
		self
	}

	pub fn with_capacity(mut self, particles: usize, entities: usize) -> Self {
		self.max_particle_count = particles;
		self.max_entity_count = entities;
		self
	}

	pub fn sub_dt(&self, dt: f32) -> f32 {
		dt / self.substeps.max(1) as f32
	}
}
