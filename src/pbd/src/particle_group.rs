use fnv::FnvHashMap;

use crate::config::SimConfig;
use crate::constraint::distance::DistanceConstraint;
use crate::constraint::volume::VolumeConstraint;
use crate::constraint::{max_residual, solve_all, Constraint};
use crate::error::{PbdError, Result};
use crate::particle::Particle;
use crate::particle_pool::ParticleRange;
use crate::V3;

/// Step parameters shared by every group in one frame.
#[derive(Clone, Copy, Debug)]
pub struct StepParams {
	pub sub_dt: f32,
	pub substeps: usize,
	pub gravity: V3,
	pub damping: f32,
	pub ground: f32,
}

impl StepParams {
	pub fn new(config: &SimConfig, dt: f32) -> Self {
		Self {
			sub_dt: config.sub_dt(dt),
			substeps: config.substeps.max(1),
			gravity: config.gravity,
			damping: config.damping,
			ground: config.ground_height,
		}
	}

}

/// One body's view over its pool range plus its constraints. Constraint
/// indices are offsets local to `range`.
#[derive(Clone, Debug)]
pub struct ParticleGroup {
	range: ParticleRange,
	distance_constraints: Vec<DistanceConstraint>,
	distance_capacity: usize,
	volume_constraints: Vec<VolumeConstraint>,
	volume_capacity: usize,
	inv_distance_stiffness: f32,
}

impl ParticleGroup {
	pub fn new(
		range: ParticleRange,
		distance_capacity: usize,
		volume_capacity: usize,
		inv_distance_stiffness: f32,
	) -> Self {
		Self {
			range,
			distance_constraints: Vec::with_capacity(distance_capacity),
			distance_capacity,
			volume_constraints: Vec::with_capacity(volume_capacity),
			volume_capacity,
			inv_distance_stiffness,
		}
	}

	pub fn range(&self) -> ParticleRange {
		self.range
	}

	pub fn len(&self) -> usize {
		self.range.count
	}

	pub fn is_empty(&self) -> bool {
		self.range.count == 0
	}

	pub fn inv_distance_stiffness(&self) -> f32 {
		self.inv_distance_stiffness
	}

	pub fn distance_constraints(&self) -> &[DistanceConstraint] {
		&self.distance_constraints
	}

	pub fn volume_constraints(&self) -> &[VolumeConstraint] {
		&self.volume_constraints
	}

	fn check_index(&self, index: usize) -> Result<()> {
		if self.range.contains_local(index) {
			Ok(())
		} else {
			Err(PbdError::IndexOutOfRange {
				index,
				count: self.range.count,
			})
		}
	}

	/// Adds the edge `p1 p2` unless it exists in either order. Returns
	/// whether a constraint was added.
	pub fn add_distance_constraint(
		&mut self,
		ps: &[Particle],
		p1: usize,
		p2: usize,
	) -> Result<bool> {
		self.check_index(p1)?;
		self.check_index(p2)?;
		if self.distance_constraints.iter().any(|c| c.connects(p1, p2)) {
			return Ok(false);
		}
		if self.distance_constraints.len() >= self.distance_capacity {
			return Err(PbdError::ConstraintCapacity {
				kind: "distance",
				capacity: self.distance_capacity,
			});
		}
		self.distance_constraints
			.push(DistanceConstraint::new(ps, p1, p2));
		Ok(true)
	}

	pub fn add_volume_constraint(
		&mut self,
		ps: &[Particle],
		top: usize,
		bottom: [usize; 3],
	) -> Result<()> {
		let ids = [top, bottom[0], bottom[1], bottom[2]];
		for id in ids {
			self.check_index(id)?;
		}
		if self.volume_constraints.len() >= self.volume_capacity {
			return Err(PbdError::ConstraintCapacity {
				kind: "volume",
				capacity: self.volume_capacity,
			});
		}
		self.volume_constraints.push(VolumeConstraint::new(ps, ids)?);
		Ok(())
	}

	/// Runs one frame: `params.substeps` rounds of predict, distance pass,
	/// volume pass and velocity update. There is no convergence check.
	pub fn step_frame(&self, ps: &mut [Particle], params: &StepParams) {
		debug_assert_eq!(ps.len(), self.range.count);
		for _ in 0..params.substeps {
			self.substep(ps, params);
		}
	}

	pub fn substep(&self, ps: &mut [Particle], params: &StepParams) {
		let t = params.sub_dt;
		for p in ps.iter_mut() {
			p.predict(t, params.gravity, params.damping, params.ground);
		}
		let compliance_t = self.inv_distance_stiffness / (t * t);
		solve_all(&self.distance_constraints, ps, compliance_t);
		solve_all(&self.volume_constraints, ps, 0.0);
		for p in ps.iter_mut() {
			p.reconcile(t);
		}
	}

	/// Largest distance and volume residuals.
	pub fn max_residuals(&self, ps: &[Particle]) -> (f32, f32) {
		(
			max_residual(&self.distance_constraints, ps),
			max_residual(&self.volume_constraints, ps),
		)
	}

	pub fn cells(&self) -> Vec<[usize; 4]> {
		self.volume_constraints
			.iter()
			.map(|c| {
				let ids = c.indices();
				[ids[0], ids[1], ids[2], ids[3]]
			})
			.collect()
	}

	/// Triangles that belong to exactly one cell, i.e. the skin of the body.
	pub fn surface_faces(&self) -> Vec<[usize; 3]> {
		let mut count: FnvHashMap<[usize; 3], ([usize; 3], usize)> =
			FnvHashMap::default();
		let mut order = vec![];
		for [a, b, c, d] in self.cells() {
			for face in [[a, b, c], [a, c, d], [a, d, b], [b, d, c]] {
				let mut key = face;
				key.sort_unstable();
				let e = count.entry(key).or_insert_with(|| {
					order.push(key);
					(face, 0)
				});
				e.1 += 1;
			}
		}
		order
			.into_iter()
			.filter_map(|key| {
				let (face, n) = count[&key];
				if n == 1 {
					Some(face)
				} else {
					None
				}
			})
			.collect()
	}
}
