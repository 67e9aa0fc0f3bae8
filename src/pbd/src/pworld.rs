use crate::config::SimConfig;
use crate::entity::{Entity, EntityFlags, EntityId, EntityKind, EntityRegistry};
use crate::error::Result;
use crate::particle::Particle;
use crate::particle_group::{ParticleGroup, StepParams};
use crate::particle_pool::ParticlePool;
use crate::physical_model::PhysicalModel;
use crate::{V3, V3d};
use protocol::pr_model::{PrBody, PrModel};

pub struct PWorld {
	config: SimConfig,
	pool: ParticlePool,
	registry: EntityRegistry,
	frame: u64,
}

impl Default for PWorld {
	fn default() -> Self {
		Self::new(SimConfig::default())
	}
}

impl PWorld {
	pub fn new(config: SimConfig) -> Self {
		Self {
			pool: ParticlePool::new(config.max_particle_count),
			registry: EntityRegistry::new(config.max_entity_count),
			config,
			frame: 0,
		}
	}

	pub fn config(&self) -> &SimConfig {
		&self.config
	}

	pub fn pool(&self) -> &ParticlePool {
		&self.pool
	}

	pub fn registry(&self) -> &EntityRegistry {
		&self.registry
	}

	pub fn frame(&self) -> u64 {
		self.frame
	}

	pub fn entity(&self, id: EntityId) -> Option<&Entity> {
		self.registry.get(id)
	}

	pub fn particles(&self, id: EntityId) -> Option<&[Particle]> {
		let group = self.registry.get(id)?.group()?;
		Some(self.pool.particles(group.range()))
	}

	pub fn particles_mut(&mut self, id: EntityId) -> Option<&mut [Particle]> {
		let range = self.registry.get(id)?.group()?.range();
		Some(self.pool.particles_mut(range))
	}

	/// Scene demo: a floor, one rigid-edged tetrahedron and two bipyramids
	/// of different softness.
	pub fn init_demo(&mut self) -> Result<()> {
		let flags = EntityFlags::MOVABLE | EntityFlags::COLLIDES;
		self.add_floor(
			V3::zeros(),
			V3::new(100., 100., 1.),
			V3::new(1.0, 1.0, 1.0),
		)?;
		self.add_pbd_tetrahedron(
			V3d::new(0., 2., 14.),
			[
				V3d::new(-4., 0., 5.),
				V3d::new(4., 0., 12.),
				V3d::new(0., 4., 8.),
			],
			0.0,
			1.0 / 10.0,
			V3::new(0., 0.8, 0.2),
			flags,
		)?;
		self.add_pbd_bipyramid(
			V3d::new(12., 10., 14.),
			[
				V3d::new(6., 10., 10.),
				V3d::new(13., 9., 10.),
				V3d::new(10., 14., 10.),
			],
			V3d::new(10., 12., 6.),
			0.0006,
			1.0 / 10.0,
			V3::new(0., 0.2, 1.),
			flags,
		)?;
		self.add_pbd_bipyramid(
			V3d::new(-10., -8., 14.),
			[
				V3d::new(-14., -10., 7.),
				V3d::new(-6., -10., 9.),
				V3d::new(-10., -6., 10.),
			],
			V3d::new(-11., -9., 6.),
			0.01,
			1.0 / 10.0,
			V3::new(0., 0.2, 1.),
			flags,
		)?;
		Ok(())
	}

	pub fn add_floor(&mut self, center: V3, dim: V3, color: V3) -> Result<EntityId> {
		let id = self.registry.add_entity(
			EntityKind::Floor { center, dim },
			color,
			EntityFlags::COLLIDES,
		)?;
		log::info!("add floor {:?} at {:?}", id, center);
		Ok(id)
	}

	pub fn add_cube(
		&mut self,
		center: V3d,
		dim: V3d,
		imass: f32,
		color: V3,
		flags: EntityFlags,
	) -> Result<EntityId> {
		let model =
			PhysicalModel::new_lattice(center, dim, self.config.particle_radius);
		self.registry.ensure_room()?;
		let group = model.build(&mut self.pool, imass, 0.0, self.config.particle_radius)?;
		let id = self
			.registry
			.add_entity(EntityKind::Cube { group }, color, flags)?;
		log::info!("add cube {:?}: {} particles", id, model.vertices.len());
		Ok(id)
	}

	pub fn add_pbd_tetrahedron(
		&mut self,
		top: V3d,
		bottom: [V3d; 3],
		inv_stiffness: f32,
		imass: f32,
		color: V3,
		flags: EntityFlags,
	) -> Result<EntityId> {
		let model = PhysicalModel::new_tetrahedron(top, bottom);
		self.add_model(&model, inv_stiffness, imass, color, flags)
	}

	#[allow(clippy::too_many_arguments)]
	pub fn add_pbd_bipyramid(
		&mut self,
		top0: V3d,
		bottom: [V3d; 3],
		top1: V3d,
		inv_stiffness: f32,
		imass: f32,
		color: V3,
		flags: EntityFlags,
	) -> Result<EntityId> {
		let model = PhysicalModel::new_bipyramid(top0, bottom, top1);
		self.add_model(&model, inv_stiffness, imass, color, flags)
	}

	pub fn add_pbd_mesh(
		&mut self,
		points: &[V3d],
		inv_stiffness: f32,
		imass: f32,
		color: V3,
		flags: EntityFlags,
	) -> Result<EntityId> {
		let model = PhysicalModel::new_mesh(points)?;
		self.add_model(&model, inv_stiffness, imass, color, flags)
	}

	/// Materializes `model` as a soft body. Registry room is checked before
	/// any particle is allocated.
	pub fn add_model(
		&mut self,
		model: &PhysicalModel,
		inv_stiffness: f32,
		imass: f32,
		color: V3,
		flags: EntityFlags,
	) -> Result<EntityId> {
		self.registry.ensure_room()?;
		let group = model.build(
			&mut self.pool,
			imass,
			inv_stiffness,
			self.config.particle_radius,
		)?;
		let (dc, vc) = (
			group.distance_constraints().len(),
			group.volume_constraints().len(),
		);
		let id = self
			.registry
			.add_entity(EntityKind::SoftBody { group }, color, flags)?;
		log::info!(
			"add soft body {:?}: {} particles, {} distance, {} volume",
			id,
			model.vertices.len(),
			dc,
			vc,
		);
		Ok(id)
	}

	// Pairs every simulated group with its own slice of the pool. Groups are
	// allocated in registry order, so the ranges ascend and never overlap.
	fn jobs(&mut self) -> Vec<(&ParticleGroup, &mut [Particle])> {
		let mut jobs = vec![];
		let mut rest = self.pool.as_mut_slice();
		let mut offset = 0;
		for (_, entity) in self.registry.iter() {
			let Some(group) = entity.simulated_group() else {
				continue;
			};
			let range = group.range();
			let tail = std::mem::take(&mut rest);
			let (_, tail) = tail.split_at_mut(range.start - offset);
			let (ps, tail) = tail.split_at_mut(range.count);
			rest = tail;
			offset = range.end();
			jobs.push((group, ps));
		}
		jobs
	}

	#[cfg(feature = "parallel")]
	fn step_groups(&mut self, params: StepParams) {
		use rayon::prelude::*;
		self.jobs()
			.into_par_iter()
			.for_each(|(group, ps)| group.step_frame(ps, &params));
	}

	#[cfg(not(feature = "parallel"))]
	fn step_groups(&mut self, params: StepParams) {
		for (group, ps) in self.jobs() {
			group.step_frame(ps, &params);
		}
	}

	/// Advances every soft body by one frame of length `dt` seconds.
	pub fn update_frame(&mut self, dt: f32) {
		if dt == 0f32 {
			return;
		}
		let params = StepParams::new(&self.config, dt);
		self.step_groups(params);
		self.frame += 1;
		log::debug!("frame {} dt {}", self.frame, dt);
	}

	pub fn run(&mut self, frames: usize) {
		for _ in 0..frames {
			self.update_frame(self.config.frame_dt);
		}
	}

	pub fn pr_model(&self) -> PrModel {
		let bodies = self
			.registry
			.iter()
			.filter(|(_, e)| e.is_soft_body())
			.filter_map(|(id, e)| {
				let group = e.group()?;
				Some(PrBody {
					entity: id.0,
					color: [e.color[0], e.color[1], e.color[2]],
					particles: self
						.pool
						.particles(group.range())
						.iter()
						.map(|p| p.render())
						.collect(),
					cells: group.cells(),
					faces: group.surface_faces(),
				})
			})
			.collect();
		PrModel { bodies }
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::error::PbdError;

	fn flags() -> EntityFlags {
		EntityFlags::MOVABLE | EntityFlags::COLLIDES
	}

	fn tetra(world: &mut PWorld, z: f64, flags: EntityFlags) -> Result<EntityId> {
		world.add_pbd_tetrahedron(
			V3d::new(0., 0., z + 2.),
			[
				V3d::new(-1., -1., z),
				V3d::new(1., -1., z),
				V3d::new(0., 1., z),
			],
			0.0,
			0.1,
			V3::new(1., 0., 0.),
			flags,
		)
	}

	#[test]
	fn test_demo_scene() {
		let mut world = PWorld::default();
		world.init_demo().unwrap();
		assert_eq!(world.registry().len(), 4);
		assert_eq!(world.pool().len(), 4 + 5 + 5);
		let model = world.pr_model();
		assert_eq!(model.bodies.len(), 3);
		assert_eq!(model.cell_len(), 1 + 2 + 2);
		assert_eq!(model.bodies[0].faces.len(), 4);
		assert_eq!(model.bodies[1].faces.len(), 6);
		world.run(30);
		assert_eq!(world.frame(), 30);
		for (_, e) in world.registry().iter() {
			if let Some(group) = e.group() {
				for p in world.pool().particles(group.range()) {
					assert!(p.pos[2] >= 0.0);
					assert!(p.pos.iter().all(|x| x.is_finite()));
				}
			}
		}
	}

	#[test]
	fn test_zero_dt() {
		let mut world = PWorld::default();
		let id = tetra(&mut world, 5.0, flags()).unwrap();
		let before = world.particles(id).unwrap().to_vec();
		world.update_frame(0.0);
		assert_eq!(world.frame(), 0);
		assert_eq!(world.particles(id).unwrap(), &before[..]);
	}

	#[test]
	fn test_flags_do_not_gate_stepping() {
		let mut world = PWorld::default();
		world
			.add_floor(V3::zeros(), V3::new(10., 10., 1.), V3::zeros())
			.unwrap();
		let cube = world
			.add_cube(V3d::new(0., 0., 20.), V3d::new(4., 4., 4.), 0.1, V3::zeros(), flags())
			.unwrap();
		let ids: Vec<EntityId> = [
			EntityFlags::empty(),
			EntityFlags::MOVABLE,
			EntityFlags::COLLIDES,
			flags(),
		]
		.into_iter()
		.map(|f| tetra(&mut world, 0.5, f).unwrap())
		.collect();
		let cube_before = world.particles(cube).unwrap().to_vec();
		world.run(120);
		assert_eq!(world.particles(cube).unwrap(), &cube_before[..]);
		let reference = world.particles(ids[3]).unwrap().to_vec();
		for id in ids.iter() {
			let ps = world.particles(*id).unwrap();
			assert_eq!(ps, &reference[..]);
			assert!(ps.iter().all(|p| p.pos[2] > -1e-3));
			assert!(ps[0].pos[2] < 2.5);
		}
	}

	#[test]
	fn test_raised_ground() {
		let config = SimConfig::default()
			.with_ground_height(2.0)
			.with_gravity(V3::new(0., 0., -20.))
			.with_damping(0.99)
			.with_frame_dt(1.0 / 30.0)
			.with_particle_radius(0.5);
		let mut world = PWorld::new(config);
		let id = tetra(&mut world, 3.0, flags()).unwrap();
		assert!(world.particles(id).unwrap().iter().all(|p| p.radius == 0.5));
		world.run(120);
		let ps = world.particles(id).unwrap();
		for p in ps {
			assert!(p.pos[2] > 2.0 - 1e-3, "{:?}", p.pos);
		}
		let min = ps.iter().map(|p| p.pos[2]).fold(f32::INFINITY, f32::min);
		assert!(min < 2.0 + 1e-3);
	}

	#[test]
	fn test_rests_on_ground() {
		let mut world = PWorld::default();
		let id = tetra(&mut world, 0.5, flags()).unwrap();
		world.run(120);
		// projections after the clamp may leave a particle a hair below
		for p in world.particles(id).unwrap() {
			assert!(p.pos[2] > -1e-3);
		}
		let min = world
			.particles(id)
			.unwrap()
			.iter()
			.map(|p| p.pos[2])
			.fold(f32::INFINITY, f32::min);
		assert!(min < 1e-3);
	}

	#[test]
	fn test_registry_checked_first() {
		let config = SimConfig::default().with_capacity(64, 1);
		let mut world = PWorld::new(config);
		tetra(&mut world, 5.0, flags()).unwrap();
		let err = tetra(&mut world, 5.0, flags()).unwrap_err();
		assert_eq!(err, PbdError::RegistryFull { capacity: 1 });
		assert_eq!(world.pool().len(), 4);
	}

	#[test]
	fn test_bodies_do_not_interact() {
		let mut a = PWorld::default();
		let id = tetra(&mut a, 5.0, flags()).unwrap();
		let mut b = PWorld::default();
		tetra(&mut b, 3.0, flags()).unwrap();
		let id_b = tetra(&mut b, 5.0, flags()).unwrap();
		a.run(10);
		b.run(10);
		assert_eq!(a.particles(id).unwrap(), b.particles(id_b).unwrap());
	}
}
