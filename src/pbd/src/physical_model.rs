use crate::error::{PbdError, Result};
use crate::particle_group::ParticleGroup;
use crate::particle_pool::ParticlePool;
use crate::tetrahedralize::tetrahedralize;
use crate::V3d;

/// Reference topology of a body before it is placed in the pool.
#[derive(Clone, Debug, Default)]
pub struct PhysicalModel {
	pub vertices: Vec<V3d>,
	pub edges: Vec<[usize; 2]>,
	// apex, then the three base vertices
	pub cells: Vec<[usize; 4]>,
}

fn cell_edges(cell: [usize; 4]) -> [[usize; 2]; 6] {
	let [a, b, c, d] = cell;
	[[a, b], [a, c], [b, c], [a, d], [b, d], [c, d]]
}

impl PhysicalModel {
	// bottom three counter clockwise
	pub fn new_tetrahedron(top: V3d, bottom: [V3d; 3]) -> Self {
		let cell = [0, 1, 2, 3];
		Self {
			vertices: vec![top, bottom[0], bottom[1], bottom[2]],
			edges: cell_edges(cell).to_vec(),
			cells: vec![cell],
		}
	}

	/// Two tetrahedra glued on the equatorial triangle `bottom`; `top0` and
	/// `top1` sit on either side of it.
	pub fn new_bipyramid(top0: V3d, bottom: [V3d; 3], top1: V3d) -> Self {
		let mut edges = cell_edges([0, 1, 2, 3]).to_vec();
		edges.extend([[1, 4], [2, 4], [3, 4]]);
		Self {
			vertices: vec![top0, bottom[0], bottom[1], bottom[2], top1],
			edges,
			cells: vec![[0, 1, 2, 3], [1, 2, 3, 4]],
		}
	}

	/// Particles on a regular lattice filling `dim`, spaced one diameter
	/// apart and centred on `center`. No constraints.
	pub fn new_lattice(center: V3d, dim: V3d, radius: f32) -> Self {
		let diameter = 2.0 * radius as f64;
		let count = dim.map(|d| ((d / diameter).ceil() as usize).max(1));
		let left_bottom = center
			- diameter
				* V3d::new(
					(count[0] - 1) as f64 / 2.0,
					(count[1] - 1) as f64 / 2.0,
					(count[2] - 1) as f64 / 2.0,
				);
		let mut vertices = Vec::with_capacity(count[0] * count[1] * count[2]);
		for z in 0..count[2] {
			for y in 0..count[1] {
				for x in 0..count[0] {
					vertices.push(
						left_bottom
							+ diameter * V3d::new(x as f64, y as f64, z as f64),
					);
				}
			}
		}
		Self {
			vertices,
			edges: vec![],
			cells: vec![],
		}
	}

	pub fn new_mesh(points: &[V3d]) -> Result<Self> {
		let mesh = tetrahedralize(points)?;
		let edges = mesh.cells.iter().flat_map(|c| cell_edges(*c)).collect();
		Ok(Self {
			vertices: mesh.vertices,
			edges,
			cells: mesh.cells,
		})
	}

	/// Allocates the vertices as one contiguous group and derives the
	/// constraints from their initial placement. Every particle gets
	/// `vertex count * imass`, so the body's total mass does not depend on
	/// how finely it is sampled.
	pub fn build(
		&self,
		pool: &mut ParticlePool,
		imass: f32,
		inv_stiffness: f32,
		radius: f32,
	) -> Result<ParticleGroup> {
		if pool.remaining() < self.vertices.len() {
			return Err(PbdError::PoolExhausted {
				capacity: pool.capacity(),
			});
		}
		let particle_imass = self.vertices.len() as f32 * imass;
		let mut session = pool.begin_group();
		for v in self.vertices.iter() {
			session.allocate(*v, radius, particle_imass)?;
		}
		// an early return drops the session, which releases the particles
		let mut group = ParticleGroup::new(
			session.range(),
			self.edges.len(),
			self.cells.len(),
			inv_stiffness,
		);
		let ps = session.particles();
		for [p1, p2] in self.edges.iter() {
			group.add_distance_constraint(ps, *p1, *p2)?;
		}
		for [top, b0, b1, b2] in self.cells.iter() {
			group.add_volume_constraint(ps, *top, [*b0, *b1, *b2])?;
		}
		session.end();
		Ok(group)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::constraint::Constraint;

	fn tetra() -> PhysicalModel {
		PhysicalModel::new_tetrahedron(
			V3d::new(0., 2., 14.),
			[
				V3d::new(-4., 0., 5.),
				V3d::new(4., 0., 12.),
				V3d::new(0., 4., 8.),
			],
		)
	}

	#[test]
	fn test_tetrahedron() {
		let mut pool = ParticlePool::new(16);
		let group = tetra().build(&mut pool, 0.1, 0.0, 1.0).unwrap();
		assert_eq!(group.len(), 4);
		assert_eq!(group.distance_constraints().len(), 6);
		assert_eq!(group.volume_constraints().len(), 1);
		let ps = pool.particles(group.range());
		for p in ps {
			assert!((p.imass - 0.4).abs() < 1e-6);
		}
		let c = &group.volume_constraints()[0];
		assert!((c.rest_volume() - 184.0 / 6.0).abs() < 1e-3);
		let (d, v) = group.max_residuals(ps);
		assert!(d < 1e-6);
		assert!(v < 1e-4);
	}

	#[test]
	fn test_bipyramid() {
		let model = PhysicalModel::new_bipyramid(
			V3d::new(12., 10., 14.),
			[
				V3d::new(6., 10., 10.),
				V3d::new(13., 9., 10.),
				V3d::new(10., 14., 10.),
			],
			V3d::new(10., 12., 6.),
		);
		let mut pool = ParticlePool::new(16);
		let group = model.build(&mut pool, 0.1, 0.0006, 1.0).unwrap();
		assert_eq!(group.len(), 5);
		assert_eq!(group.distance_constraints().len(), 9);
		assert_eq!(group.volume_constraints().len(), 2);
		assert_eq!(group.volume_constraints()[1].indices(), &[1, 2, 3, 4]);
		assert!((pool.particles(group.range())[0].imass - 0.5).abs() < 1e-6);
	}

	#[test]
	fn test_second_body_offsets() {
		let mut pool = ParticlePool::new(16);
		let a = tetra().build(&mut pool, 0.1, 0.0, 1.0).unwrap();
		let b = tetra().build(&mut pool, 0.1, 0.0, 1.0).unwrap();
		assert_eq!(a.range().start, 0);
		assert_eq!(b.range().start, 4);
		// local indices are reused by both bodies
		assert_eq!(a.distance_constraints(), b.distance_constraints());
	}

	#[test]
	fn test_pool_too_small() {
		let mut pool = ParticlePool::new(6);
		tetra().build(&mut pool, 0.1, 0.0, 1.0).unwrap();
		let err = tetra().build(&mut pool, 0.1, 0.0, 1.0).unwrap_err();
		assert_eq!(err, PbdError::PoolExhausted { capacity: 6 });
		assert_eq!(pool.len(), 4);
	}

	#[test]
	fn test_bad_topology_releases_particles() {
		let mut model = tetra();
		model.cells.push([0, 1, 1, 2]);
		let mut pool = ParticlePool::new(16);
		let err = model.build(&mut pool, 0.1, 0.0, 1.0).unwrap_err();
		assert_eq!(err, PbdError::DuplicateVolumeIndex { index: 1 });
		assert!(pool.is_empty());
	}

	#[test]
	fn test_lattice() {
		let model =
			PhysicalModel::new_lattice(V3d::new(0., 0., 10.), V3d::new(4., 2., 3.), 1.0);
		assert_eq!(model.vertices.len(), 2 * 1 * 2);
		assert_eq!(model.vertices[0], V3d::new(-1., 0., 9.));
		assert_eq!(model.vertices[3], V3d::new(1., 0., 11.));
		let mut pool = ParticlePool::new(16);
		let group = model.build(&mut pool, 0.5, 0.0, 1.0).unwrap();
		assert!(group.distance_constraints().is_empty());
		assert!((pool.particles(group.range())[0].imass - 2.0).abs() < 1e-6);
	}

	#[test]
	fn test_mesh_dedups_shared_edges() {
		let mut points = vec![V3d::new(0., 0., 55.)];
		for z in [50.0, 60.0] {
			for (x, y) in [(-2., -2.), (2., -2.), (2., 2.), (-2., 2.)] {
				points.push(V3d::new(x, y, z));
			}
		}
		let model = PhysicalModel::new_mesh(&points).unwrap();
		assert_eq!(model.edges.len(), 6 * model.cells.len());
		let mut pool = ParticlePool::new(64);
		let group = model.build(&mut pool, 0.1, 0.0006, 1.0).unwrap();
		assert_eq!(group.len(), points.len());
		assert_eq!(group.volume_constraints().len(), model.cells.len());
		let n = group.distance_constraints().len();
		assert!(n < model.edges.len());
		for (i, a) in group.distance_constraints().iter().enumerate() {
			for b in group.distance_constraints()[i + 1..].iter() {
				let [p1, p2] = [b.indices()[0], b.indices()[1]];
				assert!(!a.connects(p1, p2));
			}
		}
	}
}
