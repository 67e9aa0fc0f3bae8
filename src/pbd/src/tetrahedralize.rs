use fnv::FnvHashMap;
use nalgebra::Matrix3;

use crate::error::{PbdError, Result};
use crate::V3d;

pub const MESH_VOLUME_TOLERANCE: f64 = 1e-3;

const SUPER_COUNT: usize = 4;

pub fn signed_volume(p0: V3d, p1: V3d, p2: V3d, p3: V3d) -> f64 {
	(p1 - p2).cross(&(p0 - p2)).dot(&(p3 - p2)) / 6.0
}

/// Inclusive point-in-tetrahedron test: `p` is inside when replacing any one
/// vertex with it never flips the sign of the volume.
pub fn is_inside_tetrahedron(p: V3d, t: [V3d; 4]) -> bool {
	let v = signed_volume(t[0], t[1], t[2], t[3]);
	if v == 0.0 {
		return false;
	}
	let eps = -1e-12 * v.abs();
	(0..4).all(|k| {
		let mut q = t;
		q[k] = p;
		signed_volume(q[0], q[1], q[2], q[3]) * v.signum() >= eps
	})
}

fn circumsphere(t: [V3d; 4]) -> Option<(V3d, f64)> {
	let rows = [t[1] - t[0], t[2] - t[0], t[3] - t[0]];
	let m = Matrix3::from_rows(&[
		rows[0].transpose(),
		rows[1].transpose(),
		rows[2].transpose(),
	]);
	let rhs = V3d::new(
		0.5 * rows[0].magnitude_squared(),
		0.5 * rows[1].magnitude_squared(),
		0.5 * rows[2].magnitude_squared(),
	);
	let u = m.lu().solve(&rhs)?;
	Some((t[0] + u, u.magnitude_squared()))
}

#[derive(Clone, Copy, Debug)]
struct Cell {
	ids: [usize; 4],
	sphere: Option<(V3d, f64)>,
	alive: bool,
}

impl Cell {
	// orients the cell to a positive volume
	fn new(vertices: &[V3d], ids: [usize; 4]) -> Self {
		let [a, b, c, d] = ids;
		let t = [vertices[a], vertices[b], vertices[c], vertices[d]];
		let (ids, t) = if signed_volume(t[0], t[1], t[2], t[3]) < 0.0 {
			([a, c, b, d], [t[0], t[2], t[1], t[3]])
		} else {
			(ids, t)
		};
		Self {
			ids,
			sphere: circumsphere(t),
			alive: true,
		}
	}

	fn faces(&self) -> [[usize; 3]; 4] {
		let [a, b, c, d] = self.ids;
		[[a, b, c], [a, c, d], [a, d, b], [b, d, c]]
	}

	fn encloses(&self, p: V3d) -> bool {
		match self.sphere {
			Some((center, r2)) => {
				(p - center).magnitude_squared() < r2 * (1.0 - 1e-12)
			}
			None => false,
		}
	}
}

#[derive(Clone, Debug)]
pub struct Tetrahedralization {
	pub vertices: Vec<V3d>,
	// apex then base, indices into `vertices`
	pub cells: Vec<[usize; 4]>,
	pub super_volume: f64,
	pub retained_volume: f64,
	pub discarded_volume: f64,
}

/// Incremental Delaunay insertion (Bowyer-Watson) of every point into a
/// bounding super-tetrahedron. Cells still touching a super vertex are
/// dropped at the end.
pub fn tetrahedralize(points: &[V3d]) -> Result<Tetrahedralization> {
	if points.is_empty() {
		return Err(PbdError::EmptyMesh);
	}
	let center: V3d = points.iter().sum::<V3d>() / points.len() as f64;
	let max_d2 = points
		.iter()
		.map(|p| (p - center).magnitude_squared())
		.fold(0f64, f64::max);
	let r = if max_d2 > 0.0 { 2.2 * max_d2.sqrt() } else { 2.2 };
	let s = 5.0 * r;

	let mut vertices = vec![
		center + V3d::new(0., 0., s),
		center + V3d::new(-s, -s, -s),
		center + V3d::new(s, -s, -s),
		center + V3d::new(0., s, -s),
	];
	let bounds = [vertices[0], vertices[1], vertices[2], vertices[3]];
	let super_volume =
		signed_volume(bounds[0], bounds[1], bounds[2], bounds[3]).abs();
	let mut cells = vec![Cell::new(&vertices, [0, 1, 2, 3])];

	for (index, point) in points.iter().enumerate() {
		if !is_inside_tetrahedron(*point, bounds) {
			return Err(PbdError::VertexOutsideBounds { index });
		}
		let vid = vertices.len();
		vertices.push(*point);

		let mut boundary: FnvHashMap<[usize; 3], ([usize; 3], usize)> =
			FnvHashMap::default();
		let mut order = vec![];
		for cell in cells.iter_mut().filter(|c| c.alive) {
			if !cell.encloses(*point) {
				continue;
			}
			cell.alive = false;
			for face in cell.faces() {
				let mut key = face;
				key.sort_unstable();
				let e = boundary.entry(key).or_insert_with(|| {
					order.push(key);
					(face, 0)
				});
				e.1 += 1;
			}
		}
		if order.is_empty() {
			log::warn!("mesh vertex {} duplicates an earlier one, left unconnected", index);
			continue;
		}
		for key in order {
			let (face, n) = boundary[&key];
			if n == 1 {
				cells.push(Cell::new(&vertices, [vid, face[0], face[1], face[2]]));
			}
		}
		cells.retain(|c| c.alive);
	}

	let volume = |ids: [usize; 4]| {
		signed_volume(
			vertices[ids[0]],
			vertices[ids[1]],
			vertices[ids[2]],
			vertices[ids[3]],
		)
		.abs()
	};
	let mut retained = vec![];
	let mut retained_volume = 0.0;
	let mut discarded_volume = 0.0;
	for cell in cells.iter() {
		if cell.ids.iter().any(|id| *id < SUPER_COUNT) {
			discarded_volume += volume(cell.ids);
		} else {
			retained_volume += volume(cell.ids);
			retained.push(cell.ids.map(|id| id - SUPER_COUNT));
		}
	}
	let expected = super_volume - discarded_volume;
	if (expected - retained_volume).abs() > MESH_VOLUME_TOLERANCE {
		return Err(PbdError::VolumeMismatch {
			expected,
			actual: retained_volume,
		});
	}
	log::debug!(
		"tetrahedralized {} points: {} cells kept, {} volume discarded",
		points.len(),
		retained.len(),
		discarded_volume,
	);
	Ok(Tetrahedralization {
		vertices: vertices.split_off(SUPER_COUNT),
		cells: retained,
		super_volume,
		retained_volume,
		discarded_volume,
	})
}
