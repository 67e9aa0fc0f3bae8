use crate::constraint::Constraint;
use crate::error::{PbdError, Result};
use crate::particle::Particle;
use crate::V3;

const ONE_OVER_6: f32 = 1.0 / 6.0;

/// Signed volume of the tetrahedron with apex `p0` and base `p1 p2 p3`.
/// Consistent with [`volume_gradients`].
pub fn tetra_volume(p0: V3, p1: V3, p2: V3, p3: V3) -> f32 {
	ONE_OVER_6 * (p1 - p2).cross(&(p0 - p2)).dot(&(p3 - p2))
}

/// Per-particle gradients of [`tetra_volume`]. They sum to zero, the first
/// one is derived from the other three.
pub fn volume_gradients(p0: V3, p1: V3, p2: V3, p3: V3) -> [V3; 4] {
	let grad1 = ONE_OVER_6 * (p0 - p2).cross(&(p3 - p2));
	let grad2 = ONE_OVER_6 * (p3 - p1).cross(&(p0 - p1));
	let grad3 = ONE_OVER_6 * (p1 - p2).cross(&(p0 - p2));
	let grad0 = -(grad1 + grad2 + grad3);
	[grad0, grad1, grad2, grad3]
}

#[derive(Clone, Debug, PartialEq)]
pub struct VolumeConstraint {
	ps: [usize; 4],
	v0: f32,
}

impl VolumeConstraint {
	pub fn new(ps: &[Particle], ids: [usize; 4]) -> Result<Self> {
		for (i, id) in ids.iter().enumerate() {
			if ids[i + 1..].contains(id) {
				return Err(PbdError::DuplicateVolumeIndex { index: *id });
			}
		}
		let v0 = tetra_volume(
			ps[ids[0]].get_pos(),
			ps[ids[1]].get_pos(),
			ps[ids[2]].get_pos(),
			ps[ids[3]].get_pos(),
		);
		Ok(Self { ps: ids, v0 })
	}

	pub fn rest_volume(&self) -> f32 {
		self.v0
	}

	pub fn volume(&self, ps: &[Particle]) -> f32 {
		let [i0, i1, i2, i3] = self.ps;
		tetra_volume(ps[i0].pos, ps[i1].pos, ps[i2].pos, ps[i3].pos)
	}
}

impl Constraint for VolumeConstraint {
	// volumes are rigid, compliance_t is unused
	fn step(&self, ps: &mut [Particle], _compliance_t: f32) {
		let [i0, i1, i2, i3] = self.ps;
		let pos = [ps[i0].pos, ps[i1].pos, ps[i2].pos, ps[i3].pos];
		let imass = [ps[i0].imass, ps[i1].imass, ps[i2].imass, ps[i3].imass];
		let dv = tetra_volume(pos[0], pos[1], pos[2], pos[3]) - self.v0;
		if dv == 0.0 {
			return;
		}
		let grads = volume_gradients(pos[0], pos[1], pos[2], pos[3]);
		let beta: f32 = (0..4)
			.map(|k| imass[k] * grads[k].magnitude_squared())
			.sum();
		if beta == 0.0 {
			log::trace!("skip degenerate cell {:?}", self.ps);
			return;
		}
		let lambda = -dv / beta;
		for (k, id) in self.ps.iter().enumerate() {
			ps[*id].add_pos(lambda * imass[k] * grads[k]);
		}
	}

	fn residual(&self, ps: &[Particle]) -> f32 {
		(self.volume(ps) - self.v0).abs()
	}

	fn indices(&self) -> &[usize] {
		&self.ps
	}
}
