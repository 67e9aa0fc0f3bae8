// pr_model: Physical model for rendering

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrParticle {
	pub pos: [f32; 3],
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrBody {
	pub entity: usize,
	pub color: [f32; 3],
	pub particles: Vec<PrParticle>,
	// apex first, then the three base particles
	pub cells: Vec<[usize; 4]>,
	pub faces: Vec<[usize; 3]>,
}

impl PrBody {
	pub fn cell_positions(&self, cell: usize) -> [[f32; 3]; 4] {
		let ids = self.cells[cell];
		[
			self.particles[ids[0]].pos,
			self.particles[ids[1]].pos,
			self.particles[ids[2]].pos,
			self.particles[ids[3]].pos,
		]
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrModel {
	pub bodies: Vec<PrBody>,
}

impl PrModel {
	pub fn particle_len(&self) -> usize {
		self.bodies.iter().map(|b| b.particles.len()).sum()
	}

	pub fn cell_len(&self) -> usize {
		self.bodies.iter().map(|b| b.cells.len()).sum()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_cell_positions() {
		let body = PrBody {
			entity: 0,
			color: [1.0, 0.0, 0.0],
			particles: (0..4)
				.map(|i| PrParticle {
					pos: [i as f32, 0.0, 0.0],
				})
				.collect(),
			cells: vec![[3, 0, 1, 2]],
			faces: vec![],
		};
		let ps = body.cell_positions(0);
		assert_eq!(ps[0], [3.0, 0.0, 0.0]);
		assert_eq!(ps[3], [2.0, 0.0, 0.0]);
		let model = PrModel { bodies: vec![body] };
		assert_eq!(model.particle_len(), 4);
		assert_eq!(model.cell_len(), 1);
	}
}
