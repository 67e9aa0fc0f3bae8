use crate::constraint::Constraint;
use crate::particle::Particle;

#[derive(Clone, Debug, PartialEq)]
pub struct DistanceConstraint {
	ps: [usize; 2],
	l0: f32,
}

impl DistanceConstraint {
	pub fn new(ps: &[Particle], p1: usize, p2: usize) -> Self {
		let l0 = (ps[p1].get_pos() - ps[p2].get_pos()).magnitude();
		Self::new_with_l0(p1, p2, l0)
	}

	pub fn new_with_l0(p1: usize, p2: usize, l0: f32) -> Self {
		Self { ps: [p1, p2], l0 }
	}

	pub fn rest_length(&self) -> f32 {
		self.l0
	}

	pub fn connects(&self, p1: usize, p2: usize) -> bool {
		(self.ps[0] == p1 && self.ps[1] == p2)
			|| (self.ps[0] == p2 && self.ps[1] == p1)
	}
}

impl Constraint for DistanceConstraint {
	fn step(&self, ps: &mut [Particle], compliance_t: f32) {
		let [i1, i2] = self.ps;
		let imass1 = ps[i1].get_imass();
		let imass2 = ps[i2].get_imass();
		let imass = imass1 + imass2;
		if imass == 0.0 {
			return;
		}
		let dp = ps[i1].get_pos() - ps[i2].get_pos();
		let l = dp.magnitude();
		if l == 0.0 {
			log::trace!("skip degenerate edge {} {}", i1, i2);
			return;
		}
		let dl = l - self.l0;
		if dl == 0.0 {
			return;
		}
		let grad = dp / l;
		let lambda = -dl / (imass + compliance_t);
		ps[i1].add_pos(lambda * imass1 * grad);
		ps[i2].add_pos(-lambda * imass2 * grad);
	}

	fn residual(&self, ps: &[Particle]) -> f32 {
		let dp = ps[self.ps[0]].get_pos() - ps[self.ps[1]].get_pos();
		(dp.magnitude() - self.l0).abs()
	}

	fn indices(&self) -> &[usize] {
		&self.ps
	}
}
