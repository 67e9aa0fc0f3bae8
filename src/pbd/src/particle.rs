use crate::V3;
use protocol::pr_model::PrParticle;

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	pub pos: V3,
	pub ppos: V3,
	pub vel: V3,
	pub imass: f32, // 0 is pinned
	pub radius: f32,
}

impl Particle {
	pub fn new(pos: V3, radius: f32, imass: f32) -> Self {
		Self {
			pos,
			ppos: pos,
			vel: V3::zeros(),
			imass,
			radius,
		}
	}

	pub fn get_pos(&self) -> V3 {
		self.pos
	}

	pub fn add_pos(&mut self, dp: V3) {
		self.pos += dp
	}

	pub fn get_imass(&self) -> f32 {
		self.imass
	}

	pub fn is_movable(&self) -> bool {
		self.imass > 0.0
	}

	// ground contact is resolved right here, once per substep
	pub fn predict(
		&mut self,
		t: f32,
		accel: V3,
		damping: f32,
		ground: f32,
	) {
		if !self.is_movable() {
			return;
		}
		self.vel += accel * t;
		self.vel *= damping;
		self.ppos = self.pos;
		self.pos += self.vel * t;
		if self.pos[2] <= ground {
			self.pos = self.ppos;
			self.pos[2] = ground;
			self.vel[2] = 0.0;
		}
	}

	pub fn reconcile(&mut self, t: f32) {
		if !self.is_movable() {
			return;
		}
		self.vel = (self.pos - self.ppos) / t;
	}

	pub fn render(&self) -> PrParticle {
		PrParticle {
			pos: [self.pos[0], self.pos[1], self.pos[2]],
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn gravity() -> V3 {
		V3::new(0., 0., -9.8)
	}

	#[test]
	fn test_ground_clamp() {
		for z in [-0.001f32, -1.0, -250.0] {
			let mut p = Particle::new(V3::new(1.0, 2.0, z), 1.0, 0.4);
			p.vel = V3::new(0.5, 0.0, -3.0);
			p.predict(1.0 / 1200.0, gravity(), 0.999, 0.0);
			assert_eq!(p.pos[2], 0.0);
			assert_eq!(p.vel[2], 0.0);
			// horizontal motion is rolled back too
			assert_eq!(p.pos[0], 1.0);
		}
	}

	#[test]
	fn test_predict_free_fall() {
		let t = 0.01;
		let mut p = Particle::new(V3::new(0.0, 0.0, 10.0), 1.0, 1.0);
		p.predict(t, gravity(), 1.0, 0.0);
		let v = -9.8 * t;
		assert!((p.vel[2] - v).abs() < 1e-6);
		assert!((p.pos[2] - (10.0 + v * t)).abs() < 1e-6);
		assert_eq!(p.ppos, V3::new(0.0, 0.0, 10.0));
		p.reconcile(t);
		assert!((p.vel[2] - v).abs() < 1e-3);
	}

	#[test]
	fn test_pinned_untouched() {
		let mut p = Particle::new(V3::new(0.0, 0.0, -1.0), 1.0, 0.0);
		p.predict(0.01, gravity(), 0.999, 0.0);
		p.reconcile(0.01);
		assert_eq!(p.pos, V3::new(0.0, 0.0, -1.0));
		assert_eq!(p.vel, V3::zeros());
	}
}
