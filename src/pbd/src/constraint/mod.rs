pub mod distance;
pub mod volume;

use crate::particle::Particle;

/// A constraint over particles addressed by offsets local to their group.
///
/// `step` projects once, Gauss-Seidel style: it reads and writes `ps` in
/// place, so later constraints in the same pass see the corrected positions.
pub trait Constraint {
	fn step(&self, ps: &mut [Particle], compliance_t: f32);

	fn residual(&self, ps: &[Particle]) -> f32;

	fn indices(&self) -> &[usize];
}

pub fn solve_all<C: Constraint>(
	constraints: &[C],
	ps: &mut [Particle],
	compliance_t: f32,
) {
	for constraint in constraints.iter() {
		constraint.step(ps, compliance_t);
	}
}

pub fn max_residual<C: Constraint>(constraints: &[C], ps: &[Particle]) -> f32 {
	constraints
		.iter()
		.map(|c| c.residual(ps))
		.fold(0f32, f32::max)
}
