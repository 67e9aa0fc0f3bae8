use crate::error::{PbdError, Result};
use crate::particle::Particle;
use crate::{V3, V3d};

/// Contiguous range of the pool owned by one particle group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParticleRange {
	pub start: usize,
	pub count: usize,
}

impl ParticleRange {
	pub fn end(&self) -> usize {
		self.start + self.count
	}

	pub fn contains_local(&self, index: usize) -> bool {
		index < self.count
	}
}

/// Fixed-capacity, append-only particle storage.
///
/// Particles are only ever added through an [`AllocationSession`], which
/// guarantees that everything allocated for one body is contiguous. Nothing is
/// freed individually, so a [`ParticleRange`] stays valid for the life of the
/// pool.
pub struct ParticlePool {
	capacity: usize,
	particles: Vec<Particle>,
}

impl ParticlePool {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			particles: Vec::with_capacity(capacity),
		}
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn len(&self) -> usize {
		self.particles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.particles.is_empty()
	}

	pub fn remaining(&self) -> usize {
		self.capacity - self.particles.len()
	}

	/// Opens the allocation session for one group. The session borrows the
	/// pool mutably, so a second session cannot be opened until this one ends.
	pub fn begin_group(&mut self) -> AllocationSession<'_> {
		let start = self.particles.len();
		AllocationSession {
			pool: self,
			start,
			closed: false,
		}
	}

	pub fn particles(&self, range: ParticleRange) -> &[Particle] {
		&self.particles[range.start..range.end()]
	}

	pub fn particles_mut(&mut self, range: ParticleRange) -> &mut [Particle] {
		&mut self.particles[range.start..range.end()]
	}

	pub fn as_mut_slice(&mut self) -> &mut [Particle] {
		&mut self.particles
	}
}

pub struct AllocationSession<'a> {
	pool: &'a mut ParticlePool,
	start: usize,
	closed: bool,
}

impl<'a> AllocationSession<'a> {
	/// Appends one particle and returns its index local to the group.
	/// Placement is given in f64 and narrowed to the stored f32 here.
	pub fn allocate(
		&mut self,
		pos: V3d,
		radius: f32,
		imass: f32,
	) -> Result<usize> {
		if !(imass >= 0.0 && imass.is_finite()) {
			return Err(PbdError::InvalidInverseMass(imass));
		}
		let pool = &mut *self.pool;
		if pool.particles.len() >= pool.capacity {
			return Err(PbdError::PoolExhausted {
				capacity: pool.capacity,
			});
		}
		let pos: V3 = pos.cast::<f32>();
		pool.particles.push(Particle::new(pos, radius, imass));
		Ok(pool.particles.len() - 1 - self.start)
	}

	pub fn count(&self) -> usize {
		self.pool.particles.len() - self.start
	}

	pub fn range(&self) -> ParticleRange {
		ParticleRange {
			start: self.start,
			count: self.count(),
		}
	}

	/// Particles allocated so far in this session.
	pub fn particles(&self) -> &[Particle] {
		&self.pool.particles[self.start..]
	}

	pub fn end(mut self) -> ParticleRange {
		self.closed = true;
		self.range()
	}
}

impl Drop for AllocationSession<'_> {
	// abandoned sessions give their particles back
	fn drop(&mut self) {
		if !self.closed {
			self.pool.particles.truncate(self.start);
		}
	}
}
