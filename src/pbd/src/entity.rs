use bitflags::bitflags;

use crate::error::{PbdError, Result};
use crate::particle_group::ParticleGroup;
use crate::V3;

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct EntityFlags: u32 {
		const MOVABLE = 0x1;
		const COLLIDES = 0x2;
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

#[derive(Clone, Debug)]
pub enum EntityKind {
	// render and collision geometry only
	Floor { center: V3, dim: V3 },
	// particle lattice, not integrated
	Cube { group: ParticleGroup },
	SoftBody { group: ParticleGroup },
}

#[derive(Clone, Debug)]
pub struct Entity {
	pub kind: EntityKind,
	pub color: V3,
	pub flags: EntityFlags,
}

impl Entity {
	pub fn group(&self) -> Option<&ParticleGroup> {
		match &self.kind {
			EntityKind::Floor { .. } => None,
			EntityKind::Cube { group } | EntityKind::SoftBody { group } => {
				Some(group)
			}
		}
	}

	/// The group the integrator advances. Every soft body is stepped,
	/// whatever its flags.
	pub fn simulated_group(&self) -> Option<&ParticleGroup> {
		match &self.kind {
			EntityKind::SoftBody { group } => Some(group),
			_ => None,
		}
	}

	pub fn is_soft_body(&self) -> bool {
		matches!(self.kind, EntityKind::SoftBody { .. })
	}
}

/// Flat, append-only entity table with a fixed maximum count.
pub struct EntityRegistry {
	capacity: usize,
	entities: Vec<Entity>,
}

impl EntityRegistry {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			entities: Vec::new(),
		}
	}

	pub fn len(&self) -> usize {
		self.entities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	pub fn is_full(&self) -> bool {
		self.entities.len() >= self.capacity
	}

	pub fn ensure_room(&self) -> Result<()> {
		if self.is_full() {
			return Err(PbdError::RegistryFull {
				capacity: self.capacity,
			});
		}
		Ok(())
	}

	pub fn add_entity(
		&mut self,
		kind: EntityKind,
		color: V3,
		flags: EntityFlags,
	) -> Result<EntityId> {
		self.ensure_room()?;
		self.entities.push(Entity { kind, color, flags });
		Ok(EntityId(self.entities.len() - 1))
	}

	pub fn get(&self, id: EntityId) -> Option<&Entity> {
		self.entities.get(id.0)
	}

	pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
		self.entities
			.iter()
			.enumerate()
			.map(|(i, e)| (EntityId(i), e))
	}
}
