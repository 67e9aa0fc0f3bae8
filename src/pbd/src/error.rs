use thiserror::Error;

pub type Result<T> = std::result::Result<T, PbdError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PbdError {
	#[error("particle pool exhausted: capacity {capacity}")]
	PoolExhausted { capacity: usize },

	#[error("entity registry full: capacity {capacity}")]
	RegistryFull { capacity: usize },

	#[error("{kind} constraint list full: capacity {capacity}")]
	ConstraintCapacity { kind: &'static str, capacity: usize },

	#[error("particle index {index} out of range for a group of {count}")]
	IndexOutOfRange { index: usize, count: usize },

	#[error("volume constraint references particle {index} more than once")]
	DuplicateVolumeIndex { index: usize },

	#[error("inverse mass must be finite and non-negative, got {0}")]
	InvalidInverseMass(f32),

	#[error("mesh has no vertices")]
	EmptyMesh,

	#[error("mesh vertex {index} lies outside the bounding tetrahedron")]
	VertexOutsideBounds { index: usize },

	#[error("tetrahedralization volume mismatch: expected {expected}, got {actual}")]
	VolumeMismatch { expected: f64, actual: f64 },
}
