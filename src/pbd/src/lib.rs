pub mod config;
pub mod constraint;
pub mod entity;
pub mod error;
pub mod particle;
pub mod particle_group;
pub mod particle_pool;
pub mod physical_model;
pub mod pworld;
pub mod tetrahedralize;
pub mod time_manager;

pub type V3 = nalgebra::Vector3<f32>;
pub type V3d = nalgebra::Vector3<f64>;
