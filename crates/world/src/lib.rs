//! Procedural terrain generation and chunk streaming.
//!
//! Layers, leaves first: [`NoiseField`] channels feed the [`BiomeClassifier`]
//! and [`ColumnSynthesizer`]; [`FeaturePlacer`] decorates columns with trees;
//! [`ChunkGenerator`] turns a chunk key into inert placements; [`ChunkStore`]
//! owns the chunk lifecycle and realizes placements through a [`BlockHost`];
//! [`WorldGenerator`] ties it together around a player position.

mod biome;
mod column;
mod config;
mod error;
mod generator;
mod heightmap;
mod host;
mod noise;
mod scheduler;
mod storage;
mod trees;
mod world;

pub use biome::*;
pub use column::*;
pub use config::*;
pub use error::*;
pub use generator::*;
pub use heightmap::*;
pub use host::*;
pub use noise::*;
pub use scheduler::*;
pub use storage::*;
pub use trees::*;
pub use world::*;
