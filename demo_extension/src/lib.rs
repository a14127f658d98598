// demo_extension: a small game-side extension exercising the public grove
// API. Load the cdylib from the engine; the integration tests drive the same
// classes against the mock engine.

grove::entry!();

pub mod exporter;
pub mod turret;
pub mod weapon;

pub use exporter::ModExporter;
pub use turret::{FireMode, Turret};
pub use weapon::WeaponStats;
