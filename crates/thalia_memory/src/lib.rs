pub mod analysis;
pub mod record;
pub mod store;

pub use analysis::{sentiment, Timeframe};
pub use record::{MemoryPattern, MemoryRecord};
pub use store::{ConsolidationStats, MemoryStore};
