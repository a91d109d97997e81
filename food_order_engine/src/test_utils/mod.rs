//! Test helpers: a throwaway SQLite environment, an in-memory backend with fault injection, a recording push sink and
//! a manual clock.
mod clock;
mod memory_db;
#[cfg(feature = "sqlite")]
mod prepare_env;
mod recording_sink;

pub use clock::ManualClock;
pub use memory_db::MemoryDatabase;
#[cfg(feature = "sqlite")]
pub use prepare_env::{create_database, prepare_test_env, random_db_path, run_migrations};
pub use recording_sink::RecordingSink;
