//! # Catalog Seeding
//!
//! Loads the quest catalog, initial users and friendships from a TOML file
//! on startup.
//!
//! ## Initialization Sequence
//!
//! 1. Parse and validate every quest definition before writing anything
//! 2. Skip registration when the store already holds quest 1
//! 3. Register quests, then users, in file order
//! 4. Load friendships into the friendship adapter (always, it is in memory)

pub mod catalog;

pub use catalog::{CatalogFile, FriendshipSeed, SeedError, SeedReport, Seeder};
