//! # Questline Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Cross-crate flows
//!     ├── fixtures.rs       # World builder, mock recommendation service
//!     ├── flows.rs          # Purchase → bus → recommendation sync
//!     ├── shared_quests.rs  # Two-player lifecycle end to end
//!     ├── consistency.rs    # Concurrency and ledger invariants
//!     └── runtime.rs        # Runtime with real HTTP client and stores
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ql-tests
//! cargo test -p ql-tests --features rocksdb   # durability tests
//! cargo bench -p ql-tests
//! ```

pub mod integration;
