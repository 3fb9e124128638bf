//! Adapters owned by the runtime.

pub mod storage;
