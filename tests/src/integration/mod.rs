//! Cross-crate integration tests.

pub mod fixtures;

#[cfg(test)]
mod consistency;
#[cfg(test)]
mod flows;
#[cfg(test)]
mod runtime;
#[cfg(test)]
mod shared_quests;
