pub mod directory;
pub mod error;
pub mod scheduling;

#[cfg(test)]
mod scheduling_tests;
