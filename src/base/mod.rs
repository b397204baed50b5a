//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): error codes, Chromium-numbered where a code exists
//! - [`ValidationStage`](stage::ValidationStage): stages of one endpoint validation

pub mod context;
pub mod neterror;
pub mod stage;

#[cfg(test)]
mod tests;
