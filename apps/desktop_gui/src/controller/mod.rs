//! Controller layer: UI events and command orchestration. State transitions
//! live in `client_core::state`.

pub mod events;
pub mod orchestration;
