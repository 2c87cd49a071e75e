//! Command handlers exposed to the portal UI over IPC

pub mod update;
