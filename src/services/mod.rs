//! Backend services: the layout agent and session history.

pub mod agent;
pub mod history;
