//! Screen layouts

pub mod kanban;
