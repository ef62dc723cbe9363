//! Collaborator traits. The domain only talks to the outside through these.

pub mod broker_port;
pub mod config_port;
pub mod data_port;
pub mod report_port;
