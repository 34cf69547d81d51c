//! Isolated runtime environments: declarative specs and the provisioner
//! that materializes them on demand.

pub mod provisioner;
pub mod spec;

pub use provisioner::{is_provisionable, make_run_script, provision, provisionable_names};
pub use spec::EnvironmentSpec;
