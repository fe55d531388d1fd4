pub mod kpi;
/// Daily constrained charging optimizer.
pub mod optimizer;
/// Fixed-schema time-series recorders.
pub mod recorder;
pub mod runner;
pub mod site;
pub mod types;
