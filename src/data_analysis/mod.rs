// src/data_analysis/mod.rs

pub mod anomaly_flagger;
pub mod binned_summary;
pub mod derived_series;
pub mod evaluation;
pub mod outlier_cleaner;
pub mod position_estimator;
pub mod shock_trim;
pub mod statistics;

// src/data_analysis/mod.rs
