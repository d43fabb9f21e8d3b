// src/data_input/mod.rs

pub mod csv_io;
pub mod derived_io;
pub mod log_data;
pub mod log_parser;
pub mod summary_io;

// src/data_input/mod.rs
