//! Background jobs running outside of the http server

pub mod scheduler;
