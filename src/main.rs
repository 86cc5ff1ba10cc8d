//! Autoparts is a marketplace microservice for vehicle parts.
//! This crate is for running the service from `autoparts_lib`. See `autoparts_lib` for details.

extern crate autoparts_lib;

fn main() {
    let config = autoparts_lib::config::Config::new().expect("Can't load app config!");

    // Prepare logger
    autoparts_lib::logging::init(config.logging.as_ref());

    autoparts_lib::start_server(config, &None, || ());
}
