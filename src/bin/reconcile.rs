//! One-off run of the catalog and order request reconciliation jobs

extern crate autoparts_lib;
#[macro_use]
extern crate log;

use std::process;

fn main() {
    let config = autoparts_lib::config::Config::new().expect("Can't load app config!");

    // Prepare logger
    autoparts_lib::logging::init(config.logging.as_ref());

    if let Err(err) = autoparts_lib::run_reconcile(config) {
        error!("Reconciliation failed: {:?}", err);
        process::exit(1);
    }
    info!("Reconciliation finished");
}
