//! Shows the crate's tracing output for a redirecting request.
//!
//! To see logs, run with `RUST_LOG` set to a level (info, debug, trace):
//! `RUST_LOG=debug cargo run --example tracing_demo`

#[cfg(feature = "tracing")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::path::PathBuf;

    use cgi_visit::{visit, VisitOptions};
    use tracing::info;

    tracing_subscriber::fmt::init();

    let docroot = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/php_scripts");
    let options = VisitOptions::app(&docroot, docroot.join("index.php"));

    // DEBUG: request start, redirect hops and the parsed response
    // TRACE: the spawned command line and wrapper files
    info!("Visiting /redirect");
    let visit = visit("/redirect", options)?;

    info!(status = visit.status(), path = visit.path(), "Done");

    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn main() {
    println!("This example requires the 'tracing' feature.");
    println!("Run with: cargo run --example tracing_demo --features tracing");
}
