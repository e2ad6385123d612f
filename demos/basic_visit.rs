//! A short browsing session against the test application.
//!
//! Run: `cargo run --example basic_visit`
//! (set `PHP_CGI_BIN` if php-cgi is not on your PATH)

use std::path::PathBuf;

use cgi_visit::{Visit, VisitOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let docroot = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/php_scripts");
    let options = VisitOptions::app(&docroot, docroot.join("index.php"))
        .with_follow_redirect(false);

    let mut visit = Visit::new(options);

    visit
        .get("/")?
        .assert_see("Hello World");
    println!("GET / -> {:?}", visit.body_string());

    visit.get("/redirect")?;
    println!("GET /redirect -> {} {}", visit.status(), visit.location());

    visit
        .follow_redirect()?
        .assert_see("Final");
    println!("followed to {} -> {:?}", visit.path(), visit.body_string());

    visit.get("/cookie/set")?;
    for cookie in visit.cookies().iter() {
        println!("cookie: {}", cookie);
    }

    if visit.response().has_errors() {
        eprintln!("PHP errors occurred:");
        for error in visit.response().errors() {
            eprintln!("  {:?}: {}", error.level, error.message);
        }
    }

    Ok(())
}
