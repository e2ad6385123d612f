use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cgi_visit::cgi::InterceptedScript;
use cgi_visit::{
    visit, ExecutionError, ExecutionHooks, InterceptError, Interpreter,
    MockTable, ScriptInterceptor, SyslogLevel, Visit, VisitError,
    VisitOptions,
};

fn manifest_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn fake_interpreter() -> Interpreter {
    Interpreter::new("sh").with_arg(
        manifest_path("tests/fixtures/fake-php-cgi.sh")
            .to_string_lossy(),
    )
}

fn app_options(docroot: &Path) -> VisitOptions {
    VisitOptions::app(docroot, docroot.join("index.php"))
        .with_interpreter(fake_interpreter())
        .with_session_save_path(std::env::temp_dir())
        .with_echo_stderr(false)
}

fn options() -> VisitOptions {
    app_options(&manifest_path("tests/php_scripts"))
}

/// A private copy of the app, so wrapper files of parallel tests never mix.
fn scratch_app() -> (tempfile::TempDir, VisitOptions) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::copy(
        manifest_path("tests/php_scripts/index.php"),
        dir.path().join("index.php"),
    )
    .expect("failed to copy index.php");

    let options = app_options(dir.path())
        .with_mock_loader(manifest_path("tests/fixtures/Patchwork.php"));

    (dir, options)
}

fn wrappers(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .expect("failed to read dir")
        .map(|entry| entry.expect("bad dir entry").path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("_mocked_"))
        })
        .collect()
}

#[derive(Clone, Default)]
struct InvocationCounter(Arc<AtomicUsize>);

impl InvocationCounter {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl ExecutionHooks for InvocationCounter {
    fn on_script_executing(&mut self, _script_path: &Path) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn hello_world() {
    let mut visit = visit("/", options()).expect("GET / failed");

    visit
        .assert_status_code(0)
        .assert_see("Hello World")
        .assert_dont_see("Final");

    assert_eq!(visit.location(), "");
    assert_eq!(visit.path(), "/");
    assert_eq!(
        visit.response().header("Content-type"),
        Some("text/html; charset=UTF-8")
    );
}

#[test]
fn empty_path_performs_no_request() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");

    // No index.php in `dir`: any request would fail.
    let visit = visit("", app_options(dir.path())).expect("visit failed");

    assert_eq!(visit.status(), 0);
    assert!(visit.body().is_empty());
    assert_eq!(visit.path(), "");
}

#[test]
fn redirect_is_followed_by_default() {
    let counter = InvocationCounter::default();
    let mut visit = Visit::new(options()).with_hooks(counter.clone());

    visit
        .get("/redirect")
        .expect("GET /redirect failed")
        .assert_see("Final");

    assert_eq!(visit.path(), "/destination");
    assert_eq!(visit.location(), "");
    assert_eq!(counter.count(), 2);
}

#[test]
fn redirect_can_be_followed_by_hand() {
    let mut visit = Visit::new(options().with_follow_redirect(false));

    visit
        .get("/redirect")
        .expect("GET /redirect failed")
        .assert_status_code(302)
        .assert_redirect("/destination")
        .follow_redirect()
        .expect("follow failed")
        .assert_see("Final");
}

#[test]
fn not_found_status() {
    visit("/not-found", options())
        .expect("GET /not-found failed")
        .assert_status_code(404)
        .assert_see("Not Found");
}

#[test]
fn redirect_to_self_is_a_loop() {
    let counter = InvocationCounter::default();
    let mut visit = Visit::new(options()).with_hooks(counter.clone());

    let err = visit.get("/loop").unwrap_err();

    match err {
        VisitError::RedirectLoop { location } => assert_eq!(location, "/loop"),
        other => panic!("Expected RedirectLoop, got {other:?}"),
    }
    assert_eq!(counter.count(), 2);
}

#[test]
fn repeating_a_redirect_by_hand_is_a_loop() {
    let mut visit = Visit::new(options().with_follow_redirect(false));

    visit
        .get("/loop")
        .expect("first GET /loop failed")
        .assert_redirect("/loop");

    let err = visit.get("/loop").unwrap_err();
    assert!(matches!(err, VisitError::RedirectLoop { .. }));
}

#[test]
fn redirect_cycle_hits_the_limit() {
    let counter = InvocationCounter::default();
    let mut visit = Visit::new(options().with_max_redirects(5))
        .with_hooks(counter.clone());

    let err = visit.get("/ping").unwrap_err();

    match err {
        VisitError::TooManyRedirects { limit, .. } => assert_eq!(limit, 5),
        other => panic!("Expected TooManyRedirects, got {other:?}"),
    }
    assert_eq!(counter.count(), 6);
}

#[test]
fn cookies_carry_over_between_requests() {
    let mut visit = Visit::new(options());

    visit
        .get("/cookie/set")
        .expect("GET /cookie/set failed")
        .assert_see("Cookie set");

    assert_eq!(
        visit.cookies().iter().collect::<Vec<_>>(),
        vec!["PHPSESSID=fake123", "theme=dark"]
    );

    visit
        .get("/cookie/set")
        .expect("second GET /cookie/set failed");
    assert_eq!(visit.cookies().len(), 2);

    visit
        .get("/cookie/show")
        .expect("GET /cookie/show failed")
        .assert_see("Cookies: PHPSESSID=fake123; theme=dark;");

    visit
        .clear_cookies()
        .get("/cookie/show")
        .expect("GET /cookie/show failed");
    assert_eq!(visit.body_string(), "Cookies: ");
}

#[test]
fn cookie_from_a_redirect_reaches_the_next_hop() {
    let counter = InvocationCounter::default();
    let mut visit = Visit::new(options()).with_hooks(counter.clone());

    visit
        .post("/login", [("user", "ann")])
        .expect("POST /login failed")
        .assert_see("Cookies: PHPSESSID=logged-in;");

    assert_eq!(visit.path(), "/cookie/show");
    assert_eq!(visit.cookies().get("PHPSESSID"), Some("logged-in"));
    assert_eq!(counter.count(), 2);
}

#[test]
fn post_body_reaches_stdin() {
    let mut visit = Visit::new(options());
    let encoded = "name=Jane%20Doe&email=jane%40example.com";

    visit
        .post(
            "/post",
            [("name", "Jane Doe"), ("email", "jane@example.com")],
        )
        .expect("POST /post failed")
        .assert_see(&format!("POST {} {}", encoded.len(), encoded));

    assert_eq!(visit.method().as_str(), "POST");
}

#[test]
fn post_redirect_continues_as_get() {
    let mut visit = Visit::new(options());

    visit
        .post("/redirect", [("a", "1")])
        .expect("POST /redirect failed")
        .assert_see("Final");

    assert_eq!(visit.method().as_str(), "GET");
    assert_eq!(visit.path(), "/destination");
}

#[test]
fn stderr_does_not_fail_the_request() {
    let mut visit = Visit::new(options());

    visit
        .get("/stderr")
        .expect("GET /stderr failed")
        .assert_see("Still fine");

    let response = visit.response();
    assert!(response.has_warnings());
    assert!(!response.has_errors());
    assert_eq!(response.messages.len(), 1);
    assert_eq!(response.messages[0].level, SyslogLevel::Warning);
}

#[test]
fn echoed_stderr_does_not_fail_the_request() {
    visit("/stderr", options().with_echo_stderr(true))
        .expect("GET /stderr failed")
        .assert_status_code(0)
        .assert_see("Still fine");
}

#[test]
fn non_zero_exit_is_a_process_failure() {
    let err = visit("/fail", options()).unwrap_err();

    assert!(err
        .to_string()
        .starts_with("GET /fail : Procedure to handle request failed with"));

    match err {
        VisitError::ProcessFailure {
            method,
            path,
            status,
            stdout,
            stderr,
        } => {
            assert_eq!(method, "GET");
            assert_eq!(path, "/fail");
            assert_eq!(status.code(), Some(3));
            assert_eq!(stdout, "partial output");
            assert!(stderr.contains("PHP Fatal error"));
        }
        other => panic!("Expected ProcessFailure, got {other:?}"),
    }
}

#[test]
fn missing_separator_is_a_protocol_error() {
    let err = visit("/garbage", options()).unwrap_err();

    match err {
        VisitError::Protocol { path, stdout, .. } => {
            assert_eq!(path, "/garbage");
            assert_eq!(stdout, "no separator here");
        }
        other => panic!("Expected Protocol, got {other:?}"),
    }
}

#[test]
fn missing_script_is_reported_before_spawning() {
    let counter = InvocationCounter::default();
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut visit = Visit::new(app_options(dir.path())).with_hooks(counter.clone());

    let err = visit.get("/").unwrap_err();

    assert!(err.is_configuration());
    assert!(err
        .to_string()
        .contains("doesn't exist to be called with php-cgi"));
    assert_eq!(counter.count(), 0);
}

#[test]
fn slow_interpreter_times_out() {
    let started = Instant::now();
    let err = visit(
        "/hang",
        options().with_timeout(Duration::from_millis(200)),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        VisitError::Execution {
            source: ExecutionError::TimedOut(_),
            ..
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
fn mock_replaces_function_for_the_request() {
    let (dir, options) = scratch_app();
    let mut visit = Visit::new(options);

    visit
        .get("/bye")
        .expect("GET /bye failed")
        .assert_see("Bye World");

    visit
        .mock("bye_world", "function() { echo \"I'm a mock!\"; }")
        .expect("mock failed")
        .get("/bye")
        .expect("mocked GET /bye failed")
        .assert_see("I'm a mock!")
        .assert_dont_see("Bye World");

    assert!(wrappers(dir.path()).is_empty());

    visit
        .unmock("bye_world")
        .get("/bye")
        .expect("GET /bye failed")
        .assert_see("Bye World");
}

#[test]
fn wrapper_is_removed_when_the_request_fails() {
    let (dir, options) = scratch_app();
    let mut visit = Visit::new(options);

    visit
        .mock("bye_world", "function() { return 'x'; }")
        .expect("mock failed");

    let err = visit.get("/fail").unwrap_err();
    assert!(matches!(err, VisitError::ProcessFailure { .. }));
    assert!(wrappers(dir.path()).is_empty());

    let err = visit.get("/garbage").unwrap_err();
    assert!(matches!(err, VisitError::Protocol { .. }));
    assert!(wrappers(dir.path()).is_empty());
}

#[test]
fn missing_loader_fails_before_spawning() {
    let counter = InvocationCounter::default();
    let (_dir, options) = scratch_app();
    let mut visit = Visit::new(options.with_mock_loader("/no/such/Patchwork.php"))
        .with_hooks(counter.clone());

    let err = visit
        .mock("bye_world", "function() { return 'x'; }")
        .expect("mock failed")
        .get("/bye")
        .unwrap_err();

    assert!(matches!(
        err,
        VisitError::Intercept(InterceptError::LoaderNotFound(_))
    ));
    assert_eq!(counter.count(), 0);
}

#[test]
fn mock_without_loader_is_a_configuration_error() {
    let mut visit = Visit::new(options());

    let err = visit
        .mock("bye_world", "function() { return 'x'; }")
        .unwrap_err();

    assert!(err.is_configuration());
}

struct PassThrough(Arc<AtomicUsize>);

impl ScriptInterceptor for PassThrough {
    fn intercept(
        &self,
        script: &Path,
        mocks: &MockTable,
    ) -> Result<InterceptedScript, InterceptError> {
        self.0
            .fetch_add(mocks.len(), Ordering::SeqCst);
        Ok(InterceptedScript::persistent(script))
    }
}

#[test]
fn custom_interceptor_replaces_patchwork() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut visit = Visit::new(options())
        .with_interceptor(PassThrough(Arc::clone(&calls)));

    visit
        .mock("bye_world", "function() { return 'x'; }")
        .expect("mock failed")
        .get("/bye")
        .expect("GET /bye failed")
        .assert_see("Bye World");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

struct DropContentType;

impl ExecutionHooks for DropContentType {
    fn on_header(&mut self, name: &str, _value: &str) -> bool {
        !name.eq_ignore_ascii_case("content-type")
    }
}

#[test]
fn hooks_can_filter_headers() {
    let mut visit = Visit::new(options()).with_hooks(DropContentType);

    visit
        .get("/")
        .expect("GET / failed")
        .assert_see("Hello World");

    assert!(visit
        .response()
        .header("Content-type")
        .is_none());
}

#[test]
#[should_panic(expected = "GET /not-found : Didn't return 200 status code")]
fn failed_assertion_names_the_request() {
    visit("/not-found", options())
        .expect("GET /not-found failed")
        .assert_status_code(200);
}

#[cfg(feature = "serde")]
#[test]
fn options_from_a_partial_mapping() {
    let options: VisitOptions = serde_json::from_value(serde_json::json!({
        "followRedirect": false,
        "maxRedirects": 3,
        "mockLoaderPath": "/vendor/antecedent/patchwork/Patchwork.php",
    }))
    .expect("failed to deserialize options");

    assert!(!options.follow_redirect);
    assert_eq!(options.max_redirects, 3);
    assert_eq!(
        options.mock_loader.as_deref(),
        Some(Path::new("/vendor/antecedent/patchwork/Patchwork.php"))
    );
    assert_eq!(options.docroot, PathBuf::from("./public"));
    assert!(options.echo_stderr);
}
