//! Assertions against the last response of a visit.
//!
//! `assert_*` panic with the diagnostic and return the visit for chaining;
//! `check_*` return the same diagnostic as an [`AssertionFailure`].

use memchr::memmem;

use super::Visit;
use crate::error::AssertionFailure;

impl Visit {
    pub fn check_status_code(&self, code: u16) -> Result<(), AssertionFailure> {
        if self.response.status == code {
            return Ok(());
        }

        Err(AssertionFailure::new(
            format!(
                "{} : Didn't return {} status code",
                self.request_line(),
                code
            ),
            code.to_string(),
            self.response.status.to_string(),
        ))
    }

    pub fn check_see(&self, needle: &str) -> Result<(), AssertionFailure> {
        if self.body_contains(needle) {
            return Ok(());
        }

        Err(AssertionFailure::new(
            format!(
                "{} : String '{}' not found in output{}",
                self.request_line(),
                needle,
                self.body_group()
            ),
            needle,
            self.body_string(),
        ))
    }

    pub fn check_dont_see(&self, needle: &str) -> Result<(), AssertionFailure> {
        if !self.body_contains(needle) {
            return Ok(());
        }

        Err(AssertionFailure::new(
            format!(
                "{} : String '{}' was found in output{}",
                self.request_line(),
                needle,
                self.body_group()
            ),
            needle,
            self.body_string(),
        ))
    }

    /// The last response must be a 302 pointing at `location`.
    pub fn check_redirect(&self, location: &str) -> Result<(), AssertionFailure> {
        self.check_status_code(302)?;

        if self.response.location == location {
            return Ok(());
        }

        Err(AssertionFailure::new(
            format!(
                "{} : Didn't redirect to {}",
                self.request_line(),
                location
            ),
            location,
            self.response.location.clone(),
        ))
    }

    #[track_caller]
    pub fn assert_status_code(&mut self, code: u16) -> &mut Self {
        if let Err(failure) = self.check_status_code(code) {
            fail(failure);
        }
        self
    }

    #[track_caller]
    pub fn assert_see(&mut self, needle: &str) -> &mut Self {
        if let Err(failure) = self.check_see(needle) {
            fail(failure);
        }
        self
    }

    #[track_caller]
    pub fn assert_dont_see(&mut self, needle: &str) -> &mut Self {
        if let Err(failure) = self.check_dont_see(needle) {
            fail(failure);
        }
        self
    }

    #[track_caller]
    pub fn assert_redirect(&mut self, location: &str) -> &mut Self {
        if let Err(failure) = self.check_redirect(location) {
            fail(failure);
        }
        self
    }

    fn request_line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    fn body_contains(&self, needle: &str) -> bool {
        memmem::find(&self.response.body, needle.as_bytes()).is_some()
    }

    fn body_group(&self) -> String {
        format!(
            "\n\n::group::Body:\n{}\n::endgroup::",
            self.body_string()
        )
    }
}

#[track_caller]
fn fail(failure: AssertionFailure) -> ! {
    panic!(
        "{}\nExpected: {}\nActual: {}",
        failure.message, failure.expected, failure.actual
    )
}
