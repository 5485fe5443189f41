use std::borrow::Cow;

mod demo {
    use std::borrow::Cow;
    use strata_derive::strata_error;

    #[strata_error]
    pub enum DemoError {
        #[error("Not found{}: {message}", format_context(.context))]
        NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

        #[error("IO failure{}: {source}", format_context(.context))]
        Io { source: std::io::Error, context: Option<Cow<'static, str>> },

        #[error("Internal error{}: {message}", format_context(.context))]
        Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    }
}

use demo::{DemoError, DemoErrorExt};

#[test]
fn expansions_compile() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/strata_error_pass.rs");
    t.pass("tests/ui/handle_pass.rs");
}

#[test]
fn source_converts_through_question_mark() {
    fn open() -> Result<(), DemoError> {
        Err(std::io::Error::other("disk gone"))?;
        Ok(())
    }

    let err = open().unwrap_err();
    assert!(matches!(err, DemoError::Io { context: None, .. }));
    assert_eq!(err.to_string(), "IO failure: disk gone");
}

#[test]
fn context_wraps_foreign_errors() {
    let result: Result<(), std::io::Error> = Err(std::io::Error::other("disk gone"));
    let err = result.context("loading snapshot").unwrap_err();

    assert_eq!(err.kind(), "Io");
    assert_eq!(err.to_string(), "IO failure (loading snapshot): disk gone");
}

#[test]
fn context_overrides_on_own_errors() {
    let result: Result<(), DemoError> =
        Err(DemoError::NotFound { message: Cow::Borrowed("user 7"), context: None });
    let err = result.context("get_user").unwrap_err();

    assert_eq!(err.to_string(), "Not found (get_user): user 7");
}

#[test]
fn strings_become_internal() {
    let borrowed = DemoError::from("boom");
    let owned = DemoError::from(format!("boom {}", 2));

    assert_eq!(borrowed.kind(), "Internal");
    assert_eq!(owned.to_string(), "Internal error: boom 2");
}
