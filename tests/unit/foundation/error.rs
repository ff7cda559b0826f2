use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SuiteError::discovery("x")
            .to_string()
            .contains("discovery error:")
    );
    assert!(SuiteError::parse("x").to_string().contains("parse error:"));
    assert!(SuiteError::render("x").to_string().contains("render error:"));
    assert!(
        SuiteError::persist("x")
            .to_string()
            .contains("persist error:")
    );
    assert!(
        SuiteError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SuiteError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_canceled());
}

#[test]
fn canceled_is_not_a_failure_variant() {
    assert!(SuiteError::Canceled.is_canceled());
    assert_eq!(SuiteError::Canceled.to_string(), "render canceled");
}

#[test]
fn panic_message_reads_str_and_string_payloads() {
    let payload = std::panic::catch_unwind(|| panic!("static text")).unwrap_err();
    assert_eq!(panic_message(&*payload), "static text");

    let n = 3;
    let payload = std::panic::catch_unwind(|| panic!("formatted {n}")).unwrap_err();
    assert_eq!(panic_message(&*payload), "formatted 3");

    let payload = std::panic::catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
    assert_eq!(panic_message(&*payload), "unknown panic payload");
}
