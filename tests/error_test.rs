//! Tests for error classification and user-facing messages.

use nutriscope::{ErrorKind, NutriscopeError};

#[test]
fn validation_message_shown_verbatim() {
    let err = NutriscopeError::Validation("Please upload your microbiome data file".into());
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        err.user_message("Failed to analyze microbiome data"),
        "Please upload your microbiome data file"
    );
}

#[test]
fn server_messages_take_priority_over_fallback() {
    let api = NutriscopeError::Api {
        status: 422,
        message: "CSV has no taxa columns".into(),
    };
    assert_eq!(api.kind(), ErrorKind::Server);
    assert_eq!(api.user_message("fallback"), "CSV has no taxa columns");
    assert_eq!(api.to_string(), "API error (422): CSV has no taxa columns");

    let flagged = NutriscopeError::ServerReported {
        message: "Image not clear".into(),
    };
    assert_eq!(flagged.kind(), ErrorKind::Server);
    assert_eq!(flagged.user_message("fallback"), "Image not clear");
}

#[test]
fn transport_failures_collapse_to_fallback() {
    for err in [
        NutriscopeError::Http("connection reset".into()),
        NutriscopeError::Timeout,
        NutriscopeError::Cancelled,
    ] {
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.user_message("Failed to analyze meal"), "Failed to analyze meal");
    }
}

#[test]
fn schema_errors_hide_details() {
    let err = NutriscopeError::Schema("missing glucose_prediction".into());
    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(
        err.user_message("Failed to predict glucose response"),
        "Failed to predict glucose response"
    );
}

#[test]
fn session_errors_explain_themselves() {
    let err = NutriscopeError::SessionExpired;
    assert_eq!(err.kind(), ErrorKind::Session);
    assert_eq!(err.user_message("x"), "session expired, please sign in again");
    assert_eq!(NutriscopeError::AuthUnavailable.kind(), ErrorKind::Session);
}

#[test]
fn conversions_from_library_errors() {
    let json_err: NutriscopeError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert_eq!(json_err.kind(), ErrorKind::Local);

    let io_err: NutriscopeError =
        std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(io_err.to_string().starts_with("I/O error"));
}
