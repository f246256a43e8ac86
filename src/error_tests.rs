use super::*;

#[test]
fn http_status_mapping() {
    assert_eq!(AdminError::InvalidCredentials { message: "no".into() }.http_status(), 401);
    assert_eq!(AdminError::unauthorized("expired").http_status(), 401);
    assert_eq!(AdminError::unavailable("down").http_status(), 503);
    assert_eq!(AdminError::malformed("garbage").http_status(), 502);
    assert_eq!(AdminError::request(409, "dup").http_status(), 409);
    assert_eq!(AdminError::validation("color_hex", "bad").http_status(), 400);
    assert_eq!(AdminError::config("missing").http_status(), 500);
}

#[test]
fn codes_are_stable() {
    assert_eq!(AdminError::request(404, "x").code_str(), "request_error");
    assert_eq!(AdminError::unauthorized("x").code_str(), "unauthorized");
    assert_eq!(AuthFailure::malformed("x").code_str(), "malformed_response");
    assert_eq!(AuthFailure::invalid("x").code_str(), "invalid_credentials");
}

#[test]
fn auth_failure_converts_variant_for_variant() {
    let e: AdminError = AuthFailure::unavailable("API URL not configured").into();
    assert_eq!(e, AdminError::unavailable("API URL not configured"));
    let e: AdminError = AuthFailure::invalid("Email or password is incorrect").into();
    assert_eq!(e.code_str(), "invalid_credentials");
    assert_eq!(e.message(), "Email or password is incorrect");
}

#[test]
fn backend_message_is_the_detail_field_only() {
    let e = AdminError::request(409, "A faction with this acronym already exists")
        .with_detail(Some("A faction with this acronym already exists".into()));
    assert_eq!(e.backend_message(), Some("A faction with this acronym already exists"));
    // `error` text or a reason phrase may fill `message`, but never counts as the backend's message.
    assert_eq!(AdminError::request(400, "Validation failed").backend_message(), None);
    assert_eq!(AdminError::request(500, "Internal Server Error").backend_message(), None);
    assert_eq!(AdminError::request(500, "").with_detail(Some("  ".into())).backend_message(), None);
    assert_eq!(AdminError::unauthorized("Token expired").with_detail(Some("Token expired".into())).backend_message(),
        Some("Token expired"));
    assert_eq!(AdminError::validation("name", "required").with_detail(Some("x".into())).backend_message(), None);
}

#[test]
fn display_includes_status() {
    let s = AdminError::request(422, "bad geometry").to_string();
    assert!(s.contains("422"));
    assert!(s.contains("bad geometry"));
}
