include!("integration_tests_setup.rs");

#[test]
#[ignore]
fn healthcheck_returns_ok() {
    let mut context = setup();
    let (status, body) = send(&mut context, Method::Get, "/healthcheck", None, None);
    assert_eq!(status, StatusCode::Ok);
    assert_eq!(body, "\"Ok\"");
}

#[test]
#[ignore]
fn unknown_route_is_not_found() {
    let mut context = setup();
    let (status, body) = send(&mut context, Method::Get, "/stores", None, None);
    assert_eq!(status, StatusCode::NotFound);
    let message = serde_json::from_str::<serde_json::Value>(&body).unwrap();
    assert_eq!(message["code"], 404);
}
