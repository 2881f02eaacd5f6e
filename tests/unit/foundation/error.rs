use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MockupError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MockupError::conflict("x")
            .to_string()
            .contains("conflict:")
    );
    assert!(
        MockupError::external("x")
            .to_string()
            .contains("external error:")
    );
    assert!(MockupError::raster("x").to_string().contains("raster error:"));
    assert_eq!(
        MockupError::not_found("template", 7).to_string(),
        "not found: template 7"
    );
}

#[test]
fn only_external_errors_are_transient() {
    assert!(MockupError::external("timeout").is_transient());
    assert!(!MockupError::validation("bad").is_transient());
    assert!(!MockupError::conflict("busy").is_transient());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MockupError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
