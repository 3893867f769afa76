use super::*;

#[test]
fn test_default_image() {
    let image = ImageName::default();

    assert_eq!(image.repository(), "foundationdb/foundationdb");
    assert_eq!(image.tag(), "7.1.61");
    assert_eq!(image.reference(), "foundationdb/foundationdb:7.1.61");
}

#[test]
fn test_parse_with_tag() {
    let image = ImageName::parse("foundationdb/foundationdb:7.3.27").unwrap();

    assert_eq!(image.repository(), "foundationdb/foundationdb");
    assert_eq!(image.tag(), "7.3.27");
}

#[test]
fn test_parse_without_tag_defaults_to_latest() {
    let image = ImageName::parse("foundationdb/foundationdb").unwrap();

    assert_eq!(image.tag(), "latest");
}

#[test]
fn test_parse_registry_with_port() {
    // The port colon must not be mistaken for the tag separator
    let image = ImageName::parse("localhost:5000/foundationdb/foundationdb").unwrap();

    assert_eq!(image.repository(), "localhost:5000/foundationdb/foundationdb");
    assert_eq!(image.tag(), "latest");

    let image = ImageName::parse("localhost:5000/foundationdb/foundationdb:7.1.61").unwrap();
    assert_eq!(image.repository(), "localhost:5000/foundationdb/foundationdb");
    assert_eq!(image.tag(), "7.1.61");
}

#[test]
fn test_parse_rejects_empty_reference() {
    assert!(matches!(ImageName::parse(""), Err(Error::Config(_))));
    assert!(matches!(ImageName::parse("   "), Err(Error::Config(_))));
    assert!(matches!(ImageName::parse("fdb:"), Err(Error::Config(_))));
}

#[test]
fn test_foundationdb_tag_override() {
    let image = ImageName::foundationdb("7.1.63");

    assert_eq!(image.repository(), DEFAULT_IMAGE_REPOSITORY);
    assert_eq!(image.tag(), "7.1.63");
}

#[test]
fn test_compatible_repository_accepted() {
    let image = ImageName::foundationdb("6.3.25");

    assert!(image.assert_compatible_with(DEFAULT_IMAGE_REPOSITORY).is_ok());
}

#[test]
fn test_incompatible_repository_rejected() {
    let image = ImageName::new("postgres", "16");

    let error = image
        .assert_compatible_with(DEFAULT_IMAGE_REPOSITORY)
        .unwrap_err();

    match error {
        Error::IncompatibleImage { actual, expected } => {
            assert_eq!(actual, "postgres");
            assert_eq!(expected, "foundationdb/foundationdb");
        }
        other => panic!("expected IncompatibleImage, got {other:?}"),
    }
}

#[test]
fn test_display_matches_reference() {
    let image = ImageName::foundationdb("7.1.61");

    assert_eq!(image.to_string(), image.reference());
}
