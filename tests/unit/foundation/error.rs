use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(MergeError::input("x").to_string().contains("input error:"));
    assert!(MergeError::decode("x").to_string().contains("decode error:"));
    assert!(
        MergeError::resample("x")
            .to_string()
            .contains("resample error:")
    );
    assert!(MergeError::encode("x").to_string().contains("encode error:"));
    assert!(
        MergeError::MissingTrack { clip: 3 }
            .to_string()
            .contains("clip 3")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MergeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
