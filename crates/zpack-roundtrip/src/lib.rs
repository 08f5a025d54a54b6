//! Build-time packed fixtures, compiled as ordinary Rust.
//!
//! `build.rs` packs a set of assets covering every encoding kind; this crate
//! includes the generated module so the emitted expressions are compiled
//! and, in the tests, evaluated against the original files.

include!(concat!(env!("OUT_DIR"), "/assets/pack.rs"));

#[cfg(test)]
mod tests {
    use super::assets;
    use std::borrow::Cow;

    macro_rules! fixture {
        ($name:literal) => {
            include_bytes!(concat!(env!("OUT_DIR"), "/fixtures/", $name)).as_slice()
        };
    }

    #[test]
    fn test_literal_assets_evaluate_to_source() {
        let text = assets::text();
        assert!(matches!(text, Cow::Borrowed(_)));
        assert_eq!(&*text, fixture!("text.txt"));
        assert!(text.windows(2).any(|w| w == b"\r\n"));

        let empty = assets::empty();
        assert!(matches!(empty, Cow::Borrowed(_)));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_encoded_asset_evaluates_to_source() {
        let blob = assets::r#type();
        assert!(matches!(blob, Cow::Owned(_)));
        assert_eq!(&*blob, fixture!("blob.bin"));
    }

    #[test]
    fn test_compressed_asset_evaluates_to_source() {
        let big = assets::big();
        assert!(matches!(big, Cow::Owned(_)));
        assert_eq!(big.len(), fixture!("big.bin").len());
        assert!(*big == *fixture!("big.bin"));
    }

    #[test]
    fn test_dir_map_evaluates_to_sources() {
        let tree = assets::tree();
        assert_eq!(tree.len(), 2);
        assert!(tree.keys().all(|k| !k.ends_with(".keep")));

        let (a_key, a) = tree.iter().next().unwrap();
        assert!(a_key.ends_with("a.txt"));
        assert_eq!(&**a, fixture!("tree/a.txt"));

        let (b_key, b) = tree.iter().nth(1).unwrap();
        assert!(b_key.ends_with("b.bin"));
        assert_eq!(&**b, fixture!("tree/sub/b.bin"));
    }
}
