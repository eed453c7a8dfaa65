//! Storage filenames for uploaded files.
//!
//! Names have the form `{token}-{epochMillis}.{extension}`. The token is a short random
//! base-36 string; together with the millisecond timestamp it makes collisions unlikely, but
//! nothing here checks the destination for an existing file.

use chrono::Utc;
use rand::prelude::RngExt;
use rand::rng;

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
pub const TOKEN_LENGTH: usize = 8;

/// Generate a storage filename for `original_name` using the thread-local RNG and the system clock.
pub fn generate(original_name: &str) -> String {
    let token = random_token(&mut rng());
    generate_with(original_name, &token, Utc::now().timestamp_millis())
}

/// Build a storage filename from explicit random and clock inputs.
pub fn generate_with(original_name: &str, token: &str, epoch_millis: i64) -> String {
    format!("{}-{}.{}", token, epoch_millis, extension(original_name))
}

/// Final segment of a client-supplied file name, splitting on both `/` and `\`.
///
/// Browsers and clients may send paths such as `albums/logo.png` or `C:\photos\logo.png`.
pub fn basename(original_name: &str) -> &str {
    original_name.rsplit(['/', '\\']).next().unwrap_or(original_name)
}

/// Text after the last `.` of `original_name`.
///
/// Names without a `.` yield the whole name, so `"README"` stores as `{token}-{ms}.README`.
pub fn extension(original_name: &str) -> &str {
    match original_name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => original_name,
    }
}

/// Random lowercase base-36 token of [`TOKEN_LENGTH`] characters.
pub fn random_token<R: RngExt + ?Sized>(rng: &mut R) -> String {
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_with_format() {
        assert_eq!(generate_with("photo.png", "k3x9a0zq", 1700000000123), "k3x9a0zq-1700000000123.png");
    }

    #[test]
    fn test_suffix_is_text_after_last_dot() {
        for (original, ext) in [
            ("photo.png", "png"),
            ("archive.tar.gz", "gz"),
            ("my.logo.final.JPEG", "JPEG"),
            (".hidden", "hidden"),
            ("trailing.", ""),
        ] {
            let name = generate(original);
            assert!(
                name.ends_with(&format!(".{ext}")),
                "{name} should end with .{ext} for {original}"
            );
        }
    }

    #[test]
    fn test_name_without_dot_uses_whole_name_as_extension() {
        assert_eq!(extension("README"), "README");
        assert_eq!(generate_with("README", "abcdefgh", 42), "abcdefgh-42.README");

        let name = generate("logo");
        assert!(name.ends_with(".logo"), "{name}");
    }

    #[test]
    fn test_basename_strips_client_directories() {
        assert_eq!(basename("photo.png"), "photo.png");
        assert_eq!(basename("albums.v2/logo"), "logo");
        assert_eq!(basename("C:\\Users\\pepe\\banner.jpg"), "banner.jpg");
        assert_eq!(basename("mixed\\dir/hero.webp"), "hero.webp");
        assert_eq!(basename("trailing/"), "");
    }

    #[test]
    fn test_token_shape() {
        let token = random_token(&mut rng());
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_generated_names_parse_back() {
        let before = Utc::now().timestamp_millis();
        let name = generate("banner.jpg");
        let after = Utc::now().timestamp_millis();

        let (token, rest) = name.split_once('-').expect("name has a token separator");
        let (millis, ext) = rest.split_once('.').expect("name has an extension");
        assert_eq!(token.len(), TOKEN_LENGTH);
        let millis: i64 = millis.parse().expect("timestamp is numeric");
        assert!(millis >= before && millis <= after);
        assert_eq!(ext, "jpg");
    }

    #[test]
    fn test_generate_uniqueness() {
        let mut names = HashSet::new();

        for _ in 0..10_000 {
            let name = generate("photo.png");
            assert!(names.insert(name), "Generated duplicate storage name");
        }
    }
}
