use rand::Rng;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

const SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const FALLBACK_SLUG: &str = "post";

/// Lowercase ASCII slug with accents folded and every other run collapsed to `-`.
pub fn slugify(title: &str) -> String {
    let folded: String = title
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == 'đ' { 'd' } else { c })
        .collect();

    let mut slug = String::with_capacity(folded.len());
    let mut pending_dash = false;
    for c in folded.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

pub fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

pub fn with_suffix(base: &str) -> String {
    format!("{base}-{}", random_suffix())
}

#[cfg(test)]
mod tests {
    use super::{random_suffix, slugify, with_suffix};

    #[test]
    fn folds_case_and_punctuation() {
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
        assert_eq!(slugify("Rust 2024 -- Edition"), "rust-2024-edition");
    }

    #[test]
    fn strips_vietnamese_accents() {
        assert_eq!(slugify("Tiếng Việt có dấu"), "tieng-viet-co-dau");
        assert_eq!(slugify("Đường đi"), "duong-di");
        assert_eq!(slugify("Crème brûlée"), "creme-brulee");
    }

    #[test]
    fn empty_slug_falls_back() {
        assert_eq!(slugify("!!!"), "post");
        assert_eq!(slugify(""), "post");
    }

    #[test]
    fn suffix_is_six_base36_chars() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 6);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
        assert!(with_suffix("hello").starts_with("hello-"));
        assert_eq!(with_suffix("hello").len(), "hello-".len() + 6);
    }
}
