//! ISBN-10 / ISBN-13 checksum validation
//!
//! All functions are total: null, empty or garbage input is simply invalid.

/// Strip everything except ASCII digits and `X`/`x`
///
/// Returns `None` for null or empty input.
pub fn clean_isbn(isbn: Option<&str>) -> Option<String> {
    let isbn = isbn.filter(|s| !s.is_empty())?;
    Some(
        isbn.chars()
            .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
            .collect(),
    )
}

/// Check an ISBN-10 with the weighted mod-11 checksum
pub fn is_valid_isbn10(isbn: Option<&str>) -> bool {
    let Some(cleaned) = clean_isbn(isbn) else {
        return false;
    };
    let chars: Vec<char> = cleaned.chars().collect();
    if chars.len() != 10 {
        return false;
    }

    let mut total: u32 = 0;
    for (i, c) in chars[..9].iter().enumerate() {
        match c.to_digit(10) {
            Some(d) => total += (i as u32 + 1) * d,
            None => return false,
        }
    }

    let check = match chars[9] {
        'X' | 'x' => 10,
        c => match c.to_digit(10) {
            Some(d) => d,
            None => return false,
        },
    };
    total += 10 * check;

    total % 11 == 0
}

/// Check an ISBN-13 with alternating 1/3 weights
pub fn is_valid_isbn13(isbn: Option<&str>) -> bool {
    let Some(cleaned) = clean_isbn(isbn) else {
        return false;
    };
    if cleaned.len() != 13 || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let total: u32 = cleaned
        .chars()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();

    total % 10 == 0
}

/// True if the value passes either the ISBN-10 or the ISBN-13 check
pub fn validate_isbn(isbn: Option<&str>) -> bool {
    is_valid_isbn10(isbn) || is_valid_isbn13(isbn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_isbn_strips_formatting() {
        assert_eq!(
            clean_isbn(Some("978-0-306-40615-7")),
            Some("9780306406157".to_string())
        );
        assert_eq!(clean_isbn(Some(" 007462542x ")), Some("007462542x".to_string()));
        assert_eq!(clean_isbn(Some("")), None);
        assert_eq!(clean_isbn(None), None);
    }

    #[test]
    fn test_valid_isbn10() {
        assert!(is_valid_isbn10(Some("0306406152")));
        assert!(is_valid_isbn10(Some("0-306-40615-2")));
        assert!(validate_isbn(Some("0306406152")));
    }

    #[test]
    fn test_isbn10_with_x_check() {
        assert!(is_valid_isbn10(Some("007462542X")));
        assert!(is_valid_isbn10(Some("007462542x")));
    }

    #[test]
    fn test_isbn10_x_only_allowed_as_check_char() {
        assert!(!is_valid_isbn10(Some("X074625420")));
    }

    #[test]
    fn test_invalid_isbn10() {
        assert!(!is_valid_isbn10(Some("1234567890")));
        assert!(!validate_isbn(Some("1234567890")));
        assert!(!is_valid_isbn10(Some("030640615")));
    }

    #[test]
    fn test_valid_isbn13() {
        assert!(is_valid_isbn13(Some("9780306406157")));
        assert!(is_valid_isbn13(Some("978-1-491-95766-0")));
        assert!(validate_isbn(Some("9780306406157")));
    }

    #[test]
    fn test_invalid_isbn13() {
        assert!(!is_valid_isbn13(Some("9780306406158")));
        assert!(!is_valid_isbn13(Some("978030640615X")));
    }

    #[test]
    fn test_null_and_empty_are_invalid() {
        assert!(!validate_isbn(None));
        assert!(!validate_isbn(Some("")));
        assert!(!validate_isbn(Some("not an isbn")));
    }
}
