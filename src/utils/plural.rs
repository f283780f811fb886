//! Pluralization for summary lines.

/// `"s"` unless `n` is exactly one.
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// `plural_count(3, "view")` -> `"3 views"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "type"), "0 types");
        assert_eq!(plural_count(1, "type"), "1 type");
        assert_eq!(plural_count(4, "view"), "4 views");
    }
}
