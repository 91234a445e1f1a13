//! Naming convention utilities for generated units.

/// Convert PascalCase or camelCase to snake_case.
///
/// Runs of capitals are treated as one word, so acronyms stay together.
///
/// # Examples
///
/// ```
/// use tagwire_codegen::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("ItemCodec"), "item_codec");
/// assert_eq!(to_snake_case("HTTPHeaderCodec"), "http_header_codec");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let starts_word = match prev {
                None => false,
                Some(p) if p == '_' => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                Some(_) => false,
            };
            if starts_word {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// The last segment of a `::`-separated path.
pub fn last_segment(path: &str) -> &str {
    path.rsplit_once("::").map_or(path, |(_, last)| last)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("Item", "item")]
    #[test_case("ItemWithDefault", "item_with_default")]
    #[test_case("GeneratedCodecFactory", "generated_codec_factory")]
    #[test_case("JSONItem", "json_item")]
    #[test_case("Item2Codec", "item2_codec")]
    #[test_case("already_snake", "already_snake")]
    fn test_to_snake_case(input: &str, expected: &str) {
        assert_eq!(to_snake_case(input), expected);
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("crate::model::Item"), "Item");
        assert_eq!(last_segment("Item"), "Item");
    }
}
