//! Recursive merge of TOML values.
//!
//! Tables merge key by key. Every other value, arrays included, is replaced
//! wholesale by the overlay.

use toml::Value;

/// Merge `overlay` into `base`.
///
/// Keys present only in `base` are kept, keys present in both are merged
/// recursively when both sides are tables and replaced otherwise.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(s: &str) -> Value {
        Value::Table(toml::from_str(s).unwrap())
    }

    #[test]
    fn test_merge_later_keys_win() {
        let mut base = parse("a = 1\nb = 2");
        merge_values(&mut base, parse("b = 3"));

        assert_eq!(base, parse("a = 1\nb = 3"));
    }

    #[test]
    fn test_merge_nested_tables_recursively() {
        let mut base = parse("[files]\nsidebar = \"_sidebar.md\"\ndefault_page = \"README.md\"");
        merge_values(&mut base, parse("[files]\ndefault_page = \"home.md\""));

        assert_eq!(
            base,
            parse("[files]\nsidebar = \"_sidebar.md\"\ndefault_page = \"home.md\"")
        );
    }

    #[test]
    fn test_merge_replaces_arrays_wholesale() {
        let mut base = parse("plugins = [\"a\", \"b\", \"c\"]");
        merge_values(&mut base, parse("plugins = [\"z\"]"));

        assert_eq!(base, parse("plugins = [\"z\"]"));
    }

    #[test]
    fn test_merge_adds_new_keys() {
        let mut base = parse("[markdown]\nparser = \"gfm\"");
        merge_values(
            &mut base,
            parse("[markdown.parser_options]\nsmart_punctuation = true"),
        );

        assert_eq!(
            base,
            parse("[markdown]\nparser = \"gfm\"\n[markdown.parser_options]\nsmart_punctuation = true")
        );
    }

    #[test]
    fn test_merge_scalar_replaces_table() {
        let mut base = parse("[remote]\nenabled = true");
        merge_values(&mut base, parse("remote = false"));

        assert_eq!(base, parse("remote = false"));
    }
}
