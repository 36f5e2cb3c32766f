use super::*;
use serde_json::json;

#[test]
fn test_fold_diacritics_only_table_chars_yields_ascii_letters() {
    let folded = fold_diacritics("ąĄćĆęĘłŁóÓśŚżŻźŹńŃ");
    assert_eq!(folded, "aAcCeElLoOsSzZzZnN");
    assert!(folded.chars().all(|c| c.is_ascii_alphabetic()));
}

#[test]
fn test_fold_diacritics_passes_unmapped_through() {
    assert_eq!(fold_diacritics("Żółć é ü 42"), "Zolc é ü 42");
}

#[test]
fn test_fold_diacritics_bytes_utf8_and_legacy() {
    assert_eq!(fold_diacritics_bytes("żółw".as_bytes()), b"zolw".to_vec());
    // Windows-1250 "ąś", ISO-8859-2 "ąś"
    assert_eq!(fold_diacritics_bytes(&[0xb9, 0x9c]), b"as".to_vec());
    assert_eq!(fold_diacritics_bytes(&[0xb1, 0xb6]), b"as".to_vec());
    assert_eq!(fold_diacritics_bytes(b"plain"), b"plain".to_vec());
}

#[test]
fn test_normalize_search_text_basic() {
    assert_eq!(normalize_search_text("  Żółta-Sukienka!  "), "zolta sukienka");
    assert_eq!(normalize_search_text("T-Shirt (XL)"), "t shirt xl");
}

#[test]
fn test_normalize_search_text_clamps_large_numbers() {
    assert_eq!(normalize_search_text("2147483648"), "2147483647");
    assert_eq!(normalize_search_text("99999999999999999999999"), "2147483647");
    assert_eq!(normalize_search_text("2147483647"), "2147483647");
    assert_eq!(normalize_search_text("12345"), "12345");
}

#[test]
fn test_normalize_search_text_drops_unknown_unicode() {
    assert_eq!(normalize_search_text("café"), "caf");
}

#[test]
fn test_escape_numeric_is_untouched_and_idempotent() {
    for n in ["42", "3.14", "-7", "1e5"] {
        let once = escape_query_syntax(n);
        assert_eq!(once, n);
        assert_eq!(escape_query_syntax(&once), once);
    }
}

#[test]
fn test_escape_phrase() {
    assert_eq!(escape_query_syntax("\"a b\""), "\"a b\"");
    assert_eq!(escape_query_syntax("\"a-b c\""), "\"ab c\"");
    assert_eq!(escape_query_syntax(r#""say \ hi""#), r#""say \\ hi""#);
}

#[test]
fn test_escape_special_characters() {
    assert_eq!(escape_query_syntax("a:b"), r"a\:b");
    assert_eq!(escape_query_syntax("(x)"), r"\(x\)");
    assert_eq!(escape_query_syntax("a/b~c^"), r"a\/b\~c\^");
    assert_eq!(escape_query_syntax("foo-bar"), "foobar");
    assert_eq!(escape_query_syntax("plain"), "plain");
}

#[test]
fn test_escape_leaves_wildcards_alone() {
    assert_eq!(escape_query_syntax("sho*"), "sho*");
    assert_eq!(escape_query_syntax("a+b?"), "a+b?");
}

#[test]
fn test_filter_sanitizers() {
    assert_eq!(sanitize_filter_token("ABC-1; drop"), "ABC-1drop");
    assert_eq!(sanitize_filter_value("red, blue,green"), "red,blue,green");
    assert_eq!(sanitize_numeric_token("10-20,x30"), "10-20,30");
    assert_eq!(sanitize_digits_only("1a2b3"), "123");
    assert_eq!(sanitize_attribute_filter("price=10:20 "), "price=10:20");
    assert_eq!(sanitize_attribute_filter("size=4.5,5"), "size=4.5,5");
}

#[test]
fn test_sanitizer_kinds() {
    assert_eq!(Sanitizer::Token.apply("a b"), "ab");
    assert_eq!(Sanitizer::Raw.apply("a b"), "a b");
    assert_eq!(Sanitizer::Digits.apply("12x"), "12");
    assert_eq!("numeric".parse::<Sanitizer>().unwrap(), Sanitizer::Numeric);
    assert_eq!(Sanitizer::List.to_string(), "list");
}

#[test]
fn test_clamp_to_boolean_flag() {
    assert_eq!(clamp_to_boolean_flag(&json!(true)), Some(1));
    assert_eq!(clamp_to_boolean_flag(&json!(false)), Some(0));
    assert_eq!(clamp_to_boolean_flag(&json!("true")), None);
    assert_eq!(clamp_to_boolean_flag(&json!(1)), None);
    assert_eq!(clamp_to_boolean_flag(&json!(null)), None);
}

#[test]
fn test_sanitize_id_list() {
    assert_eq!(sanitize_id_list(&[1, 2, MAX_INT, MAX_INT + 1, 7]), vec![1, 2, 7]);
}

#[test]
fn test_clamp_numeric_non_digits_untouched() {
    assert_eq!(clamp_numeric("12a"), "12a");
    assert_eq!(clamp_numeric(""), "");
}
