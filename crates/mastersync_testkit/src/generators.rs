//! Property-based test generators using proptest.

use proptest::prelude::*;
use serde_json::{json, Value};

/// Strategy for category names that no registry tier resolves.
pub fn unknown_category_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("Zz[a-z]{3,12}").expect("Invalid regex")
}

/// Strategy for language codes.
pub fn lang_code_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["eng", "fra", "ara", "hin", "tam", "kan"]).prop_map(str::to_string)
}

/// Strategy for `Language` records with unique codes.
pub fn language_records_strategy(max: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::btree_map("[a-z]{3}", ("[A-Za-z ]{1,20}", any::<bool>()), 0..max).prop_map(
        |rows| {
            rows.into_iter()
                .map(|(code, (name, active))| {
                    json!({"code": code, "name": name, "isActive": active})
                })
                .collect()
        },
    )
}

/// Strategy for `ReasonList` records, a composite-keyed shape.
pub fn reason_records_strategy(max: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        ("[A-Z]{3}", "[A-Z]{3}", lang_code_strategy(), "[a-z ]{0,30}"),
        0..max,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(code, category, lang, name)| {
                json!({"code": code, "rsnCatCode": category, "langCode": lang, "name": name})
            })
            .collect()
    })
}

/// Strategy for a word rendered in random letter case.
pub fn mixed_case_strategy(word: &'static str) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<bool>(), word.len()).prop_map(move |upper| {
        word.chars()
            .zip(upper)
            .map(|(c, up)| {
                if up {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect()
    })
}

/// Strategy for dynamic field records named after `name` in random case.
pub fn dynamic_records_strategy(
    name: &'static str,
    max: usize,
) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        (mixed_case_strategy(name), lang_code_strategy(), "[A-Z0-9]{1,6}"),
        1..max,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(index, (name, lang, code))| {
                json!({
                    "id": format!("dyn-{index}"),
                    "name": name,
                    "langCode": lang,
                    "fieldVal": [{"code": code}],
                    "isActive": true
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn mixed_case_keeps_letters(word in mixed_case_strategy("religion")) {
            prop_assert_eq!(word.to_lowercase(), "religion");
        }

        #[test]
        fn language_codes_unique(records in language_records_strategy(20)) {
            let mut codes: Vec<&str> = records.iter().map(|r| r["code"].as_str().unwrap()).collect();
            let len = codes.len();
            codes.dedup();
            prop_assert_eq!(codes.len(), len);
        }
    }
}
