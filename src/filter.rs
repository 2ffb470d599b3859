use crate::models::{Annotation, TAG_FIELD, TITLE_FIELD};

/// Case-insensitive substring match on title values, then tag term labels.
pub fn matches_keyword(annotation: &Annotation, keyword: &str, language: &str) -> bool {
    let needle = keyword.to_lowercase();
    let contains = |field: &str| {
        annotation.has_field(field)
            && annotation
                .field_values(field, language)
                .iter()
                .any(|value| value.text().to_lowercase().contains(&needle))
    };

    contains(TITLE_FIELD) || contains(TAG_FIELD)
}
