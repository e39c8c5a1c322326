//! Identifier case conversions used to derive IRIs from function and parameter names.

/// Converts a `snake_case` identifier into `camelCase`.
///
/// ```
/// use rdf_hooks_model::snake_to_camel;
///
/// assert_eq!(snake_to_camel("split_index"), "splitIndex");
/// assert_eq!(snake_to_camel("identifier"), "identifier");
/// ```
pub fn snake_to_camel(name: &str) -> String {
    let mut parts = name.split('_');
    let mut result = parts.next().unwrap_or_default().to_owned();
    for part in parts {
        result.push_str(&title_case(part));
    }
    result
}

/// Converts a `snake_case` identifier into `PascalCase`.
///
/// ```
/// use rdf_hooks_model::snake_to_pascal;
///
/// assert_eq!(snake_to_pascal("string_splitter"), "StringSplitter");
/// ```
pub fn snake_to_pascal(name: &str) -> String {
    name.split('_').map(title_case).collect()
}

/// Upper-cases every letter that follows a non-letter and lower-cases all other letters.
fn title_case(part: &str) -> String {
    let mut result = String::with_capacity(part.len());
    let mut previous_is_letter = false;
    for c in part.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }
    result
}
