/// The identifier forms derived from one label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifiers {
    /// `simplePrompt`
    pub camel: String,
    /// `SimplePrompt`
    pub pascal: String,
    /// `simple_prompt`
    pub snake: String,
    /// `simple_prompt`, built from whitespace only (case humps are kept)
    pub file_slug: String,
}

/// Derive the identifier family for `label`.
///
/// Total: any input produces a family, possibly of empty strings.
/// Only ASCII letters, digits and whitespace survive. Words are split on
/// whitespace and on case humps (`lookupWeather` is two words).
pub fn synthesize(label: &str) -> Identifiers {
    let cleaned: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    let file_slug = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();

    let words: Vec<String> = cleaned
        .split_whitespace()
        .flat_map(split_humps)
        .map(|w| w.to_lowercase())
        .collect();

    let camel: String = words
        .iter()
        .enumerate()
        .map(|(i, word)| if i == 0 { word.clone() } else { upper_first(word) })
        .collect();
    let pascal = upper_first(&camel);
    let snake = words.join("_");

    Identifiers {
        camel,
        pascal,
        snake,
        file_slug,
    }
}

/// Upper-case the first character, leaving the rest alone.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Split one whitespace-free chunk at lower-to-upper and acronym boundaries.
fn split_humps(chunk: &str) -> Vec<String> {
    let chars: Vec<char> = chunk.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
