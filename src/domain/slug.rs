/// Lowercase ASCII alphanumerics joined by single hyphens.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn collapses_separators_and_trims() {
        assert_eq!(slugify("  Arduino Uno R3 -- (Clone) "), "arduino-uno-r3-clone");
        assert_eq!(slugify("ESP32_DevKit"), "esp32-devkit");
        assert_eq!(slugify("---"), "");
    }
}
