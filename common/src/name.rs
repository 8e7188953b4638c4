/// Converts a display name into its kebab form.
///
/// Used to derive default server names from egg names. Runs of
/// non-alphanumeric characters collapse into a single dash and the result is
/// lowercase with no leading or trailing dash.
#[must_use]
pub fn kebab(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut pending_dash = false;
    for character in name.chars() {
        if character.is_ascii_alphanumeric() {
            if pending_dash && !result.is_empty() {
                result.push('-');
            }
            pending_dash = false;
            result.push(character.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::kebab;

    #[test]
    fn collapses_separators() {
        assert_eq!(kebab("Paper MC"), "paper-mc");
        assert_eq!(kebab("Counter  Strike: Source"), "counter-strike-source");
    }

    #[test]
    fn trims_edges() {
        assert_eq!(kebab("  Minecraft (Java) "), "minecraft-java");
        assert_eq!(kebab("---"), "");
    }

    #[test]
    fn keeps_plain_names() {
        assert_eq!(kebab("valheim"), "valheim");
    }
}
