/// Derives candidate handle strings from a display name. Pure and
/// deterministic: compound names (space or hyphen) yield a concatenated and
/// an underscore-separated variation; simple names yield one variation with
/// only letters, digits, periods and underscores kept. Everything is
/// lowercased and deduplicated, preserving order.
pub fn variations_for(name: &str) -> Vec<String> {
    let clean = name.trim();
    let compound = clean.contains(' ') || clean.contains('-');

    let mut variations = Vec::new();
    if compound {
        variations.push(
            clean
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase(),
        );
        variations.push(
            clean
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect::<String>()
                .to_lowercase(),
        );
    } else {
        variations.push(
            clean
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
                .collect::<String>()
                .to_lowercase(),
        );
    }

    let mut deduplicated = Vec::new();
    for variation in variations {
        if !deduplicated.contains(&variation) {
            deduplicated.push(variation);
        }
    }
    deduplicated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_names_yield_two_variations() {
        assert_eq!(variations_for("Nirin One"), vec!["nirinone", "nirin_one"]);
        assert_eq!(variations_for("luz-azul"), vec!["luzazul", "luz_azul"]);
    }

    #[test]
    fn simple_names_yield_one_variation() {
        assert_eq!(variations_for("Apex"), vec!["apex"]);
        assert_eq!(variations_for("acme.co"), vec!["acme.co"]);
        assert_eq!(variations_for("ato_um"), vec!["ato_um"]);
    }

    #[test]
    fn simple_names_drop_disallowed_characters() {
        assert_eq!(variations_for("Café!"), vec!["caf"]);
    }

    #[test]
    fn every_nonalphanumeric_becomes_its_own_separator() {
        assert_eq!(variations_for("a & b"), vec!["ab", "a___b"]);
    }

    #[test]
    fn surrounding_whitespace_does_not_make_a_name_compound() {
        assert_eq!(variations_for("  Apex  "), vec!["apex"]);
    }

    #[test]
    fn duplicate_variations_collapse() {
        // Both rules erase everything here except the single letter.
        assert_eq!(variations_for("x"), vec!["x"]);
        let compound = variations_for("a b");
        assert_eq!(compound.len(), 2);
        assert_ne!(compound[0], compound[1]);
    }
}
