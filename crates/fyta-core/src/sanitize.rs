// Path-segment sanitization for user-supplied names (garden names, plant
// nicknames).

/// Turn a display name into a store path segment.
///
/// German umlauts and `ß` are transliterated, everything outside
/// `[A-Za-z0-9_-]` and space is dropped, then each run of spaces becomes a
/// single underscore. Stripping happens before collapsing, so spaces that
/// were only separated by dropped characters form one run:
/// `"Gärten & Co."` becomes `"Gaerten_Co"`.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;

    for c in name.chars() {
        let replacement = match c {
            'ä' => "ae",
            'ö' => "oe",
            'ü' => "ue",
            'Ä' => "Ae",
            'Ö' => "Oe",
            'Ü' => "Ue",
            'ß' => "ss",
            ' ' => {
                pending_space = true;
                continue;
            }
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => {
                if pending_space {
                    out.push('_');
                    pending_space = false;
                }
                out.push(c);
                continue;
            }
            _ => continue,
        };
        if pending_space {
            out.push('_');
            pending_space = false;
        }
        out.push_str(replacement);
    }

    if pending_space {
        out.push('_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn transliterates_umlauts() {
        assert_eq!(sanitize("Müller Öl"), "Mueller_Oel");
        assert_eq!(sanitize("Straße"), "Strasse");
        assert_eq!(sanitize("ÄÖÜäöü"), "AeOeUeaeoeue");
    }

    #[test]
    fn strips_punctuation_then_collapses_spaces() {
        assert_eq!(sanitize("Gärten & Co."), "Gaerten_Co");
        assert_eq!(sanitize("a   b"), "a_b");
        assert_eq!(sanitize("a . b"), "a_b");
    }

    #[test]
    fn keeps_hyphen_and_underscore() {
        assert_eq!(sanitize("Aloe-Vera_2"), "Aloe-Vera_2");
    }

    #[test]
    fn edge_spaces_become_underscores() {
        assert_eq!(sanitize(" Fern "), "_Fern_");
    }

    #[test]
    fn drops_path_separators() {
        assert_eq!(sanitize("living.room"), "livingroom");
        assert_eq!(sanitize("🌵 Cactus"), "_Cactus");
    }

    #[test]
    fn empty_and_symbol_only_names_sanitize_to_empty() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("!!!"), "");
        assert_eq!(sanitize("&&"), "");
    }

    #[test]
    fn is_idempotent() {
        for name in [
            "Müller Öl",
            "Gärten & Co.",
            " Fern ",
            "a -- b",
            "Große Pflanze",
            "🌵 Cactus",
            "x___y",
        ] {
            let once = sanitize(name);
            assert_eq!(sanitize(&once), once, "not idempotent for {name:?}");
        }
    }
}
