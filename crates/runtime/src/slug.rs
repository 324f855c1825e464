use rand::random_range;

const SLUG_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const MIN_SLUG_LEN: usize = 3;
const SYNTHETIC_PREFIX: &str = "card-";
const SYNTHETIC_SUFFIX_LEN: usize = 6;
const DISAMBIGUATION_SUFFIX_LEN: usize = 4;

/// Turns a display name into a URL-safe slug candidate: lowercase, runs of
/// characters outside `[a-z0-9]` collapse to single hyphens, first and last
/// name joined with one hyphen. Names with fewer than three usable
/// characters fall back to a synthetic `card-xxxxxx` identifier so the
/// result is always a valid slug.
pub fn generate(first_name: &str, last_name: &str) -> String {
    let joined = [sanitize(first_name), sanitize(last_name)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if joined.len() < MIN_SLUG_LEN {
        synthetic()
    } else {
        joined
    }
}

/// Runs a client-proposed slug through the same sanitizer. `None` when the
/// proposal has too few usable characters to stand on its own.
pub fn normalize(proposed: &str) -> Option<String> {
    let cleaned = sanitize(proposed);
    (cleaned.len() >= MIN_SLUG_LEN).then_some(cleaned)
}

/// Fresh collision-avoidance candidate from the same base.
pub fn disambiguate(base: &str) -> String {
    format!("{base}-{}", random_suffix(DISAMBIGUATION_SUFFIX_LEN))
}

fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for c in input.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    out
}

fn synthetic() -> String {
    format!("{SYNTHETIC_PREFIX}{}", random_suffix(SYNTHETIC_SUFFIX_LEN))
}

fn random_suffix(len: usize) -> String {
    (0..len)
        .map(|_| SLUG_CHARSET[random_range(0..SLUG_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_and_lowercases_names() {
        assert_eq!(generate("Jane", "Doe"), "jane-doe");
        assert_eq!(generate("ALICE", "smith"), "alice-smith");
    }

    #[test]
    fn collapses_symbol_runs_to_single_hyphens() {
        assert_eq!(generate("Jöhn", "  Q. "), "j-hn-q");
        assert_eq!(generate("Mary Ann", "O'Brien"), "mary-ann-o-brien");
    }

    #[test]
    fn single_name_is_enough() {
        assert_eq!(generate("Jane", ""), "jane");
    }

    #[test]
    fn falls_back_to_synthetic_identifier() {
        for (first, last) in [("", ""), ("!", "?"), ("J", "")] {
            let slug = generate(first, last);
            let suffix = slug.strip_prefix(SYNTHETIC_PREFIX).unwrap_or_else(|| {
                panic!("expected synthetic slug for {first:?}/{last:?}, got {slug:?}")
            });
            assert!(suffix.len() >= 6);
            assert!(suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn disambiguation_keeps_base_prefix() {
        let candidate = disambiguate("jane-doe");
        assert!(candidate.starts_with("jane-doe-"));
        assert_eq!(candidate.len(), "jane-doe-".len() + 4);
    }

    #[test]
    fn normalizes_client_proposals() {
        assert_eq!(normalize("My Card!"), Some("my-card".to_string()));
        assert_eq!(normalize("jane-doe"), Some("jane-doe".to_string()));
        assert_eq!(normalize("__"), None);
        assert_eq!(normalize(""), None);
    }
}
