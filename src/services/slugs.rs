// Slug generation for participant profile URLs.
//
// Uniqueness is decided by the store's unique constraint; callers walk these
// candidates and retry on conflict.

use uuid::Uuid;

const MAX_SLUG_LEN: usize = 48;
const FALLBACK_BASE: &str = "participant";

/// Lowercase ASCII letters and digits, everything else collapsed into single
/// dashes. Common Latin accents are folded first so "Nörth" stays "north".
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if let Some(folded) = fold_latin(c) {
            slug.push_str(folded);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let mut slug: String = slug.trim_end_matches('-').chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'ĳ' => "ij",
        'ł' | 'ľ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ß' => "ss",
        'ś' | 'š' | 'ş' => "s",
        'ť' | 'ţ' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// Short random token used when a base is empty or its numbered variants ran out.
pub fn random_token() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Candidates in the order they are tried: `base`, `base-2` .. `base-<attempts>`,
/// then `base-<token>` a few times.
pub fn candidates(base: &str, attempts: u32) -> Vec<String> {
    let base = if base.is_empty() { FALLBACK_BASE } else { base };
    let mut out = Vec::with_capacity(attempts as usize + 3);
    out.push(base.to_string());
    for n in 2..=attempts.max(1) {
        out.push(format!("{}-{}", base, n));
    }
    for _ in 0..3 {
        out.push(format!("{}-{}", base, random_token()));
    }
    out
}

/// Base slug: the requested slug, else the name, else a random token.
pub fn base_for(requested: Option<&str>, name: &str) -> String {
    let from_request = requested.map(slugify).filter(|s| !s.is_empty());
    from_request
        .or_else(|| Some(slugify(name)).filter(|s| !s.is_empty()))
        .unwrap_or_else(random_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_normalises() {
        assert_eq!(slugify("  Studio Nörth & Co. "), "studio-north-co");
        assert_eq!(slugify("Café Straße"), "cafe-strasse");
        assert_eq!(slugify("Ĳssalon 東京"), "ijssalon");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("A".repeat(80).as_str()).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn candidates_are_distinct_and_start_with_base() {
        let c = candidates("studio", 4);
        assert_eq!(&c[..4], &["studio", "studio-2", "studio-3", "studio-4"]);
        let mut unique = c.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), c.len());
    }

    #[test]
    fn base_prefers_request_then_name() {
        assert_eq!(base_for(Some("My Shop"), "Ada"), "my-shop");
        assert_eq!(base_for(None, "Ada Lovelace"), "ada-lovelace");
        assert_eq!(base_for(Some("!!"), "??").len(), 8);
    }
}
