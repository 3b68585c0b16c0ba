//! Station name search.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Maximum number of stations returned by a name search.
pub const MAX_STATION_RESULTS: usize = 10;

/// A station (parent stop) as listed for search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: String,
    pub name: String,
    /// Lowercase name with diacritics stripped, used only for matching.
    pub normalized_name: String,
}

impl Station {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            normalized_name: normalize_name(&name),
            name,
        }
    }
}

/// Fold a name for diacritic-insensitive matching.
///
/// Lowercases, decomposes to NFD and drops combining marks, so
/// "Náměstí Míru" becomes "namesti miru".
pub fn normalize_name(s: &str) -> String {
    s.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// First [`MAX_STATION_RESULTS`] stations whose normalized name contains
/// the normalized query, in the order of `stations`.
pub(crate) fn search<'a>(stations: &'a [Station], query: &str) -> Vec<&'a Station> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = normalize_name(query);
    stations
        .iter()
        .filter(|s| s.normalized_name.contains(&needle))
        .take(MAX_STATION_RESULTS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations(names: &[&str]) -> Vec<Station> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Station::new(format!("S{i}"), *n))
            .collect()
    }

    #[test]
    fn normalizes_czech_names() {
        assert_eq!(normalize_name("Náměstí Míru"), "namesti miru");
        assert_eq!(normalize_name("ŽELIVSKÉHO"), "zelivskeho");
        assert_eq!(normalize_name("Dejvická"), "dejvicka");
        assert_eq!(normalize_name("plain"), "plain");
    }

    #[test]
    fn empty_query_returns_nothing() {
        let list = stations(&["Anděl"]);
        assert!(search(&list, "").is_empty());
    }

    #[test]
    fn matches_substring_without_diacritics() {
        let list = stations(&["Anděl", "Karlovo náměstí", "Náměstí Míru"]);

        let names: Vec<_> = search(&list, "namesti").iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Karlovo náměstí", "Náměstí Míru"]);
    }

    #[test]
    fn caps_results() {
        let names: Vec<String> = (0..25).map(|i| format!("Zastávka {i:02}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let list = stations(&refs);

        let found = search(&list, "zastavka");
        assert_eq!(found.len(), MAX_STATION_RESULTS);
        assert_eq!(found[0].name, "Zastávka 00");
    }

    #[test]
    fn no_match() {
        let list = stations(&["Anděl"]);
        assert!(search(&list, "xyz").is_empty());
    }
}
