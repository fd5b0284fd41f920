//! Vehicle tagging by alias matching.
//!
//! Detection is restricted to the candidate ids configured for the subforum
//! being crawled; a global scan would tag generic terms against unrelated
//! models.

use std::collections::HashMap;

/// Matches vehicle identifiers against text using per-vehicle alias lists.
#[derive(Debug, Clone, Default)]
pub struct VehicleTagger {
    /// Lowercased aliases keyed by vehicle id.
    aliases: HashMap<String, Vec<String>>,
}

impl VehicleTagger {
    pub fn new(aliases: &HashMap<String, Vec<String>>) -> Self {
        let aliases = aliases
            .iter()
            .map(|(id, list)| {
                let list = list
                    .iter()
                    .map(|a| normalize(a))
                    .filter(|a| !a.is_empty())
                    .collect();
                (id.clone(), list)
            })
            .collect();
        Self { aliases }
    }

    /// Aliases for `id`: configured ones, or forms derived from the id.
    pub fn aliases_for(&self, id: &str) -> Vec<String> {
        match self.aliases.get(id) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => derive_aliases(id),
        }
    }

    /// Return the subset of `candidate_ids` mentioned in `text`, in candidate order.
    pub fn detect(&self, text: &str, candidate_ids: &[String]) -> Vec<String> {
        if text.is_empty() || candidate_ids.is_empty() {
            return Vec::new();
        }
        let haystack = normalize(text);

        let mut found: Vec<String> = Vec::new();
        for id in candidate_ids {
            if found.contains(id) {
                continue;
            }
            if self
                .aliases_for(id)
                .iter()
                .any(|alias| haystack.contains(alias.as_str()))
            {
                found.push(id.clone());
            }
        }
        found
    }
}

/// Lowercase and collapse whitespace.
fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `bmw-e46-m3` -> ["bmw-e46-m3", "bmw e46 m3", "bmwe46m3"].
fn derive_aliases(id: &str) -> Vec<String> {
    let lower = normalize(id);
    let spaced = normalize(&lower.replace(['-', '_'], " "));
    let compact: String = spaced.chars().filter(|c| !c.is_whitespace()).collect();

    let mut aliases = vec![lower];
    for alias in [spaced, compact] {
        if !alias.is_empty() && !aliases.contains(&alias) {
            aliases.push(alias);
        }
    }
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_derived_aliases() {
        let tagger = VehicleTagger::default();
        let found = tagger.detect(
            "Just bought an E46 M3, any tips?",
            &ids(&["e46-m3", "e90-m3"]),
        );
        assert_eq!(found, ids(&["e46-m3"]));
    }

    #[test]
    fn test_configured_aliases_case_insensitive() {
        let mut aliases = HashMap::new();
        aliases.insert(
            "toyota-tacoma-3g".to_string(),
            vec!["3rd gen tacoma".to_string(), "Taco".to_string()],
        );
        let tagger = VehicleTagger::new(&aliases);
        let found = tagger.detect("My TACO has a leak", &ids(&["toyota-tacoma-3g"]));
        assert_eq!(found, ids(&["toyota-tacoma-3g"]));
    }

    #[test]
    fn test_only_candidates_are_returned() {
        let mut aliases = HashMap::new();
        aliases.insert("honda-civic".to_string(), vec!["civic".to_string()]);
        aliases.insert("honda-accord".to_string(), vec!["accord".to_string()]);
        let tagger = VehicleTagger::new(&aliases);

        // "accord" is mentioned but not valid in this subforum.
        let found = tagger.detect("Civic vs Accord reliability", &ids(&["honda-civic"]));
        assert_eq!(found, ids(&["honda-civic"]));
    }

    #[test]
    fn test_whitespace_variants_match() {
        let tagger = VehicleTagger::default();
        let found = tagger.detect("the  bmw\ne46   m3 is great", &ids(&["bmw-e46-m3"]));
        assert_eq!(found, ids(&["bmw-e46-m3"]));
    }

    #[test]
    fn test_empty_inputs() {
        let tagger = VehicleTagger::default();
        assert!(tagger.detect("", &ids(&["a"])).is_empty());
        assert!(tagger.detect("text", &[]).is_empty());
    }

    #[test]
    fn test_duplicate_candidates_reported_once() {
        let tagger = VehicleTagger::default();
        let found = tagger.detect("wrx wrx", &ids(&["wrx", "wrx"]));
        assert_eq!(found, ids(&["wrx"]));
    }
}
