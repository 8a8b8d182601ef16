use crate::config::EngineConfig;
use crate::domain::customer::{Customer, normalize_name};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::resolution::{CandidateMatch, ResolutionOutcome};
use crate::error::Result;
use tracing::debug;
use uuid::Uuid;

/// Maps a spoken customer name to a customer identity within one owner's
/// scope.
///
/// Matching is a scored-candidate selection, not a boolean lookup: every
/// customer of the owner gets a similarity score in [0, 1] combining
/// normalized edit distance with a phonetic bonus for transliteration
/// variants (Ramesh/Ramess, Dipak/Deepak). An explicit tie band keeps two
/// distinct people with near-identical names from being silently merged.
pub struct IdentityResolver {
    store: LedgerStoreRef,
    threshold: f64,
    tie_margin: f64,
    phonetic_bonus: f64,
}

impl IdentityResolver {
    pub fn new(store: LedgerStoreRef, config: &EngineConfig) -> Self {
        Self {
            store,
            threshold: config.match_threshold,
            tie_margin: config.tie_margin,
            phonetic_bonus: config.phonetic_bonus,
        }
    }

    /// Resolves `name` against the customers of `owner_id`.
    ///
    /// The gate guarantees a non-empty name before this runs; resolution
    /// itself is pure computation over loaded rows and has no intrinsic
    /// failure mode beyond storage errors.
    pub async fn resolve(&self, name: &str, owner_id: Uuid) -> Result<ResolutionOutcome> {
        let needle = normalize_name(name);
        let customers = self.store.customers_of(owner_id).await?;

        let mut matches: Vec<CandidateMatch> = customers
            .iter()
            .map(|c| CandidateMatch {
                customer: c.id,
                name: c.name.clone(),
                score: self.score(&needle, &c.normalized_name()),
            })
            .filter(|m| m.score >= self.threshold)
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });

        match matches.len() {
            0 => {
                debug!(name, "no candidate reached the match threshold");
                Ok(ResolutionOutcome::Created {
                    customer: Customer::new(owner_id, name.trim()),
                })
            }
            1 => Ok(ResolutionOutcome::Matched {
                customer: matches[0].customer,
                score: matches[0].score,
            }),
            _ => {
                let best = matches[0].score;
                let tied: Vec<CandidateMatch> = matches
                    .iter()
                    .filter(|m| best - m.score < self.tie_margin)
                    .cloned()
                    .collect();
                if tied.len() >= 2 {
                    debug!(name, candidates = tied.len(), "resolution is ambiguous");
                    Ok(ResolutionOutcome::Ambiguous { candidates: tied })
                } else {
                    Ok(ResolutionOutcome::Matched {
                        customer: matches[0].customer,
                        score: best,
                    })
                }
            }
        }
    }

    /// Combined similarity: normalized edit distance plus a flat bonus when
    /// both names collapse to the same phonetic key, capped at 1.0.
    fn score(&self, a: &str, b: &str) -> f64 {
        let sim = edit_similarity(a, b);
        if phonetic_key(a) == phonetic_key(b) {
            (sim + self.phonetic_bonus).min(1.0)
        } else {
            sim
        }
    }
}

/// `1 - lev(a, b) / max(|a|, |b|)` over characters.
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Soundex-style code tolerant of the transliteration habits common in the
/// supported dialects: aspirated consonants lose the trailing `h`
/// (kh/gh/th/dh/bh/ph), doubled vowels collapse (aa/ee/oo), and w/v and z/j
/// are interchangeable.
pub fn phonetic_key(name: &str) -> String {
    let letters: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let folded = fold_transliteration(&letters);

    let mut chars = folded.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut key = String::with_capacity(4);
    key.push(first.to_ascii_uppercase());

    let mut prev = consonant_class(first);
    for c in chars {
        match consonant_class(c) {
            Some(code) => {
                if prev != Some(code) {
                    key.push(code);
                    if key.len() == 4 {
                        break;
                    }
                }
                prev = Some(code);
            }
            // Vowels separate consonant runs; h keeps the run together,
            // matching classic Soundex.
            None if c == 'h' => {}
            None => prev = None,
        }
    }
    while key.len() < 4 {
        key.push('0');
    }
    key
}

fn fold_transliteration(letters: &str) -> String {
    let mut out = String::with_capacity(letters.len());
    let chars: Vec<char> = letters.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let pair = (chars[i], chars.get(i + 1).copied());
        match pair {
            ('b' | 'c' | 'd' | 'g' | 'j' | 'k' | 't', Some('h')) => {
                out.push(chars[i]);
                i += 2;
            }
            ('p', Some('h')) => {
                out.push('f');
                i += 2;
            }
            ('s', Some('h')) => {
                out.push('s');
                i += 2;
            }
            ('a', Some('a')) | ('i', Some('i')) | ('u', Some('u')) => {
                out.push(chars[i]);
                i += 2;
            }
            ('e', Some('e')) => {
                out.push('i');
                i += 2;
            }
            ('o', Some('o')) => {
                out.push('u');
                i += 2;
            }
            ('w', _) => {
                out.push('v');
                i += 1;
            }
            ('z', _) => {
                out.push('j');
                i += 1;
            }
            _ => {
                out.push(chars[i]);
                i += 1;
            }
        }
    }
    out
}

fn consonant_class(c: char) -> Option<char> {
    match c {
        'b' | 'f' | 'p' | 'v' => Some('1'),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
        'd' | 't' => Some('3'),
        'l' => Some('4'),
        'm' | 'n' => Some('5'),
        'r' => Some('6'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::LedgerStore;
    use crate::infrastructure::in_memory::InMemoryLedgerStore;
    use std::sync::Arc;

    fn resolver(store: Arc<InMemoryLedgerStore>) -> IdentityResolver {
        IdentityResolver::new(store, &EngineConfig::default())
    }

    async fn seed(store: &InMemoryLedgerStore, owner: Uuid, name: &str) -> Uuid {
        let customer = Customer::new(owner, name);
        let id = customer.id;
        store.insert_customer(customer).await;
        id
    }

    #[test]
    fn test_edit_similarity() {
        assert_eq!(edit_similarity("ramesh", "ramesh"), 1.0);
        assert!((edit_similarity("ramesh", "ramess") - (1.0 - 1.0 / 6.0)).abs() < 1e-9);
        assert_eq!(edit_similarity("", ""), 1.0);
        assert_eq!(edit_similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_phonetic_key_transliteration_variants() {
        assert_eq!(phonetic_key("Dipak"), phonetic_key("Deepak"));
        assert_eq!(phonetic_key("Wasim"), phonetic_key("Vasim"));
        assert_eq!(phonetic_key("Shyam"), phonetic_key("Syam"));
        assert_eq!(phonetic_key("Khan"), phonetic_key("Kan"));
        assert_ne!(phonetic_key("Ramesh"), phonetic_key("Suresh"));
    }

    #[tokio::test]
    async fn test_exact_name_matches() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let owner = Uuid::new_v4();
        let id = seed(&store, owner, "Ramesh").await;
        seed(&store, owner, "Suresh").await;

        let outcome = resolver(store).resolve("Ramesh", owner).await.unwrap();
        match outcome {
            ResolutionOutcome::Matched { customer, score } => {
                assert_eq!(customer, id);
                assert_eq!(score, 1.0);
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_near_miss_matches_same_customer() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let owner = Uuid::new_v4();
        let id = seed(&store, owner, "Ramesh").await;

        // One substitution plus an equal phonetic key clears the threshold.
        let outcome = resolver(store).resolve("Ramess", owner).await.unwrap();
        assert!(matches!(
            outcome,
            ResolutionOutcome::Matched { customer, .. } if customer == id
        ));
    }

    #[tokio::test]
    async fn test_unknown_name_synthesizes_new_customer() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let owner = Uuid::new_v4();
        seed(&store, owner, "Ramesh").await;

        let outcome = resolver(Arc::clone(&store))
            .resolve("Dinesh", owner)
            .await
            .unwrap();
        match outcome {
            ResolutionOutcome::Created { customer } => {
                assert_eq!(customer.name, "Dinesh");
                assert_eq!(customer.owner, owner);
                assert_eq!(customer.balance, crate::domain::customer::Balance::ZERO);
                // Nothing persisted yet: creation belongs to the atomic unit.
                assert!(store.customer(owner, customer.id).await.unwrap().is_none());
            }
            other => panic!("expected creation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tied_candidates_are_ambiguous() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let owner = Uuid::new_v4();
        seed(&store, owner, "Rama").await;
        seed(&store, owner, "Raam").await;

        let outcome = resolver(store).resolve("Ram", owner).await.unwrap();
        match outcome {
            ResolutionOutcome::Ambiguous { candidates } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates[0].score >= candidates[1].score);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clear_leader_wins_over_weaker_match() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let owner = Uuid::new_v4();
        let ramesh = seed(&store, owner, "Ramesh").await;
        seed(&store, owner, "Rajesh").await;

        // Rajesh also clears the threshold (0.83) but trails the exact
        // match by far more than the tie margin.
        let outcome = resolver(store).resolve("Ramesh", owner).await.unwrap();
        assert!(matches!(
            outcome,
            ResolutionOutcome::Matched { customer, .. } if customer == ramesh
        ));
    }

    #[tokio::test]
    async fn test_resolution_is_owner_scoped() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let owner_a = Uuid::new_v4();
        let owner_b = Uuid::new_v4();
        seed(&store, owner_a, "Ramesh").await;

        let outcome = resolver(store).resolve("Ramesh", owner_b).await.unwrap();
        assert!(matches!(outcome, ResolutionOutcome::Created { .. }));
    }
}
