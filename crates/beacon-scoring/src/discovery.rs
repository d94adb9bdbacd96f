//! Theme discovery by tag co-occurrence.
//!
//! Every analysed feedback item is assigned an anchor: the pair of its tags
//! that co-occurs most often across the whole batch, or failing that its
//! single most common tag. Items sharing an anchor become one candidate theme.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::alignment::to_score;
use crate::params::DiscoveryParams;

/// A feedback item as seen by discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryItem {
    pub id: String,
    pub customer_id: Option<String>,
    pub tags: Vec<String>,
    pub sentiment: Option<f64>,
}

/// A proposed theme, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTheme {
    pub title: String,
    pub tags: Vec<String>,
    pub item_ids: Vec<String>,
    pub mention_count: u32,
    pub customer_count: u32,
    pub avg_sentiment: f64,
    pub customer_signal_score: u8,
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn title_case(tag: &str) -> String {
    tag.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

struct Counts {
    tags: BTreeMap<String, usize>,
    pairs: BTreeMap<(String, String), usize>,
}

fn count(items: &[Vec<String>]) -> Counts {
    let mut tags = BTreeMap::new();
    let mut pairs = BTreeMap::new();
    for item_tags in items {
        for (i, a) in item_tags.iter().enumerate() {
            *tags.entry(a.clone()).or_insert(0) += 1;
            for b in &item_tags[i + 1..] {
                *pairs.entry((a.clone(), b.clone())).or_insert(0) += 1;
            }
        }
    }
    Counts { tags, pairs }
}

/// Tags are sorted, so `(a, b)` pairs are already in canonical order and
/// iteration order gives the lexicographic tie-break.
fn anchor(item_tags: &[String], counts: &Counts) -> Option<Vec<String>> {
    let mut best_pair: Option<(&String, &String, usize)> = None;
    for (i, a) in item_tags.iter().enumerate() {
        for b in &item_tags[i + 1..] {
            let n = counts
                .pairs
                .get(&(a.clone(), b.clone()))
                .copied()
                .unwrap_or(0);
            if n >= 2 && best_pair.is_none_or(|(_, _, best)| n > best) {
                best_pair = Some((a, b, n));
            }
        }
    }
    if let Some((a, b, _)) = best_pair {
        return Some(vec![a.clone(), b.clone()]);
    }

    let mut best_tag: Option<(&String, usize)> = None;
    for tag in item_tags {
        let n = counts.tags.get(tag).copied().unwrap_or(0);
        if best_tag.is_none_or(|(_, best)| n > best) {
            best_tag = Some((tag, n));
        }
    }
    best_tag.map(|(tag, _)| vec![tag.clone()])
}

#[allow(clippy::cast_precision_loss)]
fn signal_score(customers: usize, mentions: usize, avg_sentiment: f64, params: &DiscoveryParams) -> u8 {
    let raw = (customers as f64).mul_add(
        params.customer_weight,
        (mentions as f64).mul_add(
            params.mention_weight,
            (-avg_sentiment).max(0.0) * params.negativity_weight,
        ),
    );
    to_score(raw.min(100.0))
}

/// Group items into candidate themes, strongest signal first.
#[must_use]
pub fn discover_themes(items: &[DiscoveryItem], params: &DiscoveryParams) -> Vec<CandidateTheme> {
    let normalized: Vec<Vec<String>> = items.iter().map(|i| normalize_tags(&i.tags)).collect();
    let counts = count(&normalized);

    let mut groups: BTreeMap<Vec<String>, Vec<usize>> = BTreeMap::new();
    for (idx, tags) in normalized.iter().enumerate() {
        if let Some(key) = anchor(tags, &counts) {
            groups.entry(key).or_default().push(idx);
        }
    }

    let mut candidates: Vec<CandidateTheme> = groups
        .into_iter()
        .filter(|(_, members)| members.len() >= params.min_mentions)
        .map(|(anchor_tags, members)| build_candidate(&anchor_tags, &members, items, &normalized, params))
        .collect();

    candidates.sort_by(|a, b| {
        b.customer_signal_score
            .cmp(&a.customer_signal_score)
            .then_with(|| a.title.cmp(&b.title))
    });

    debug!(
        items = items.len(),
        candidates = candidates.len(),
        "theme discovery finished"
    );
    candidates
}

#[allow(clippy::cast_precision_loss)]
fn build_candidate(
    anchor_tags: &[String],
    members: &[usize],
    items: &[DiscoveryItem],
    normalized: &[Vec<String>],
    params: &DiscoveryParams,
) -> CandidateTheme {
    let mut other: BTreeMap<&String, usize> = BTreeMap::new();
    for &idx in members {
        for tag in &normalized[idx] {
            if !anchor_tags.contains(tag) {
                *other.entry(tag).or_insert(0) += 1;
            }
        }
    }
    let mut other: Vec<(&String, usize)> = other.into_iter().collect();
    other.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut tags: Vec<String> = anchor_tags.to_vec();
    tags.extend(other.into_iter().map(|(t, _)| t.clone()));
    tags.truncate(params.max_theme_tags.max(anchor_tags.len()));

    let customers: HashSet<&str> = members
        .iter()
        .filter_map(|&idx| items[idx].customer_id.as_deref())
        .collect();
    let sentiments: Vec<f64> = members.iter().filter_map(|&idx| items[idx].sentiment).collect();
    let avg_sentiment = if sentiments.is_empty() {
        0.0
    } else {
        sentiments.iter().sum::<f64>() / sentiments.len() as f64
    };

    CandidateTheme {
        title: anchor_tags
            .iter()
            .map(|t| title_case(t))
            .collect::<Vec<_>>()
            .join(" & "),
        tags,
        item_ids: members.iter().map(|&idx| items[idx].id.clone()).collect(),
        mention_count: u32::try_from(members.len()).unwrap_or(u32::MAX),
        customer_count: u32::try_from(customers.len()).unwrap_or(u32::MAX),
        avg_sentiment,
        customer_signal_score: signal_score(customers.len(), members.len(), avg_sentiment, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(id: &str, customer: Option<&str>, tags: &[&str], sentiment: f64) -> DiscoveryItem {
        DiscoveryItem {
            id: id.into(),
            customer_id: customer.map(Into::into),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            sentiment: Some(sentiment),
        }
    }

    fn discover(items: &[DiscoveryItem]) -> Vec<CandidateTheme> {
        discover_themes(items, &DiscoveryParams::default())
    }

    #[test]
    fn groups_by_most_frequent_pair() {
        let items = vec![
            item("fbk-1", Some("cus-1"), &["Export", "csv", "slow"], -0.6),
            item("fbk-2", Some("cus-2"), &["csv", "export"], -0.4),
            item("fbk-3", Some("cus-2"), &["export", "CSV "], -0.2),
            item("fbk-4", Some("cus-3"), &["onboarding"], 0.5),
        ];
        let themes = discover(&items);
        assert_eq!(themes.len(), 1);

        let theme = &themes[0];
        assert_eq!(theme.title, "Csv & Export");
        assert_eq!(theme.tags, vec!["csv", "export", "slow"]);
        assert_eq!(theme.item_ids, vec!["fbk-1", "fbk-2", "fbk-3"]);
        assert_eq!(theme.mention_count, 3);
        assert_eq!(theme.customer_count, 2);
        assert!((theme.avg_sentiment + 0.4).abs() < 1e-9);
        // 2×6 + 3×2 + 0.4×20 = 26
        assert_eq!(theme.customer_signal_score, 26);
    }

    #[test]
    fn falls_back_to_single_tag_and_drops_small_groups() {
        let items = vec![
            item("fbk-1", Some("cus-1"), &["billing", "invoice"], 0.0),
            item("fbk-2", Some("cus-2"), &["billing", "refund"], 0.0),
            item("fbk-3", None, &["sso"], 0.0),
            item("fbk-4", None, &[], 0.0),
        ];
        let themes = discover(&items);
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].title, "Billing");
        assert_eq!(themes[0].tags, vec!["billing", "invoice", "refund"]);
        assert_eq!(themes[0].customer_count, 2);
    }

    #[test]
    fn sorted_by_signal_then_title() {
        let items = vec![
            item("a1", Some("c1"), &["alpha"], 0.0),
            item("a2", Some("c2"), &["alpha"], 0.0),
            item("b1", Some("c1"), &["beta"], -1.0),
            item("b2", Some("c2"), &["beta"], -1.0),
            item("g1", Some("c1"), &["gamma"], 0.0),
            item("g2", Some("c2"), &["gamma"], 0.0),
        ];
        let titles: Vec<String> = discover(&items).into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Beta", "Alpha", "Gamma"]);
    }

    #[test]
    fn signal_is_capped() {
        let items: Vec<DiscoveryItem> = (0..30)
            .map(|i| item(&format!("fbk-{i}"), Some(&format!("cus-{i}")), &["outage"], -1.0))
            .collect();
        let themes = discover(&items);
        assert_eq!(themes[0].customer_signal_score, 100);
    }

    #[test]
    fn theme_tags_respect_limit() {
        let params = DiscoveryParams {
            max_theme_tags: 3,
            ..DiscoveryParams::default()
        };
        let items = vec![
            item("1", None, &["api", "docs", "rate", "limits", "sdk"], 0.0),
            item("2", None, &["api", "docs", "webhooks"], 0.0),
        ];
        let themes = discover_themes(&items, &params);
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].tags.len(), 3);
        assert_eq!(&themes[0].tags[..2], &["api".to_string(), "docs".to_string()]);
    }
}
