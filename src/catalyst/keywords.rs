//! Keyword tables for the catalyst classifier.
//!
//! Twelve categories, each with a fixed keyword list and an impact weight.
//! Classification is case-insensitive substring matching over the headline;
//! a category contributes its weight at most once per headline.

use crate::domain::news::{CatalystType, Sentiment};

/// Catalyst keyword category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Earnings,
    Fda,
    Merger,
    Analyst,
    Insider,
    Legal,
    Product,
    Guidance,
    Partnership,
    Ipo,
    Bankruptcy,
    Dividend,
}

/// Weight tier a category carries toward the catalyst score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    High,
    Medium,
}

impl Impact {
    pub fn weight(&self) -> f64 {
        match self {
            Impact::High => 0.30,
            Impact::Medium => 0.15,
        }
    }
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Earnings,
        Category::Fda,
        Category::Merger,
        Category::Analyst,
        Category::Insider,
        Category::Legal,
        Category::Product,
        Category::Guidance,
        Category::Partnership,
        Category::Ipo,
        Category::Bankruptcy,
        Category::Dividend,
    ];

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Earnings => &["earnings", "revenue", "eps", "quarterly results", "profit report"],
            Category::Fda => &["fda", "approval", "clinical trial", "phase 3", "phase iii"],
            Category::Merger => &["merger", "acquisition", "acquire", "buyout", "takeover"],
            Category::Analyst => &["upgrade", "downgrade", "price target", "initiates coverage", "rating"],
            Category::Insider => &["insider buying", "insider selling", "ceo purchase", "director buys", "13d filing"],
            Category::Legal => &["lawsuit", "settlement", "investigation", "sec probe", "fraud charges"],
            Category::Product => &["launches", "unveils", "new product", "breakthrough", "patent granted"],
            Category::Guidance => &["guidance", "outlook", "forecast", "raises full-year", "cuts full-year"],
            Category::Partnership => &["partnership", "collaboration", "strategic deal", "contract award", "joint venture"],
            Category::Ipo => &["ipo", "public offering", "direct listing", "market debut"],
            Category::Bankruptcy => &["bankruptcy", "chapter 11", "default", "insolvency", "delisting"],
            Category::Dividend => &["dividend", "buyback", "share repurchase", "special distribution"],
        }
    }

    pub fn impact(&self) -> Impact {
        match self {
            Category::Earnings
            | Category::Fda
            | Category::Merger
            | Category::Bankruptcy
            | Category::Guidance
            | Category::Analyst => Impact::High,
            _ => Impact::Medium,
        }
    }

    /// Map a matched category to the catalyst type, refining with headline
    /// text where the category alone is ambiguous (beat/miss, up/downgrade).
    pub fn catalyst_type(&self, headline_lower: &str) -> CatalystType {
        match self {
            Category::Earnings => {
                if headline_has_beat(headline_lower) {
                    CatalystType::EarningsBeat
                } else if headline_has_miss(headline_lower) {
                    CatalystType::EarningsMiss
                } else {
                    CatalystType::Earnings
                }
            }
            Category::Fda => CatalystType::FdaApproval,
            Category::Merger => CatalystType::Merger,
            Category::Analyst => {
                if headline_lower.contains("downgrade") {
                    CatalystType::Downgrade
                } else {
                    CatalystType::Upgrade
                }
            }
            Category::Insider => CatalystType::Insider,
            Category::Legal => CatalystType::Lawsuit,
            Category::Product => CatalystType::ProductLaunch,
            Category::Guidance => CatalystType::Guidance,
            Category::Partnership => CatalystType::Partnership,
            Category::Ipo => CatalystType::Ipo,
            Category::Bankruptcy => CatalystType::Bankruptcy,
            Category::Dividend => CatalystType::Dividend,
        }
    }
}

fn headline_has_beat(headline_lower: &str) -> bool {
    ["beats", "beat estimates", "tops estimates", "exceeds expectations"]
        .iter()
        .any(|k| headline_lower.contains(k))
}

fn headline_has_miss(headline_lower: &str) -> bool {
    ["misses", "miss estimates", "falls short", "below expectations"]
        .iter()
        .any(|k| headline_lower.contains(k))
}

/// All categories matched by a headline, with their weights.
pub fn classify_headline(headline: &str) -> Vec<(Category, f64)> {
    let lower = headline.to_lowercase();
    Category::ALL
        .iter()
        .filter(|c| c.keywords().iter().any(|k| lower.contains(k)))
        .map(|c| (*c, c.impact().weight()))
        .collect()
}

/// Static type-to-sentiment map, with headline overrides already folded
/// into the type (beat/miss, up/downgrade, raised/cut guidance).
pub fn resolve_sentiment(catalyst_type: CatalystType, headline_lower: &str) -> Sentiment {
    match catalyst_type {
        CatalystType::EarningsBeat
        | CatalystType::FdaApproval
        | CatalystType::Merger
        | CatalystType::Upgrade
        | CatalystType::Insider
        | CatalystType::ProductLaunch
        | CatalystType::Partnership
        | CatalystType::Dividend => Sentiment::Positive,

        CatalystType::EarningsMiss
        | CatalystType::Downgrade
        | CatalystType::Lawsuit
        | CatalystType::Bankruptcy => Sentiment::Negative,

        CatalystType::Guidance => {
            if headline_lower.contains("raises") || headline_lower.contains("above") {
                Sentiment::Positive
            } else if headline_lower.contains("cuts")
                || headline_lower.contains("lowers")
                || headline_lower.contains("below")
            {
                Sentiment::Negative
            } else {
                Sentiment::Neutral
            }
        }

        CatalystType::Earnings | CatalystType::Ipo | CatalystType::Other => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_single_category() {
        let hits = classify_headline("Acme Corp announces quarterly results");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, Category::Earnings);
        assert_eq!(hits[0].1, 0.30);
    }

    #[test]
    fn test_classify_multiple_categories() {
        let hits = classify_headline("FDA approval sends Acme higher as analysts upgrade rating");
        let cats: Vec<Category> = hits.iter().map(|(c, _)| *c).collect();
        assert!(cats.contains(&Category::Fda));
        assert!(cats.contains(&Category::Analyst));
    }

    #[test]
    fn test_classify_no_match() {
        assert!(classify_headline("Company holds annual picnic").is_empty());
    }

    #[test]
    fn test_category_counted_once() {
        // Two earnings keywords, one category hit
        let hits = classify_headline("Earnings call: revenue up 20%");
        assert_eq!(hits.iter().filter(|(c, _)| *c == Category::Earnings).count(), 1);
    }

    #[test]
    fn test_beat_miss_refinement() {
        assert_eq!(
            Category::Earnings.catalyst_type("acme beats estimates on earnings"),
            CatalystType::EarningsBeat
        );
        assert_eq!(
            Category::Earnings.catalyst_type("acme misses on revenue"),
            CatalystType::EarningsMiss
        );
        assert_eq!(
            Category::Earnings.catalyst_type("acme reports earnings"),
            CatalystType::Earnings
        );
    }

    #[test]
    fn test_sentiment_map() {
        assert_eq!(resolve_sentiment(CatalystType::FdaApproval, ""), Sentiment::Positive);
        assert_eq!(resolve_sentiment(CatalystType::Bankruptcy, ""), Sentiment::Negative);
        assert_eq!(resolve_sentiment(CatalystType::Ipo, ""), Sentiment::Neutral);
    }

    #[test]
    fn test_guidance_sentiment_from_headline() {
        assert_eq!(
            resolve_sentiment(CatalystType::Guidance, "acme raises full-year outlook"),
            Sentiment::Positive
        );
        assert_eq!(
            resolve_sentiment(CatalystType::Guidance, "acme cuts guidance"),
            Sentiment::Negative
        );
        assert_eq!(
            resolve_sentiment(CatalystType::Guidance, "acme issues guidance"),
            Sentiment::Neutral
        );
    }
}
