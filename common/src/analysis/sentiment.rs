// News sentiment scoring
//
// A small finance-flavored lexicon scores disclosure headlines and remarks
// with a polarity in [-1, 1]. Recent items count for more: the weight decays
// linearly to zero over thirty days. Items without a parseable published
// date are skipped.

use crate::models::NewsItem;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use std::collections::HashSet;

const DECAY_DAYS: f64 = 30.0;

lazy_static! {
    static ref POSITIVE: HashSet<&'static str> = [
        "dividend", "bonus", "profit", "profits", "growth", "gain", "gains", "rise",
        "rises", "increase", "increased", "record", "strong", "improved", "improvement",
        "expansion", "approved", "approval", "success", "successful", "surge", "high",
        "upgrade", "upgraded", "award", "awarded", "milestone", "launch", "launched",
    ]
    .into_iter()
    .collect();
    static ref NEGATIVE: HashSet<&'static str> = [
        "loss", "losses", "decline", "declined", "fall", "falls", "fell", "drop",
        "dropped", "penalty", "fine", "fined", "fraud", "suspended", "suspension",
        "weak", "downgrade", "downgraded", "default", "defaulted", "delay", "delayed",
        "litigation", "lawsuit", "resign", "resigned", "halt", "halted", "warning",
    ]
    .into_iter()
    .collect();
}

/// Lexicon polarity of a piece of text, in [-1, 1]
pub fn polarity(text: &str) -> f64 {
    let mut scored = 0u32;
    let mut total = 0i64;

    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let token = token.to_lowercase();
        if POSITIVE.contains(token.as_str()) {
            scored += 1;
            total += 1;
        } else if NEGATIVE.contains(token.as_str()) {
            scored += 1;
            total -= 1;
        }
    }

    if scored == 0 {
        0.0
    } else {
        total as f64 / scored as f64
    }
}

/// Recency-weighted sentiment score for one stock's news
///
/// Returns 0 when there is no usable news.
pub fn news_sentiment(items: &[NewsItem], today: NaiveDate) -> f64 {
    let mut scores = Vec::new();

    for item in items {
        let Some(published) = item
            .published_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };

        let days_old = (today - published).num_days() as f64;
        let weight = (1.0 - days_old / DECAY_DAYS).max(0.0);

        let text = format!(
            "{} {}",
            item.news_headline.as_deref().unwrap_or(""),
            item.remarks.as_deref().unwrap_or("")
        );
        scores.push(polarity(&text) * weight);
    }

    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(headline: &str, published: Option<&str>) -> NewsItem {
        NewsItem {
            symbol: Some("NABIL".into()),
            news_headline: Some(headline.into()),
            remarks: None,
            published_date: published.map(String::from),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[test]
    fn test_polarity_sign() {
        assert!(polarity("Record profit and dividend announced") > 0.0);
        assert!(polarity("Trading suspended after fraud warning") < 0.0);
        assert_eq!(polarity("Quarterly report published"), 0.0);
    }

    #[test]
    fn test_polarity_is_bounded() {
        assert_eq!(polarity("profit profit profit"), 1.0);
        assert_eq!(polarity("loss loss"), -1.0);
    }

    #[test]
    fn test_no_news_scores_zero() {
        assert_eq!(news_sentiment(&[], today()), 0.0);
    }

    #[test]
    fn test_recent_news_outweighs_old_news() {
        let recent = news_sentiment(&[item("Record profit", Some("2025-06-29"))], today());
        let old = news_sentiment(&[item("Record profit", Some("2025-06-05"))], today());
        assert!(recent > old);
        assert!(old > 0.0);
    }

    #[test]
    fn test_news_older_than_decay_window_is_ignored() {
        let stale = news_sentiment(&[item("Record profit", Some("2025-01-01"))], today());
        assert_eq!(stale, 0.0);
    }

    #[test]
    fn test_malformed_dates_are_skipped() {
        let items = [
            item("Record profit", Some("not-a-date")),
            item("Record profit", None),
        ];
        assert_eq!(news_sentiment(&items, today()), 0.0);
    }
}
