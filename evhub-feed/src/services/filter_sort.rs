//! On-demand filtering and sorting of a published event list
//!
//! Pure functions; inputs are never mutated.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::UnifiedEvent;

/// Sort mode selected by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Ascending start; undated events last
    #[default]
    Date,
    /// Ascending price; free counts as zero
    PriceAsc,
    /// Descending price; free events last
    PriceDesc,
    /// Title, case-insensitive first
    Title,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Date => "date",
            SortMode::PriceAsc => "price-asc",
            SortMode::PriceDesc => "price-desc",
            SortMode::Title => "title",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(SortMode::Date),
            "price-asc" => Ok(SortMode::PriceAsc),
            "price-desc" => Ok(SortMode::PriceDesc),
            "title" => Ok(SortMode::Title),
            other => Err(format!(
                "unknown sort mode '{}' (expected date, price-asc, price-desc, title)",
                other
            )),
        }
    }
}

/// Keep events matching the category (exact) and the search text
///
/// Search is a case-insensitive substring match on title, location, or
/// organizer. `None` or blank filters match everything.
pub fn filter_events(
    events: &[UnifiedEvent],
    category: Option<&str>,
    search: Option<&str>,
) -> Vec<UnifiedEvent> {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    events
        .iter()
        .filter(|e| match category {
            Some(category) => e.category.as_deref() == Some(category),
            None => true,
        })
        .filter(|e| match &needle {
            Some(needle) => matches_search(e, needle),
            None => true,
        })
        .cloned()
        .collect()
}

fn matches_search(event: &UnifiedEvent, needle: &str) -> bool {
    let contains = |field: Option<&str>| {
        field
            .map(|value| value.to_lowercase().contains(needle))
            .unwrap_or(false)
    };

    contains(Some(&event.title))
        || contains(event.location.as_deref())
        || contains(event.organizer_name.as_deref())
}

/// Return a sorted copy of `events` (stable)
pub fn sort_events(events: &[UnifiedEvent], mode: SortMode) -> Vec<UnifiedEvent> {
    let mut sorted = events.to_vec();

    match mode {
        SortMode::Date => sorted.sort_by(|a, b| match (a.start_instant, b.start_instant) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        SortMode::PriceAsc => sorted.sort_by(|a, b| {
            ascending_price(a).total_cmp(&ascending_price(b))
        }),
        SortMode::PriceDesc => sorted.sort_by(|a, b| {
            descending_price(b).total_cmp(&descending_price(a))
        }),
        SortMode::Title => sorted.sort_by(|a, b| compare_titles(&a.title, &b.title)),
    }

    sorted
}

fn ascending_price(event: &UnifiedEvent) -> f64 {
    if event.is_free() {
        0.0
    } else {
        event.price.unwrap_or(0.0)
    }
}

// Free events sink below every priced event in the descending order.
fn descending_price(event: &UnifiedEvent) -> f64 {
    if event.is_free() {
        f64::NEG_INFINITY
    } else {
        event.price.unwrap_or(0.0)
    }
}

/// Accent- and case-insensitive primary comparison, exact string as tie-break
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    title_key(a)
        .cmp(&title_key(b))
        .then_with(|| a.cmp(b))
}

/// Fold a title for collation: decompose, strip combining marks, lowercase
fn title_key(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceOrigin;
    use chrono::{TimeZone, Utc};

    fn event(title: &str) -> UnifiedEvent {
        UnifiedEvent::new(title.to_lowercase(), title, SourceOrigin::Local)
    }

    fn priced(title: &str, price: f64, free: bool) -> UnifiedEvent {
        let mut e = event(title);
        e.price = Some(price);
        e.is_free = Some(free);
        e
    }

    fn titles(events: &[UnifiedEvent]) -> Vec<&str> {
        events.iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn test_sort_mode_parse() {
        assert_eq!("date".parse::<SortMode>().unwrap(), SortMode::Date);
        assert_eq!("price-asc".parse::<SortMode>().unwrap(), SortMode::PriceAsc);
        assert_eq!("Price-Desc".parse::<SortMode>().unwrap(), SortMode::PriceDesc);
        assert_eq!("title".parse::<SortMode>().unwrap(), SortMode::Title);
        assert!("distance".parse::<SortMode>().is_err());
        assert_eq!(SortMode::PriceDesc.to_string(), "price-desc");
    }

    #[test]
    fn test_price_desc_puts_free_last() {
        let list = vec![priced("A", 0.0, true), priced("B", 50.0, false)];
        assert_eq!(titles(&sort_events(&list, SortMode::PriceDesc)), vec!["B", "A"]);
        assert_eq!(titles(&sort_events(&list, SortMode::PriceAsc)), vec!["A", "B"]);
    }

    #[test]
    fn test_price_desc_orders_paid_events() {
        let list = vec![
            priced("Cheap", 5.0, false),
            priced("Free", 0.0, true),
            priced("Pricey", 120.0, false),
            priced("Mid", 40.0, false),
        ];
        assert_eq!(
            titles(&sort_events(&list, SortMode::PriceDesc)),
            vec!["Pricey", "Mid", "Cheap", "Free"]
        );
    }

    #[test]
    fn test_price_asc_free_counts_as_zero() {
        let mut free_with_price = priced("FreeTagged", 30.0, true);
        free_with_price.id = "ft".into();
        let list = vec![priced("Ten", 10.0, false), free_with_price];
        assert_eq!(
            titles(&sort_events(&list, SortMode::PriceAsc)),
            vec!["FreeTagged", "Ten"]
        );
    }

    #[test]
    fn test_sort_does_not_mutate_input() {
        let list = vec![priced("B", 2.0, false), priced("A", 1.0, false)];
        let _ = sort_events(&list, SortMode::PriceAsc);
        assert_eq!(titles(&list), vec!["B", "A"]);
    }

    #[test]
    fn test_date_sort_undated_last() {
        let mut later = event("Later");
        later.start_instant = Some(Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
        let mut sooner = event("Sooner");
        sooner.start_instant = Some(Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap());
        let undated = event("Undated");

        let list = vec![undated, later, sooner];
        assert_eq!(
            titles(&sort_events(&list, SortMode::Date)),
            vec!["Sooner", "Later", "Undated"]
        );
    }

    #[test]
    fn test_title_sort_case_insensitive() {
        let list = vec![event("banana"), event("Cherry"), event("apple")];
        assert_eq!(
            titles(&sort_events(&list, SortMode::Title)),
            vec!["apple", "banana", "Cherry"]
        );
    }

    #[test]
    fn test_title_sort_folds_accents() {
        let list = vec![event("Zénith Live"), event("Écran Total"), event("Apéro Jazz")];
        assert_eq!(
            titles(&sort_events(&list, SortMode::Title)),
            vec!["Apéro Jazz", "Écran Total", "Zénith Live"]
        );
    }

    #[test]
    fn test_title_accent_variants_tie_break_on_exact_string() {
        assert_eq!(compare_titles("Cafe", "Café"), Ordering::Less);
        assert_eq!(compare_titles("ecole", "École"), "ecole".cmp("École"));
        assert_eq!(compare_titles("Opéra", "Opéra"), Ordering::Equal);
    }

    #[test]
    fn test_search_matches_location_only() {
        let mut e = event("Open Air Cinema");
        e.location = Some("Parc de la Villette, Paris".into());
        e.organizer_name = Some("Cine Club".into());
        let out = filter_events(&[e], None, Some("paris"));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_search_matches_organizer() {
        let mut e = event("Quiz");
        e.organizer_name = Some("The Pub Collective".into());
        assert_eq!(filter_events(&[e.clone()], None, Some("PUB")).len(), 1);
        assert!(filter_events(&[e], None, Some("stadium")).is_empty());
    }

    #[test]
    fn test_category_exact_and_conjunctive() {
        let mut jazz = event("Jazz Night");
        jazz.category = Some("music".into());
        let mut match_day = event("Match Day");
        match_day.category = Some("sports".into());
        let mut rock = event("Rock Show");
        rock.category = Some("music".into());
        let list = vec![jazz, match_day, rock];

        assert_eq!(titles(&filter_events(&list, Some("music"), None)), vec!["Jazz Night", "Rock Show"]);
        assert_eq!(titles(&filter_events(&list, Some("music"), Some("rock"))), vec!["Rock Show"]);
        assert!(filter_events(&list, Some("Music"), None).is_empty());
        assert_eq!(filter_events(&list, None, None).len(), 3);
        assert_eq!(filter_events(&list, None, Some("   ")).len(), 3);
    }
}
