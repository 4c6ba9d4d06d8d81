use clap::ValueEnum;
use serde::Serialize;

use super::Reimbursement;

/// Paid/unpaid facet shown above the cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StatusFilter {
    #[default]
    All,
    Paid,
    Unpaid,
}

impl StatusFilter {
    pub fn matches(self, is_paid: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Paid => is_paid,
            StatusFilter::Unpaid => !is_paid,
        }
    }

    /// Cycle order used by Tab: All → Paid → Unpaid → All
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Paid,
            StatusFilter::Paid => StatusFilter::Unpaid,
            StatusFilter::Unpaid => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Paid => "Paid",
            StatusFilter::Unpaid => "Unpaid",
        }
    }
}

/// Record counts per facet, always over the unfiltered list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub all: usize,
    pub paid: usize,
    pub unpaid: usize,
}

impl StatusCounts {
    pub fn from_records(records: &[Reimbursement]) -> Self {
        let paid = records.iter().filter(|r| r.is_paid).count();
        Self {
            all: records.len(),
            paid,
            unpaid: records.len() - paid,
        }
    }

    pub fn get(&self, status: StatusFilter) -> usize {
        match status {
            StatusFilter::All => self.all,
            StatusFilter::Paid => self.paid,
            StatusFilter::Unpaid => self.unpaid,
        }
    }
}

/// Does the record's category, driver phone, or amount contain the query?
///
/// `query_lower` must already be lowercased. An empty query matches every
/// record, even one with no searchable fields.
fn matches_search(record: &Reimbursement, query_lower: &str) -> bool {
    if query_lower.is_empty() {
        return true;
    }

    let contains = |field: Option<&str>| {
        field
            .map(|f| f.to_lowercase().contains(query_lower))
            .unwrap_or(false)
    };

    contains(record.category())
        || contains(record.phone_number())
        || contains(record.amount().map(|a| a.as_str()))
}

/// Reduce the list to records matching both the search text and the facet
pub fn filter<'a>(
    records: &'a [Reimbursement],
    query: &str,
    status: StatusFilter,
) -> Vec<&'a Reimbursement> {
    let query_lower = query.to_lowercase();
    records
        .iter()
        .filter(|r| status.matches(r.is_paid) && matches_search(r, &query_lower))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reimbursement::tests::record;
    use serde_json::json;

    fn sample() -> Vec<Reimbursement> {
        vec![
            record("Fuel", "0788111222", json!(1500), true),
            record("Tolls", "0788333444", json!("250.50"), true),
            record("Parking", "0722555666", json!(900), false),
        ]
    }

    #[test]
    fn test_empty_query_all_returns_everything() {
        let mut records = sample();
        records.push(Reimbursement::default());

        let filtered = filter(&records, "", StatusFilter::All);

        assert_eq!(filtered.len(), records.len());
        for (kept, original) in filtered.iter().zip(records.iter()) {
            assert_eq!(*kept, original);
        }
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let records = sample();

        let filtered = filter(&records, "fUeL", StatusFilter::All);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].category(), Some("Fuel"));
    }

    #[test]
    fn test_search_matches_phone_and_amount() {
        let records = sample();

        assert_eq!(filter(&records, "0722", StatusFilter::All).len(), 1);
        assert_eq!(filter(&records, "250.5", StatusFilter::All).len(), 1);
        assert_eq!(filter(&records, "00", StatusFilter::All).len(), 2);
        assert!(filter(&records, "taxi", StatusFilter::All).is_empty());
    }

    #[test]
    fn test_facet_only_unpaid() {
        let records = sample();

        let filtered = filter(&records, "", StatusFilter::Unpaid);
        assert_eq!(filtered.len(), 1);
        assert!(!filtered[0].is_paid);

        // Search text that also hits paid records still yields the one unpaid
        assert_eq!(filter(&records, "07", StatusFilter::Unpaid).len(), 1);
    }

    #[test]
    fn test_facet_and_search_combine() {
        let records = sample();

        assert_eq!(filter(&records, "fuel", StatusFilter::Paid).len(), 1);
        assert!(filter(&records, "fuel", StatusFilter::Unpaid).is_empty());
    }

    #[test]
    fn test_missing_fields_do_not_match_text() {
        let records = vec![Reimbursement::default()];

        assert!(filter(&records, "fuel", StatusFilter::All).is_empty());
        assert_eq!(filter(&records, "", StatusFilter::Unpaid).len(), 1);
    }

    #[test]
    fn test_counts() {
        let records = sample();
        let counts = StatusCounts::from_records(&records);

        assert_eq!(counts.all, records.len());
        assert_eq!(counts.paid, 2);
        assert_eq!(counts.unpaid, 1);
        assert_eq!(counts.paid + counts.unpaid, counts.all);
        assert_eq!(counts.get(StatusFilter::Unpaid), 1);
    }

    #[test]
    fn test_status_cycle() {
        assert_eq!(StatusFilter::All.next(), StatusFilter::Paid);
        assert_eq!(StatusFilter::Paid.next(), StatusFilter::Unpaid);
        assert_eq!(StatusFilter::Unpaid.next(), StatusFilter::All);
    }
}
