use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::info;

use crate::normalize::{parse_date, standardize_email, standardize_phone};
use crate::types::{CleanCustomer, RawRecord};

#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerCounters {
    pub raw: usize,
    pub duplicates_removed: usize,
    pub missing_email_handled: usize,
}

/// Clean raw customer rows: normalize email/phone/date, deduplicate by
/// customer id (keep first), replace unusable emails with placeholders,
/// force global email uniqueness, and default missing names.
pub fn clean_customers(rows: &[RawRecord]) -> (Vec<CleanCustomer>, CustomerCounters) {
    let mut counters = CustomerCounters {
        raw: rows.len(),
        ..Default::default()
    };

    // Normalize and deduplicate by natural key, keeping the first occurrence.
    // Rows with no customer id share the empty key, so they dedup together.
    let mut seen_ids = HashSet::new();
    let mut cleaned: Vec<(CleanCustomer, Option<String>)> = Vec::new();
    for row in rows {
        let external_id = row.get("customer_id").unwrap_or("").to_string();
        if !seen_ids.insert(external_id.clone()) {
            counters.duplicates_removed += 1;
            continue;
        }

        let email = row.get("email").and_then(standardize_email);
        cleaned.push((
            CleanCustomer {
                external_id,
                first_name: row.get("first_name").unwrap_or("Unknown").to_string(),
                last_name: row.get("last_name").unwrap_or("Customer").to_string(),
                email: String::new(),
                phone: row.get("phone").and_then(standardize_phone),
                city: row.get("city").map(str::to_string),
                registration_date: row.get("registration_date").and_then(parse_date),
            },
            email,
        ));
    }

    // First pass: final candidate emails, placeholders for the unusable ones.
    let candidates: Vec<String> = cleaned
        .iter()
        .map(|(customer, email)| match email {
            Some(email) => email.clone(),
            None => {
                counters.missing_email_handled += 1;
                placeholder_email(&customer.external_id)
            }
        })
        .collect();

    // Second pass: every occurrence beyond the first within a candidate
    // group gets a zero-based occurrence suffix, in original row order.
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for ((customer, _), candidate) in cleaned.iter_mut().zip(&candidates) {
        let seen = occurrences.entry(candidate.as_str()).or_insert(0);
        customer.email = if *seen == 0 {
            candidate.clone()
        } else {
            format!("{candidate}.{}", *seen - 1)
        };
        *seen += 1;
    }

    let customers: Vec<CleanCustomer> = cleaned.into_iter().map(|(customer, _)| customer).collect();

    info!(
        raw = counters.raw,
        kept = customers.len(),
        duplicates_removed = counters.duplicates_removed,
        missing_email_handled = counters.missing_email_handled,
        "Cleaned customers"
    );

    (customers, counters)
}

/// `customers.email` is UNIQUE NOT NULL downstream; rows with no usable
/// address get a deterministic placeholder derived from the natural key.
fn placeholder_email(external_id: &str) -> String {
    let safe = external_id.trim().to_lowercase();
    let safe = if safe.is_empty() {
        "unknown"
    } else {
        safe.as_str()
    };
    format!("missing.{safe}@fleximart.local")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_row(id: Option<&str>, email: Option<&str>) -> RawRecord {
        RawRecord::from_pairs([
            ("customer_id", id),
            ("first_name", Some("Asha")),
            ("last_name", Some("Rao")),
            ("email", email),
            ("phone", None),
            ("city", Some("Pune")),
            ("registration_date", Some("2023-05-01")),
        ])
    }

    #[test]
    fn exact_duplicate_is_removed_and_counted() {
        let rows = vec![
            customer_row(Some("C001"), Some("A@X.com")),
            customer_row(Some("C001"), Some("A@X.com")),
        ];
        let (cleaned, counters) = clean_customers(&rows);

        assert_eq!(cleaned.len(), 1);
        assert_eq!(counters.duplicates_removed, 1);
        assert_eq!(cleaned[0].email, "a@x.com");
    }

    #[test]
    fn dedup_is_idempotent() {
        let rows = vec![
            customer_row(Some("C001"), Some("a@x.com")),
            customer_row(Some("C001"), Some("a@x.com")),
            customer_row(Some("C002"), Some("b@x.com")),
        ];
        let (first, _) = clean_customers(&rows);
        let raw_again: Vec<RawRecord> = first
            .iter()
            .map(|c| customer_row(Some(&c.external_id), Some(&c.email)))
            .collect();
        let (second, counters) = clean_customers(&raw_again);

        assert_eq!(first.len(), second.len());
        assert_eq!(counters.duplicates_removed, 0);
    }

    #[test]
    fn missing_email_gets_placeholder() {
        let rows = vec![customer_row(Some("C007"), None)];
        let (cleaned, counters) = clean_customers(&rows);

        assert_eq!(cleaned[0].email, "missing.c007@fleximart.local");
        assert_eq!(counters.missing_email_handled, 1);
    }

    #[test]
    fn invalid_email_counts_as_missing() {
        let rows = vec![customer_row(Some("C008"), Some("not-an-email"))];
        let (cleaned, counters) = clean_customers(&rows);

        assert_eq!(cleaned[0].email, "missing.c008@fleximart.local");
        assert_eq!(counters.missing_email_handled, 1);
    }

    #[test]
    fn missing_id_and_email_uses_unknown_placeholder() {
        let rows = vec![customer_row(None, None)];
        let (cleaned, _) = clean_customers(&rows);

        assert_eq!(cleaned[0].external_id, "");
        assert_eq!(cleaned[0].email, "missing.unknown@fleximart.local");
    }

    #[test]
    fn colliding_placeholders_get_occurrence_suffixes() {
        // Distinct ids that lowercase to the same placeholder.
        let rows = vec![
            customer_row(Some("C9"), None),
            customer_row(Some("c9"), None),
        ];
        let (cleaned, counters) = clean_customers(&rows);

        assert_eq!(cleaned[0].email, "missing.c9@fleximart.local");
        assert_eq!(cleaned[1].email, "missing.c9@fleximart.local.0");
        assert_eq!(counters.missing_email_handled, 2);
    }

    #[test]
    fn genuine_email_collisions_are_disambiguated_in_order() {
        let rows = vec![
            customer_row(Some("C001"), Some("Shared@X.com")),
            customer_row(Some("C002"), Some("shared@x.com")),
            customer_row(Some("C003"), Some("SHARED@X.COM")),
        ];
        let (cleaned, _) = clean_customers(&rows);

        assert_eq!(cleaned[0].email, "shared@x.com");
        assert_eq!(cleaned[1].email, "shared@x.com.0");
        assert_eq!(cleaned[2].email, "shared@x.com.1");

        let unique: HashSet<&str> = cleaned.iter().map(|c| c.email.as_str()).collect();
        assert_eq!(unique.len(), cleaned.len());
    }

    #[test]
    fn missing_names_are_defaulted() {
        let row = RawRecord::from_pairs([
            ("customer_id", Some("C010")),
            ("first_name", None),
            ("last_name", None),
            ("email", Some("c@x.com")),
        ]);
        let (cleaned, _) = clean_customers(&[row]);

        assert_eq!(cleaned[0].first_name, "Unknown");
        assert_eq!(cleaned[0].last_name, "Customer");
    }
}
