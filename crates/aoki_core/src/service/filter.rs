//! In-memory list filters for account and trash views.
//!
//! Plain case-insensitive substring matching over already-loaded lists; no
//! ranking and no index.

use crate::model::account::Account;
use crate::service::lifecycle_service::TrashEntry;

/// Text filter for active account lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    /// Matches the account name or any `data` value. Blank matches all.
    pub term: String,
}

impl AccountFilter {
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into() }
    }

    pub fn matches(&self, account: &Account) -> bool {
        matches_term(account, &self.term)
    }

    pub fn apply(&self, accounts: Vec<Account>) -> Vec<Account> {
        accounts
            .into_iter()
            .filter(|account| self.matches(account))
            .collect()
    }
}

/// Text plus `deleted_at` range filter for trash lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrashFilter {
    pub term: String,
    /// Inclusive lower bound, epoch milliseconds.
    pub deleted_from: Option<i64>,
    /// Inclusive upper bound, epoch milliseconds.
    pub deleted_until: Option<i64>,
}

impl TrashFilter {
    pub fn matches(&self, entry: &TrashEntry) -> bool {
        if !matches_term(&entry.account, &self.term) {
            return false;
        }
        let Some(deleted_at) = entry.account.deleted_at else {
            return false;
        };
        self.deleted_from.map_or(true, |from| deleted_at >= from)
            && self.deleted_until.map_or(true, |until| deleted_at <= until)
    }

    pub fn apply(&self, entries: Vec<TrashEntry>) -> Vec<TrashEntry> {
        entries
            .into_iter()
            .filter(|entry| self.matches(entry))
            .collect()
    }
}

fn matches_term(account: &Account, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    account.name.to_lowercase().contains(&needle)
        || account
            .data
            .values()
            .any(|value| value.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::{AccountFilter, TrashFilter};
    use crate::model::account::{Account, AccountData};
    use crate::service::lifecycle_service::TrashEntry;
    use uuid::Uuid;

    fn account(name: &str, pairs: &[(&str, &str)], deleted_at: Option<i64>) -> Account {
        Account {
            id: Uuid::new_v4(),
            project_id: Some(Uuid::new_v4()),
            name: name.to_string(),
            data: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<AccountData>(),
            created_at: 1,
            updated_at: 1,
            deleted_at,
        }
    }

    #[test]
    fn account_filter_matches_name_or_value_case_insensitively() {
        let accounts = vec![
            account("GitHub", &[("user", "octo")], None),
            account("Mail", &[("user", "Someone@Example.com")], None),
            account("Bank", &[], None),
        ];

        let by_name = AccountFilter::new("github").apply(accounts.clone());
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "GitHub");

        let by_value = AccountFilter::new("EXAMPLE").apply(accounts.clone());
        assert_eq!(by_value.len(), 1);
        assert_eq!(by_value[0].name, "Mail");

        assert_eq!(AccountFilter::new("  ").apply(accounts).len(), 3);
    }

    #[test]
    fn trash_filter_applies_inclusive_deleted_range() {
        let entries: Vec<TrashEntry> = [100, 200, 300]
            .into_iter()
            .map(|deleted_at| TrashEntry {
                account: account("x", &[], Some(deleted_at)),
                project_name: None,
            })
            .collect();

        let filter = TrashFilter {
            term: String::new(),
            deleted_from: Some(200),
            deleted_until: Some(300),
        };
        let kept: Vec<i64> = filter
            .apply(entries)
            .into_iter()
            .filter_map(|entry| entry.account.deleted_at)
            .collect();
        assert_eq!(kept, vec![200, 300]);
    }
}
