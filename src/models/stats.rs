// src/models/stats.rs

use serde::Serialize;
use std::collections::BTreeMap;

/// Dashboard counters for GET /admin/stats
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct AdminStats {
    pub total_users: i64,
    pub users_by_role: BTreeMap<String, i64>,
    pub total_active_properties: i64,
    pub properties_by_status: BTreeMap<String, i64>,
    pub total_contacts: i64,
    pub contacts_by_status: BTreeMap<String, i64>,
    pub total_inquiries: i64,
    pub inquiries_by_status: BTreeMap<String, i64>,
    pub total_media: i64,
}

fn tally(rows: Vec<(String, i64)>) -> (i64, BTreeMap<String, i64>) {
    let total = rows.iter().map(|(_, n)| n).sum();
    (total, rows.into_iter().collect())
}

impl AdminStats {
    /// Build from grouped `(key, count)` rows
    pub fn from_counts(
        users: Vec<(String, i64)>,
        properties: Vec<(String, i64)>,
        contacts: Vec<(String, i64)>,
        inquiries: Vec<(String, i64)>,
        total_media: i64,
    ) -> Self {
        let (total_users, users_by_role) = tally(users);
        let (total_active_properties, properties_by_status) = tally(properties);
        let (total_contacts, contacts_by_status) = tally(contacts);
        let (total_inquiries, inquiries_by_status) = tally(inquiries);

        AdminStats {
            total_users,
            users_by_role,
            total_active_properties,
            properties_by_status,
            total_contacts,
            contacts_by_status,
            total_inquiries,
            inquiries_by_status,
            total_media,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_are_summed() {
        let stats = AdminStats::from_counts(
            vec![("admin".into(), 1), ("agent".into(), 4), ("user".into(), 10)],
            vec![("for_sale".into(), 7)],
            vec![],
            vec![("open".into(), 2), ("closed".into(), 1)],
            12,
        );

        assert_eq!(stats.total_users, 15);
        assert_eq!(stats.users_by_role.get("agent"), Some(&4));
        assert_eq!(stats.total_active_properties, 7);
        assert_eq!(stats.total_contacts, 0);
        assert!(stats.contacts_by_status.is_empty());
        assert_eq!(stats.total_inquiries, 3);
        assert_eq!(stats.total_media, 12);
    }
}
