use chrono::{DateTime, Utc};
use entity::{Company, Contact, Deal, RecordId, Stage};

use crate::{
    board::sum_cents,
    format::{format_percent, format_usd},
};

/// Headline figures for the dashboard.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardStats {
    /// Sum of `Closed Won` amounts.
    pub total_revenue_cents: i64,
    /// Sum of amounts still in an open stage.
    pub pipeline_value_cents: i64,
    pub active_deals: usize,
    /// Won deals as a percentage of all deals; zero when there are none.
    pub win_rate: f64,
    pub total_contacts: usize,
    pub total_companies: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
}

impl DashboardStats {
    pub fn compute(deals: &[Deal], contacts: &[Contact], companies: &[Company]) -> Self {
        let won = deals.iter().filter(|deal| deal.stage.is_won()).count();
        let win_rate = if deals.is_empty() {
            0.0
        } else {
            won as f64 / deals.len() as f64 * 100.0
        };
        Self {
            total_revenue_cents: sum_cents(
                deals
                    .iter()
                    .filter(|deal| deal.stage.is_won())
                    .map(|deal| deal.amount_cents),
            ),
            pipeline_value_cents: sum_cents(
                deals
                    .iter()
                    .filter(|deal| !deal.stage.is_closed())
                    .map(|deal| deal.amount_cents),
            ),
            active_deals: deals.iter().filter(|deal| !deal.stage.is_closed()).count(),
            win_rate,
            total_contacts: contacts.len(),
            total_companies: companies.len(),
        }
    }

    pub fn stat_cards(&self) -> Vec<StatCard> {
        vec![
            card("Total Revenue", format_usd(self.total_revenue_cents)),
            card("Pipeline Value", format_usd(self.pipeline_value_cents)),
            card("Active Deals", self.active_deals.to_string()),
            card("Win Rate", format_percent(self.win_rate)),
            card("Total Contacts", self.total_contacts.to_string()),
            card("Total Companies", self.total_companies.to_string()),
        ]
    }
}

fn card(label: &'static str, value: String) -> StatCard {
    StatCard { label, value }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityKind {
    Deal,
    Contact,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activity {
    pub kind: ActivityKind,
    pub id: RecordId,
    pub title: String,
    pub subtitle: String,
    pub at: DateTime<Utc>,
}

/// Most recently touched deals and contacts, newest first.
pub fn recent_activity(deals: &[Deal], contacts: &[Contact], limit: usize) -> Vec<Activity> {
    let deal_items = deals.iter().map(|deal| Activity {
        kind: ActivityKind::Deal,
        id: deal.id,
        title: format!("{} - {}", deal.name, deal.stage),
        subtitle: format_usd(deal.amount_cents),
        at: deal.updated_at,
    });
    let contact_items = contacts.iter().map(|contact| Activity {
        kind: ActivityKind::Contact,
        id: contact.id,
        title: contact.full_name(),
        subtitle: if contact.job_title.trim().is_empty() {
            "New Contact".to_string()
        } else {
            contact.job_title.clone()
        },
        at: contact.updated_at,
    });
    let mut items: Vec<Activity> = deal_items.chain(contact_items).collect();
    items.sort_by(|a, b| b.at.cmp(&a.at));
    items.truncate(limit);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use entity::{NewContact, NewDeal, Record};

    fn deal(id: u64, stage: Stage, amount_cents: i64) -> Deal {
        Deal::from_draft(
            RecordId::new(id).unwrap(),
            NewDeal::new(format!("Deal {id}"), amount_cents, stage),
            Utc::now(),
        )
    }

    #[test]
    fn figures_saturate_on_extreme_amounts() {
        let deals = vec![
            deal(1, Stage::ClosedWon, i64::MAX),
            deal(2, Stage::ClosedWon, i64::MAX),
            deal(3, Stage::Proposal, i64::MAX),
            deal(4, Stage::Lead, 1),
        ];
        let stats = DashboardStats::compute(&deals, &[], &[]);
        assert_eq!(stats.total_revenue_cents, i64::MAX);
        assert_eq!(stats.pipeline_value_cents, i64::MAX);
        assert_eq!(stats.win_rate, 50.0);
    }

    #[test]
    fn figures_split_won_open_and_lost() {
        let deals = vec![
            deal(1, Stage::Lead, 500_00),
            deal(2, Stage::Negotiation, 2_000_00),
            deal(3, Stage::ClosedWon, 8_000_00),
            deal(4, Stage::ClosedLost, 750_00),
        ];
        let stats = DashboardStats::compute(&deals, &[], &[]);
        assert_eq!(stats.total_revenue_cents, 8_000_00);
        assert_eq!(stats.pipeline_value_cents, 2_500_00);
        assert_eq!(stats.active_deals, 2);
        assert_eq!(stats.win_rate, 25.0);

        let cards = stats.stat_cards();
        assert_eq!(cards.len(), 6);
        assert_eq!(cards[0], card("Total Revenue", "$8,000".into()));
        assert_eq!(cards[3], card("Win Rate", "25.0%".into()));
    }

    #[test]
    fn empty_board_has_zero_win_rate() {
        let stats = DashboardStats::compute(&[], &[], &[]);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.stat_cards()[3].value, "0.0%");
    }

    #[test]
    fn activity_is_newest_first_and_limited() {
        let mut older = deal(1, Stage::Lead, 100_00);
        older.updated_at -= Duration::hours(2);
        let newer = deal(2, Stage::Proposal, 1_200_00);
        let mut contact = Contact::from_draft(
            RecordId::new(1).unwrap(),
            NewContact::new("Grace", "Hopper", "grace@globex.test"),
            Utc::now(),
        );
        contact.updated_at -= Duration::hours(1);

        let items = recent_activity(&[older, newer], &[contact], 2);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Deal 2 - Proposal");
        assert_eq!(items[0].subtitle, "$1,200");
        assert_eq!(items[1].kind, ActivityKind::Contact);
        assert_eq!(items[1].subtitle, "New Contact");
    }
}
