//! Pure views over the deal list: stage buckets, column totals and the
//! contact/company labels shown on cards.

use std::collections::HashMap;

use entity::{Company, Contact, Deal, RecordId, Stage};

use crate::format::{column_caption, format_usd};

pub const UNKNOWN_CONTACT: &str = "Unknown Contact";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Deals in `stage`, in input order.
pub fn bucket(deals: &[Deal], stage: Stage) -> Vec<&Deal> {
    deals.iter().filter(|deal| deal.stage == stage).collect()
}

/// Sum of amounts in `stage`; zero when the bucket is empty.
pub fn stage_value(deals: &[Deal], stage: Stage) -> i64 {
    sum_cents(
        deals
            .iter()
            .filter(|deal| deal.stage == stage)
            .map(|deal| deal.amount_cents),
    )
}

/// Saturates at `i64::MAX` instead of overflowing.
pub(crate) fn sum_cents(amounts: impl IntoIterator<Item = i64>) -> i64 {
    amounts.into_iter().fold(0, i64::saturating_add)
}

#[derive(Clone, Debug, PartialEq)]
pub struct StageColumn<'a> {
    pub stage: Stage,
    pub deals: Vec<&'a Deal>,
    pub value_cents: i64,
}

impl StageColumn<'_> {
    pub fn count(&self) -> usize {
        self.deals.len()
    }

    pub fn caption(&self) -> String {
        column_caption(self.count(), self.value_cents)
    }
}

/// All six columns in board order. Every deal lands in exactly one column.
#[derive(Clone, Debug)]
pub struct BoardColumns<'a> {
    columns: Vec<StageColumn<'a>>,
}

impl<'a> BoardColumns<'a> {
    pub fn partition(deals: &'a [Deal]) -> Self {
        let mut columns: Vec<StageColumn<'a>> = Stage::ALL
            .iter()
            .map(|&stage| StageColumn {
                stage,
                deals: Vec::new(),
                value_cents: 0,
            })
            .collect();
        for deal in deals {
            let column = &mut columns[deal.stage.position()];
            column.deals.push(deal);
            column.value_cents = column.value_cents.saturating_add(deal.amount_cents);
        }
        Self { columns }
    }

    pub fn column(&self, stage: Stage) -> &StageColumn<'a> {
        &self.columns[stage.position()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageColumn<'a>> {
        self.columns.iter()
    }

    pub fn total_count(&self) -> usize {
        self.columns.iter().map(StageColumn::count).sum()
    }

    pub fn total_value_cents(&self) -> i64 {
        sum_cents(self.columns.iter().map(|column| column.value_cents))
    }

    /// Value of every column except the two closed ones.
    pub fn open_value_cents(&self) -> i64 {
        sum_cents(
            self.columns
                .iter()
                .filter(|column| !column.stage.is_closed())
                .map(|column| column.value_cents),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageTotals {
    pub stage: Stage,
    pub count: usize,
    pub value_cents: i64,
}

/// Count and value per stage, empty stages included.
pub fn stage_breakdown(deals: &[Deal]) -> Vec<StageTotals> {
    BoardColumns::partition(deals)
        .iter()
        .map(|column| StageTotals {
            stage: column.stage,
            count: column.count(),
            value_cents: column.value_cents,
        })
        .collect()
}

/// Display names for the ids a deal card references.
#[derive(Clone, Debug, Default)]
pub struct Lookups {
    contacts: HashMap<RecordId, String>,
    companies: HashMap<RecordId, String>,
}

impl Lookups {
    pub fn new(contacts: &[Contact], companies: &[Company]) -> Self {
        Self {
            contacts: contacts
                .iter()
                .map(|contact| (contact.id, contact.full_name()))
                .collect(),
            companies: companies
                .iter()
                .map(|company| (company.id, company.name.clone()))
                .collect(),
        }
    }

    pub fn contact_label(&self, id: Option<RecordId>) -> &str {
        id.and_then(|id| self.contacts.get(&id))
            .map_or(UNKNOWN_CONTACT, String::as_str)
    }

    pub fn company_label(&self, id: Option<RecordId>) -> &str {
        id.and_then(|id| self.companies.get(&id))
            .map_or(UNKNOWN_COMPANY, String::as_str)
    }

    pub fn card<'a>(&'a self, deal: &'a Deal) -> Card<'a> {
        Card {
            id: deal.id,
            name: &deal.name,
            amount: format_usd(deal.amount_cents),
            contact: self.contact_label(deal.contact_id),
            company: self.company_label(deal.company_id),
            close_date: deal.close_date.map(|date| date.format("%b %-d, %Y").to_string()),
        }
    }
}

/// What a deal card shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card<'a> {
    pub id: RecordId,
    pub name: &'a str,
    pub amount: String,
    pub contact: &'a str,
    pub company: &'a str,
    pub close_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use entity::{NewCompany, NewContact, Record};

    fn deal(id: u64, stage: Stage, amount_cents: i64) -> Deal {
        let mut draft = entity::NewDeal::new(format!("Deal {id}"), amount_cents, stage);
        draft.owner_id = "sam".into();
        Deal::from_draft(RecordId::new(id).unwrap(), draft, Utc::now())
    }

    fn sample() -> Vec<Deal> {
        vec![
            deal(1, Stage::Lead, 500_00),
            deal(2, Stage::Qualified, 1_200_00),
            deal(3, Stage::Lead, 250_00),
            deal(4, Stage::ClosedWon, 8_000_00),
        ]
    }

    #[test]
    fn bucket_keeps_input_order() {
        let deals = sample();
        let ids: Vec<u64> = bucket(&deals, Stage::Lead)
            .iter()
            .map(|deal| deal.id.get())
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(bucket(&deals, Stage::Negotiation).is_empty());
    }

    #[test]
    fn stage_value_sums_the_bucket() {
        let deals = sample();
        assert_eq!(stage_value(&deals, Stage::Lead), 750_00);
        assert_eq!(stage_value(&deals, Stage::Proposal), 0);
        assert_eq!(stage_value(&[], Stage::Lead), 0);
    }

    #[test]
    fn partition_places_every_deal_once() {
        let deals = sample();
        let board = BoardColumns::partition(&deals);
        assert_eq!(board.iter().count(), Stage::ALL.len());
        assert_eq!(board.total_count(), deals.len());
        assert_eq!(
            board.total_value_cents(),
            deals.iter().map(|deal| deal.amount_cents).sum::<i64>()
        );
        for stage in Stage::ALL {
            let column = board.column(stage);
            assert_eq!(column.stage, stage);
            assert_eq!(column.deals, bucket(&deals, stage));
            assert_eq!(column.value_cents, stage_value(&deals, stage));
        }
        assert_eq!(board.open_value_cents(), 1_950_00);
    }

    #[test]
    fn column_totals_saturate_instead_of_overflowing() {
        let deals = vec![
            deal(1, Stage::Lead, i64::MAX - 1),
            deal(2, Stage::Lead, i64::MAX - 1),
            deal(3, Stage::Qualified, 100),
        ];
        assert_eq!(stage_value(&deals, Stage::Lead), i64::MAX);
        let board = BoardColumns::partition(&deals);
        assert_eq!(board.column(Stage::Lead).value_cents, i64::MAX);
        assert_eq!(board.total_value_cents(), i64::MAX);
        assert_eq!(board.open_value_cents(), i64::MAX);
        assert!(board.column(Stage::Lead).caption().starts_with("2 deals • $92,233"));
    }

    #[test]
    fn captions_use_column_totals() {
        let deals = sample();
        let board = BoardColumns::partition(&deals);
        assert_eq!(board.column(Stage::Lead).caption(), "2 deals • $750");
        assert_eq!(board.column(Stage::Proposal).caption(), "0 deals • $0");
    }

    #[test]
    fn breakdown_covers_all_stages() {
        let totals = stage_breakdown(&sample());
        assert_eq!(totals.len(), 6);
        assert_eq!(
            totals[Stage::ClosedWon.position()],
            StageTotals {
                stage: Stage::ClosedWon,
                count: 1,
                value_cents: 8_000_00,
            }
        );
        assert_eq!(totals[Stage::ClosedLost.position()].count, 0);
    }

    #[test]
    fn lookups_fall_back_to_placeholders() {
        let now = Utc::now();
        let ada = Contact::from_draft(
            RecordId::new(1).unwrap(),
            NewContact::new("Ada", "Lovelace", "ada@acme.test"),
            now,
        );
        let acme = Company::from_draft(
            RecordId::new(1).unwrap(),
            NewCompany::new("ACME, Inc."),
            now,
        );
        let lookups = Lookups::new(&[ada], &[acme]);

        assert_eq!(lookups.contact_label(RecordId::new(1)), "Ada Lovelace");
        assert_eq!(lookups.company_label(RecordId::new(1)), "ACME, Inc.");
        assert_eq!(lookups.contact_label(None), UNKNOWN_CONTACT);
        assert_eq!(lookups.company_label(RecordId::new(99)), UNKNOWN_COMPANY);
    }

    #[test]
    fn card_formats_amount_and_close_date() {
        let mut deal = deal(7, Stage::Proposal, 4_500_00);
        deal.close_date = NaiveDate::from_ymd_opt(2024, 3, 5);
        let lookups = Lookups::default();
        let card = lookups.card(&deal);
        assert_eq!(card.amount, "$4,500");
        assert_eq!(card.close_date.as_deref(), Some("Mar 5, 2024"));
        assert_eq!(card.contact, UNKNOWN_CONTACT);
    }
}
