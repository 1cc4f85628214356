//! Search and facet filters for the deal, contact and company lists.
//!
//! Search terms match case-insensitively anywhere in the listed fields. A
//! blank term matches everything.

use std::collections::BTreeSet;

use entity::{Company, Contact, ContactStatus, Deal, Stage};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DealFilter {
    pub search: Option<String>,
    pub stage: Option<Stage>,
}

impl DealFilter {
    pub fn matches(&self, deal: &Deal) -> bool {
        let hit = match needle(&self.search) {
            Some(needle) => contains(&deal.name, &needle) || contains(&deal.owner_id, &needle),
            None => true,
        };
        hit && self.stage.is_none_or(|stage| deal.stage == stage)
    }

    pub fn apply<'a>(&self, deals: &'a [Deal]) -> Vec<&'a Deal> {
        deals.iter().filter(|deal| self.matches(deal)).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactFilter {
    pub search: Option<String>,
    pub status: Option<ContactStatus>,
}

impl ContactFilter {
    pub fn matches(&self, contact: &Contact) -> bool {
        let hit = match needle(&self.search) {
            Some(needle) => {
                contains(&contact.full_name(), &needle)
                    || contains(&contact.email, &needle)
                    || contains(&contact.job_title, &needle)
            }
            None => true,
        };
        hit && self.status.is_none_or(|status| contact.status == status)
    }

    pub fn apply<'a>(&self, contacts: &'a [Contact]) -> Vec<&'a Contact> {
        contacts
            .iter()
            .filter(|contact| self.matches(contact))
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    pub search: Option<String>,
    /// Exact industry name.
    pub industry: Option<String>,
}

impl CompanyFilter {
    pub fn matches(&self, company: &Company) -> bool {
        let hit = match needle(&self.search) {
            Some(needle) => {
                contains(&company.name, &needle)
                    || contains(&company.industry, &needle)
                    || contains(&company.website, &needle)
            }
            None => true,
        };
        hit && self
            .industry
            .as_deref()
            .is_none_or(|industry| company.industry == industry)
    }

    pub fn apply<'a>(&self, companies: &'a [Company]) -> Vec<&'a Company> {
        companies
            .iter()
            .filter(|company| self.matches(company))
            .collect()
    }
}

/// Distinct non-empty industries, sorted.
pub fn industries(companies: &[Company]) -> Vec<&str> {
    companies
        .iter()
        .map(|company| company.industry.as_str())
        .filter(|industry| !industry.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn needle(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
