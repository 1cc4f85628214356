use chrono::NaiveDate;
use entity::{
    Company, Contact, ContactStatus, Deal, NewCompany, NewContact, NewDeal, RecordId, Stage,
};
use platform_store::StoreResult;
use tracing::info;

use crate::CrmStores;

pub struct SeededCrmRecords {
    pub companies: Vec<Company>,
    pub contacts: Vec<Contact>,
    pub deals: Vec<Deal>,
}

impl SeededCrmRecords {
    pub fn company_named(&self, name: &str) -> Option<&Company> {
        self.companies.iter().find(|c| c.name == name)
    }

    pub fn contact_email(&self, email: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.email == email)
    }

    pub fn deal_named(&self, name: &str) -> Option<&Deal> {
        self.deals.iter().find(|d| d.name == name)
    }
}

struct CompanySeed {
    name: &'static str,
    industry: &'static str,
    website: &'static str,
    phone: &'static str,
}

struct ContactSeed {
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    job_title: &'static str,
    status: ContactStatus,
    company: &'static str,
}

struct DealSeed {
    name: &'static str,
    amount_cents: i64,
    stage: Stage,
    contact: &'static str,
    company: &'static str,
    owner: &'static str,
    close_date: (i32, u32, u32),
}

const COMPANIES: &[CompanySeed] = &[
    CompanySeed {
        name: "ACME, Inc.",
        industry: "Manufacturing",
        website: "https://acme.test",
        phone: "+1-555-0100",
    },
    CompanySeed {
        name: "Globex",
        industry: "Software",
        website: "https://globex.test",
        phone: "+1-555-0200",
    },
    CompanySeed {
        name: "Initech",
        industry: "Consulting",
        website: "https://initech.test",
        phone: "+1-555-0300",
    },
];

const CONTACTS: &[ContactSeed] = &[
    ContactSeed {
        first_name: "Ada",
        last_name: "Lovelace",
        email: "ada@acme.test",
        job_title: "Head of Operations",
        status: ContactStatus::Active,
        company: "ACME, Inc.",
    },
    ContactSeed {
        first_name: "Grace",
        last_name: "Hopper",
        email: "grace@globex.test",
        job_title: "CTO",
        status: ContactStatus::Prospect,
        company: "Globex",
    },
    ContactSeed {
        first_name: "Peter",
        last_name: "Gibbons",
        email: "peter@initech.test",
        job_title: "",
        status: ContactStatus::Lead,
        company: "Initech",
    },
];

const DEALS: &[DealSeed] = &[
    DealSeed {
        name: "ACME Rollout",
        amount_cents: 500_00,
        stage: Stage::Lead,
        contact: "ada@acme.test",
        company: "ACME, Inc.",
        owner: "sales-sam",
        close_date: (2024, 9, 30),
    },
    DealSeed {
        name: "Globex Expansion",
        amount_cents: 1_200_00,
        stage: Stage::Qualified,
        contact: "grace@globex.test",
        company: "Globex",
        owner: "sales-sam",
        close_date: (2024, 10, 15),
    },
    DealSeed {
        name: "Initech Migration",
        amount_cents: 4_500_00,
        stage: Stage::Proposal,
        contact: "peter@initech.test",
        company: "Initech",
        owner: "admin-ada",
        close_date: (2024, 11, 1),
    },
    DealSeed {
        name: "ACME Support Plan",
        amount_cents: 2_000_00,
        stage: Stage::Negotiation,
        contact: "ada@acme.test",
        company: "ACME, Inc.",
        owner: "sales-sam",
        close_date: (2024, 8, 20),
    },
    DealSeed {
        name: "Globex Renewal",
        amount_cents: 8_000_00,
        stage: Stage::ClosedWon,
        contact: "grace@globex.test",
        company: "Globex",
        owner: "admin-ada",
        close_date: (2024, 6, 30),
    },
    DealSeed {
        name: "Initech Pilot",
        amount_cents: 750_00,
        stage: Stage::ClosedLost,
        contact: "peter@initech.test",
        company: "Initech",
        owner: "sales-sam",
        close_date: (2024, 5, 31),
    },
];

/// Inserts a fixed demo data set through the store API: three companies, one
/// contact each, and a deal in every stage.
pub async fn seed_crm_demo(stores: &CrmStores) -> StoreResult<SeededCrmRecords> {
    let mut seeded = SeededCrmRecords {
        companies: Vec::with_capacity(COMPANIES.len()),
        contacts: Vec::with_capacity(CONTACTS.len()),
        deals: Vec::with_capacity(DEALS.len()),
    };

    for seed in COMPANIES {
        let mut draft = NewCompany::new(seed.name);
        draft.industry = seed.industry.into();
        draft.website = seed.website.into();
        draft.phone = seed.phone.into();
        seeded.companies.push(stores.companies.create(draft).await?);
    }

    for seed in CONTACTS {
        let mut draft = NewContact::new(seed.first_name, seed.last_name, seed.email);
        draft.job_title = seed.job_title.into();
        draft.status = seed.status;
        draft.company_id = company_id(&seeded, seed.company);
        seeded.contacts.push(stores.contacts.create(draft).await?);
    }

    for seed in DEALS {
        let mut draft = NewDeal::new(seed.name, seed.amount_cents, seed.stage);
        draft.owner_id = seed.owner.into();
        draft.contact_id = seeded.contact_email(seed.contact).map(|c| c.id);
        draft.company_id = company_id(&seeded, seed.company);
        let (year, month, day) = seed.close_date;
        draft.close_date = NaiveDate::from_ymd_opt(year, month, day);
        seeded.deals.push(stores.deals.create(draft).await?);
    }

    info!(
        companies = seeded.companies.len(),
        contacts = seeded.contacts.len(),
        deals = seeded.deals.len(),
        "crm demo data seeded"
    );
    Ok(seeded)
}

fn company_id(seeded: &SeededCrmRecords, name: &str) -> Option<RecordId> {
    seeded.company_named(name).map(|c| c.id)
}
