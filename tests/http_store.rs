use anyhow::Result;
use entity::{
    CompanyPatch, ContactPatch, DealPatch, NewCompany, NewContact, NewDeal, Stage,
};
use platform_store::StoreError;
use products_crm::CrmStores;
use suite_tests::{Backend, id};

#[tokio::test]
async fn deal_crud_round_trips_through_the_record_api() -> Result<()> {
    let backend = Backend::spawn(CrmStores::in_memory()).await?;
    let client = backend.client_stores()?;

    let created = client
        .deals
        .create(NewDeal::new("Globex Expansion", 1_200_50, Stage::Qualified))
        .await?;
    assert_eq!(created.id, id(1));
    assert_eq!(created.amount_cents, 1_200_50);

    let moved = client
        .deals
        .update(created.id, DealPatch::stage(Stage::Proposal))
        .await?;
    assert_eq!(moved.stage, Stage::Proposal);
    assert_eq!(moved.name, "Globex Expansion");

    let listed = client.deals.get_all().await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].stage, Stage::Proposal);
    let on_server = backend.stores.deals.get_by_id(created.id).await?;
    assert_eq!(on_server.map(|deal| deal.stage), Some(Stage::Proposal));

    client.deals.delete(created.id).await?;
    assert!(client.deals.get_by_id(created.id).await?.is_none());
    assert!(client.deals.get_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_records_surface_as_not_found() -> Result<()> {
    let backend = Backend::spawn(CrmStores::in_memory()).await?;
    let client = backend.client_stores()?;

    let err = client
        .deals
        .update(id(41), DealPatch::stage(Stage::Lead))
        .await
        .unwrap_err();
    assert!(
        matches!(err, StoreError::NotFound { table: "deal", id: missing } if missing.get() == 41),
        "{err}"
    );
    assert!(matches!(
        client.contacts.delete(id(3)).await,
        Err(StoreError::NotFound { table: "contact", .. })
    ));
    Ok(())
}

#[tokio::test]
async fn rejected_rows_report_the_failed_verb() -> Result<()> {
    let backend = Backend::spawn(CrmStores::in_memory()).await?;
    let client = backend.client_stores()?;

    let err = client
        .contacts
        .create(NewContact::new("Ada", "Lovelace", "not-an-email"))
        .await
        .unwrap_err();
    match err {
        StoreError::Rejected(message) => assert_eq!(message, "Some records failed to create"),
        other => panic!("expected rejection, got {other}"),
    }
    assert!(backend.stores.contacts.get_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn optional_links_can_be_cleared() -> Result<()> {
    let backend = Backend::spawn(CrmStores::in_memory()).await?;
    let client = backend.client_stores()?;

    let mut company = NewCompany::new("Initech");
    company.website = "https://initech.test".into();
    company.revenue_cents = Some(2_500_000_00);
    let company = client.companies.create(company).await?;
    assert_eq!(company.revenue_cents, Some(2_500_000_00));

    let mut contact = NewContact::new("Peter", "Gibbons", "peter@initech.test");
    contact.company_id = Some(company.id);
    let contact = client.contacts.create(contact).await?;
    assert_eq!(contact.company_id, Some(company.id));

    let cleared = client
        .contacts
        .update(
            contact.id,
            ContactPatch {
                company_id: Some(None),
                ..ContactPatch::default()
            },
        )
        .await?;
    assert_eq!(cleared.company_id, None);
    assert_eq!(cleared.email, "peter@initech.test");

    let renamed = client
        .companies
        .update(
            company.id,
            CompanyPatch {
                name: Some("Initrode".into()),
                ..CompanyPatch::default()
            },
        )
        .await?;
    assert_eq!(renamed.name, "Initrode");
    assert_eq!(renamed.revenue_cents, Some(2_500_000_00));
    Ok(())
}
