#![allow(dead_code)]

use cql::{Condition, CqlResult, Field, FieldRef, JoinCondition, Loadable, Model, Relation, preload};
use uuid::Uuid;

pub struct Company;

impl Model for Company {
    const NAME: &'static str = "Company";
    const TABLE: &'static str = "companies";

    fn fields() -> Vec<FieldRef> {
        vec![Company::id().into(), Company::name().into()]
    }
}

impl Company {
    pub fn id() -> Field<Company, Uuid> {
        Field::new("ID").read_only()
    }

    pub fn name() -> Field<Company, String> {
        Field::new("Name")
    }

    pub fn seller(conditions: Vec<Condition<Seller>>) -> JoinCondition<Company> {
        Relation::new("Seller", "id", "company_id").join(conditions)
    }
}

pub struct Seller;

impl Model for Seller {
    const NAME: &'static str = "Seller";
    const TABLE: &'static str = "sellers";

    fn fields() -> Vec<FieldRef> {
        vec![
            Seller::id().into(),
            Seller::name().into(),
            Seller::company_id().into(),
        ]
    }
}

impl Seller {
    pub fn id() -> Field<Seller, Uuid> {
        Field::new("ID").read_only()
    }

    pub fn name() -> Field<Seller, String> {
        Field::new("Name")
    }

    pub fn company_id() -> Field<Seller, Uuid> {
        Field::new("CompanyID").nullable()
    }

    pub fn company(conditions: Vec<Condition<Company>>) -> JoinCondition<Seller> {
        Relation::new("Company", "company_id", "id").join(conditions)
    }
}

/// Rows as an execution layer would hydrate them.
#[derive(Debug, Default)]
pub struct CompanyRow {
    pub id: Uuid,
    pub name: String,
}

impl Loadable for CompanyRow {
    fn is_loaded(&self) -> bool {
        !self.id.is_nil()
    }
}

#[derive(Debug, Default)]
pub struct SellerRow {
    pub id: Uuid,
    pub name: String,
    pub company_id: Option<Uuid>,
    pub company: Option<CompanyRow>,
}

impl SellerRow {
    pub fn get_company(&self) -> CqlResult<Option<&CompanyRow>> {
        preload::verify_pointer_loaded(self.company_id.as_ref(), self.company.as_ref())
    }
}
