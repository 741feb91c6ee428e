use crate::snapshots::Category;
use serde::Serialize;
use std::fmt;

/// Header names shared by the exports. Exact spelling is part of the contract.
pub mod columns {
    pub const UNIT: &str = "Unit";
    pub const TENANT: &str = "Tenant";
    pub const STATUS: &str = "Status";
    pub const SQFT: &str = "Sqft";
    pub const RENT: &str = "Rent";
    pub const MARKET_RENT: &str = "Market Rent";
    pub const LATE_COUNT: &str = "Late Count";
    pub const MOVE_IN: &str = "Move-in";
    pub const MOVE_OUT: &str = "Move-out";
    pub const LEASE_FROM: &str = "Lease From";
    pub const LEASE_TO: &str = "Lease To";
    /// Derived from `Lease To - Lease From`; strictly positive or missing.
    pub const LEASE_DAYS: &str = "Lease Days";

    pub const PRIORITY: &str = "Priority";
    pub const WORK_ORDER_TYPE: &str = "Work Order Type";
    pub const WORK_ORDER_ISSUE: &str = "Work Order Issue";
    pub const AMOUNT: &str = "Amount";

    pub const UNIT_TYPE: &str = "Unit Type";
    pub const BED_BATH: &str = "Bd/Ba";
    pub const UNIT_STATUS: &str = "Unit Status";
    pub const DAYS_VACANT: &str = "Days Vacant";
    pub const RENT_READY: &str = "Rent Ready";
    pub const LAST_MOVE_IN: &str = "Last Move In";
    pub const LAST_MOVE_OUT: &str = "Last Move Out";
    pub const AVAILABLE_ON: &str = "Available On";
    pub const NEXT_MOVE_IN: &str = "Next Move In";
}

/// Target type of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Currency,
    Number,
    Date,
    Categorical,
}

impl ColumnKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Currency => "currency",
            Self::Number => "numeric",
            Self::Date => "date",
            Self::Categorical => "categorical",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn spec(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec { name, kind }
}

const TENANT_ROLL: &[ColumnSpec] = &[
    spec(columns::UNIT, ColumnKind::Categorical),
    spec(columns::TENANT, ColumnKind::Categorical),
    spec(columns::STATUS, ColumnKind::Categorical),
    spec(columns::SQFT, ColumnKind::Number),
    spec(columns::RENT, ColumnKind::Currency),
    spec(columns::MARKET_RENT, ColumnKind::Currency),
    spec(columns::LATE_COUNT, ColumnKind::Number),
    spec(columns::MOVE_IN, ColumnKind::Date),
    spec(columns::MOVE_OUT, ColumnKind::Date),
    spec(columns::LEASE_FROM, ColumnKind::Date),
    spec(columns::LEASE_TO, ColumnKind::Date),
];

const WORK_ORDERS: &[ColumnSpec] = &[
    spec(columns::STATUS, ColumnKind::Categorical),
    spec(columns::PRIORITY, ColumnKind::Categorical),
    spec(columns::WORK_ORDER_TYPE, ColumnKind::Categorical),
    spec(columns::WORK_ORDER_ISSUE, ColumnKind::Categorical),
    spec(columns::AMOUNT, ColumnKind::Currency),
];

const VACANCY_DETAIL: &[ColumnSpec] = &[
    spec(columns::UNIT, ColumnKind::Categorical),
    spec(columns::UNIT_TYPE, ColumnKind::Categorical),
    spec(columns::BED_BATH, ColumnKind::Categorical),
    spec(columns::SQFT, ColumnKind::Number),
    spec(columns::UNIT_STATUS, ColumnKind::Categorical),
    spec(columns::DAYS_VACANT, ColumnKind::Currency),
    spec(columns::RENT_READY, ColumnKind::Categorical),
    spec(columns::LAST_MOVE_IN, ColumnKind::Date),
    spec(columns::LAST_MOVE_OUT, ColumnKind::Date),
    spec(columns::AVAILABLE_ON, ColumnKind::Date),
    spec(columns::NEXT_MOVE_IN, ColumnKind::Date),
];

pub fn schema_for(category: Category) -> &'static [ColumnSpec] {
    match category {
        Category::TenantRoll => TENANT_ROLL,
        Category::WorkOrders => WORK_ORDERS,
        Category::VacancyDetail => VACANCY_DETAIL,
    }
}
