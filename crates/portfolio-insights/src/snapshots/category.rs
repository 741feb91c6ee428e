use serde::{Deserialize, Serialize};
use std::fmt;

/// The three portfolio data domains exported by the property management system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TenantRoll,
    WorkOrders,
    VacancyDetail,
}

impl Category {
    pub const fn ordered() -> [Self; 3] {
        [Self::TenantRoll, Self::WorkOrders, Self::VacancyDetail]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TenantRoll => "Tenant Roll",
            Self::WorkOrders => "Work Orders",
            Self::VacancyDetail => "Vacancy Detail",
        }
    }

    /// Filename prefix used by the standard exports.
    pub const fn default_prefix(self) -> &'static str {
        match self {
            Self::TenantRoll => "rent_roll",
            Self::WorkOrders => "work_order",
            Self::VacancyDetail => "unit_vacancy_detail",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
