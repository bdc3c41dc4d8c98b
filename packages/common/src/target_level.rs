#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Audience a course is pitched at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")
)]
pub enum TargetLevel {
    #[serde(rename = "Lower Secondary")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Lower Secondary"))]
    LowerSecondary,
    #[serde(rename = "Advanced Level")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Advanced Level"))]
    AdvancedLevel,
}

impl TargetLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowerSecondary => "Lower Secondary",
            Self::AdvancedLevel => "Advanced Level",
        }
    }
}

impl fmt::Display for TargetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
