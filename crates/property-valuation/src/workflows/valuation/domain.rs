use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Discriminant deciding which form fields are mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[default]
    Residential,
    Commercial,
}

impl PropertyType {
    pub const ALL: [PropertyType; 2] = [PropertyType::Residential, PropertyType::Commercial];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Residential => "Residential (Wohnen)",
            Self::Commercial => "Commercial (Gewerbe)",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Commercial => "commercial",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown property type '{0}' (expected residential or commercial)")]
pub struct UnknownPropertyType(pub String);

impl FromStr for PropertyType {
    type Err = UnknownPropertyType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "residential" | "wohnen" => Ok(Self::Residential),
            "commercial" | "gewerbe" => Ok(Self::Commercial),
            other => Err(UnknownPropertyType(other.to_string())),
        }
    }
}

/// UI-shaped field set as the user edits it, before any rule or mapping is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFormFields {
    pub property_type: PropertyType,
    pub purchase_date: String,
    pub monthly_net_cold_rent_eur: f64,
    pub area_sqm: f64,
    pub number_of_residential_units: f64,
    pub number_of_parking_units: f64,
    pub standard_land_value_eur_per_sqm: f64,
    pub plot_area_sqm: f64,
    pub remaining_useful_life_years: f64,
    pub property_yield_percent: f64,
    pub actual_purchase_price_eur: f64,
}

impl Default for RawFormFields {
    fn default() -> Self {
        Self {
            property_type: PropertyType::Residential,
            purchase_date: String::new(),
            monthly_net_cold_rent_eur: 0.0,
            area_sqm: 0.0,
            number_of_residential_units: 1.0,
            number_of_parking_units: 0.0,
            standard_land_value_eur_per_sqm: 0.0,
            plot_area_sqm: 0.0,
            remaining_useful_life_years: 0.0,
            property_yield_percent: 0.0,
            actual_purchase_price_eur: 0.0,
        }
    }
}

/// Consumer price index reference applied to the valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpiReference {
    pub year: i32,
    pub month: u32,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub index_value: f64,
    pub base_year: i32,
}

/// Breakdown of the yearly management costs deducted from gross income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagementCosts {
    #[serde(deserialize_with = "deserialize_decimal")]
    pub administration: f64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub maintenance: f64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub risk_of_rent_loss: f64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub total: f64,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub risk_percentage: Option<f64>,
}

/// Aggregate returned by the valuation service.
///
/// Decimals are read into `f64` for display. When decoded with
/// [`ValuationResult::from_service_payload`] the payload itself is kept as well, and that is what
/// the analysis endpoint receives, so decimal strings like `"18.2600"` or `"NaN"` go back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    #[serde(deserialize_with = "deserialize_decimal")]
    pub building_share_percent: f64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub land_share_percent: f64,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub actual_building_value: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub actual_land_value: Option<f64>,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub theoretical_building_value: f64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub theoretical_total_value: f64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub land_value: f64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub land_interest: f64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub annual_gross_income: f64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub annual_net_income: f64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub building_net_income: f64,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub cpi_base_2001: f64,
    pub cpi_used: CpiReference,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub index_factor: f64,
    pub management_costs: ManagementCosts,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_data: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    pub(crate) source: Option<Value>,
}

impl ValuationResult {
    pub fn from_service_payload(payload: Value) -> Result<Self, serde_json::Error> {
        let mut result = Self::deserialize(&payload)?;
        result.source = Some(payload);
        Ok(result)
    }

    /// The payload this result was decoded from, if any.
    pub fn service_payload(&self) -> Option<&Value> {
        self.source.as_ref()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Number(f64),
    Text(String),
}

impl DecimalRepr {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            DecimalRepr::Number(value) => Ok(value),
            DecimalRepr::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|err| E::custom(format!("invalid decimal '{raw}': {err}"))),
        }
    }
}

/// Decimal amounts arrive either as JSON numbers or as decimal strings.
pub(crate) fn deserialize_decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    DecimalRepr::deserialize(deserializer)?.into_f64()
}

pub(crate) fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DecimalRepr>::deserialize(deserializer)?
        .map(DecimalRepr::into_f64)
        .transpose()
}
