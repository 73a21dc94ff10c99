use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::PropertyType;
use super::rules::ValidatedForm;

/// Canonical payload accepted by `POST /api/valuation/calculate`.
///
/// `residential_units` is present exactly when the property is residential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub property_type: PropertyType,
    pub purchase_date: NaiveDate,
    pub monthly_net_rent: f64,
    pub living_area: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residential_units: Option<f64>,
    pub parking_units: f64,
    pub land_value_per_sqm: f64,
    pub plot_area: f64,
    pub remaining_useful_life: f64,
    pub property_yield: f64,
    pub actual_purchase_price: f64,
}

/// Rename the validated form fields to the wire contract. Values pass through untouched.
pub fn map_request(form: &ValidatedForm) -> ValuationRequest {
    let fields = form.fields();
    let residential_units = match fields.property_type {
        PropertyType::Residential => form.residential_units(),
        PropertyType::Commercial => None,
    };

    ValuationRequest {
        property_type: fields.property_type,
        purchase_date: form.purchase_date(),
        monthly_net_rent: fields.monthly_net_cold_rent_eur,
        living_area: fields.area_sqm,
        residential_units,
        parking_units: fields.number_of_parking_units,
        land_value_per_sqm: fields.standard_land_value_eur_per_sqm,
        plot_area: fields.plot_area_sqm,
        remaining_useful_life: fields.remaining_useful_life_years,
        property_yield: fields.property_yield_percent,
        actual_purchase_price: fields.actual_purchase_price_eur,
    }
}
