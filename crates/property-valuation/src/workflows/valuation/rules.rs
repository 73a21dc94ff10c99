//! Field validity rules for the valuation form.
//!
//! The residential-units field is the only conditional one: it is enabled and required for
//! residential properties and pinned to 1 and disabled for commercial ones. Every transition is a
//! pure function from one [`ValuationForm`] to the next so the rules can be exercised without any
//! UI harness.

use std::fmt;

use chrono::NaiveDate;

use super::domain::{PropertyType, RawFormFields};

const PURCHASE_DATE_FORMAT: &str = "%Y-%m-%d";
const MIN_RESIDENTIAL_UNITS: f64 = 1.0;

/// Editable fields of the form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
    PurchaseDate,
    MonthlyNetColdRent,
    LivingArea,
    ResidentialUnits,
    ParkingUnits,
    LandValuePerSqm,
    PlotArea,
    RemainingUsefulLife,
    PropertyYield,
    ActualPurchasePrice,
}

impl FormField {
    pub const ALL: [FormField; 10] = [
        FormField::PurchaseDate,
        FormField::MonthlyNetColdRent,
        FormField::LivingArea,
        FormField::ResidentialUnits,
        FormField::ParkingUnits,
        FormField::LandValuePerSqm,
        FormField::PlotArea,
        FormField::RemainingUsefulLife,
        FormField::PropertyYield,
        FormField::ActualPurchasePrice,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::PurchaseDate => "purchase date",
            Self::MonthlyNetColdRent => "monthly net cold rent (EUR)",
            Self::LivingArea => "living area (sqm)",
            Self::ResidentialUnits => "residential units",
            Self::ParkingUnits => "parking units",
            Self::LandValuePerSqm => "standard land value (EUR/sqm)",
            Self::PlotArea => "plot area (sqm)",
            Self::RemainingUsefulLife => "remaining useful life (years)",
            Self::PropertyYield => "property yield (%)",
            Self::ActualPurchasePrice => "actual purchase price (EUR)",
        }
    }

    fn static_constraints(self) -> &'static [Constraint] {
        match self {
            Self::PurchaseDate => &[Constraint::Required],
            Self::ParkingUnits => &[Constraint::Required, Constraint::AtLeast(0.0)],
            Self::PropertyYield => &[
                Constraint::Required,
                Constraint::GreaterThan(0.0),
                Constraint::AtMost(100.0),
            ],
            Self::ResidentialUnits => &[Constraint::Required, Constraint::AtLeast(MIN_RESIDENTIAL_UNITS)],
            Self::MonthlyNetColdRent
            | Self::LivingArea
            | Self::LandValuePerSqm
            | Self::PlotArea
            | Self::RemainingUsefulLife
            | Self::ActualPurchasePrice => &[Constraint::Required, Constraint::GreaterThan(0.0)],
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single validity constraint attached to a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    Required,
    GreaterThan(f64),
    AtLeast(f64),
    AtMost(f64),
}

/// Reason a field failed validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Violation {
    #[error("is required")]
    Missing,
    #[error("must be a finite number")]
    NotANumber,
    #[error("must be a calendar date (YYYY-MM-DD)")]
    NotADate,
    #[error("must be greater than {0}")]
    MustBeGreaterThan(f64),
    #[error("must be at least {0}")]
    MustBeAtLeast(f64),
    #[error("must be at most {0}")]
    MustBeAtMost(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: FormField,
    pub violation: Violation,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.violation)
    }
}

/// Per-field report returned when the form blocks submission.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("form is invalid: {}", summarize(.violations))]
pub struct ValidationReport {
    pub violations: Vec<FieldViolation>,
}

impl ValidationReport {
    pub fn violation_for(&self, field: FormField) -> Option<&Violation> {
        self.violations
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| &entry.violation)
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// State of the conditional residential-units control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResidentialUnitsRule {
    Required { min: f64 },
    Disabled,
}

/// A single user edit applied through [`ValuationForm::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    PropertyType(PropertyType),
    PurchaseDate(String),
    MonthlyNetColdRent(f64),
    LivingArea(f64),
    ResidentialUnits(f64),
    ParkingUnits(f64),
    LandValuePerSqm(f64),
    PlotArea(f64),
    RemainingUsefulLife(f64),
    PropertyYield(f64),
    ActualPurchasePrice(f64),
}

/// Form values together with the enablement state derived from the property type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationForm {
    fields: RawFormFields,
    residential_units: ResidentialUnitsRule,
}

impl Default for ValuationForm {
    fn default() -> Self {
        Self::new(RawFormFields::default())
    }
}

impl ValuationForm {
    /// Build a form and run the conditional rule once for the initial property type.
    pub fn new(fields: RawFormFields) -> Self {
        let property_type = fields.property_type;
        let form = Self {
            fields,
            residential_units: ResidentialUnitsRule::Required {
                min: MIN_RESIDENTIAL_UNITS,
            },
        };
        apply_property_type(form, property_type)
    }

    pub fn fields(&self) -> &RawFormFields {
        &self.fields
    }

    pub fn property_type(&self) -> PropertyType {
        self.fields.property_type
    }

    pub fn residential_units_rule(&self) -> ResidentialUnitsRule {
        self.residential_units
    }

    pub fn is_enabled(&self, field: FormField) -> bool {
        match field {
            FormField::ResidentialUnits => {
                matches!(self.residential_units, ResidentialUnitsRule::Required { .. })
            }
            _ => true,
        }
    }

    /// Constraints currently active for `field`; empty when the field is disabled.
    pub fn constraints(&self, field: FormField) -> Vec<Constraint> {
        match (field, self.residential_units) {
            (FormField::ResidentialUnits, ResidentialUnitsRule::Disabled) => Vec::new(),
            (FormField::ResidentialUnits, ResidentialUnitsRule::Required { min }) => {
                vec![Constraint::Required, Constraint::AtLeast(min)]
            }
            (other, _) => other.static_constraints().to_vec(),
        }
    }

    /// Apply one edit. A property-type change re-runs the conditional rule before anything else;
    /// selecting the current type again is not a change and leaves the form untouched.
    pub fn apply(mut self, edit: FieldEdit) -> Self {
        let fields = &mut self.fields;
        match edit {
            FieldEdit::PropertyType(property_type) => {
                if property_type == fields.property_type {
                    return self;
                }
                return apply_property_type(self, property_type);
            }
            FieldEdit::ResidentialUnits(value) => {
                if self.residential_units == ResidentialUnitsRule::Disabled {
                    return self;
                }
                fields.number_of_residential_units = value;
            }
            FieldEdit::PurchaseDate(value) => fields.purchase_date = value,
            FieldEdit::MonthlyNetColdRent(value) => fields.monthly_net_cold_rent_eur = value,
            FieldEdit::LivingArea(value) => fields.area_sqm = value,
            FieldEdit::ParkingUnits(value) => fields.number_of_parking_units = value,
            FieldEdit::LandValuePerSqm(value) => fields.standard_land_value_eur_per_sqm = value,
            FieldEdit::PlotArea(value) => fields.plot_area_sqm = value,
            FieldEdit::RemainingUsefulLife(value) => fields.remaining_useful_life_years = value,
            FieldEdit::PropertyYield(value) => fields.property_yield_percent = value,
            FieldEdit::ActualPurchasePrice(value) => fields.actual_purchase_price_eur = value,
        }
        self
    }

    /// Check every enabled field; disabled fields never block validity.
    pub fn validate(&self) -> Result<ValidatedForm, ValidationReport> {
        let mut violations = Vec::new();

        let date_constraints = self.constraints(FormField::PurchaseDate);
        let purchase_date = match check_date(&self.fields.purchase_date, &date_constraints) {
            Ok(date) => date,
            Err(violation) => {
                violations.push(FieldViolation {
                    field: FormField::PurchaseDate,
                    violation,
                });
                None
            }
        };

        for field in FormField::ALL {
            let Some(value) = self.numeric_value(field) else {
                continue;
            };
            if !self.is_enabled(field) {
                continue;
            }
            if let Err(violation) = check_number(value, &self.constraints(field)) {
                violations.push(FieldViolation { field, violation });
            }
        }

        match purchase_date {
            Some(purchase_date) if violations.is_empty() => Ok(ValidatedForm {
                fields: self.fields.clone(),
                purchase_date,
                include_residential_units: self.is_enabled(FormField::ResidentialUnits),
            }),
            _ => Err(ValidationReport { violations }),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Value of a numeric field; `None` for the date.
    fn numeric_value(&self, field: FormField) -> Option<f64> {
        let fields = &self.fields;
        let value = match field {
            FormField::MonthlyNetColdRent => fields.monthly_net_cold_rent_eur,
            FormField::LivingArea => fields.area_sqm,
            FormField::ResidentialUnits => fields.number_of_residential_units,
            FormField::ParkingUnits => fields.number_of_parking_units,
            FormField::LandValuePerSqm => fields.standard_land_value_eur_per_sqm,
            FormField::PlotArea => fields.plot_area_sqm,
            FormField::RemainingUsefulLife => fields.remaining_useful_life_years,
            FormField::PropertyYield => fields.property_yield_percent,
            FormField::ActualPurchasePrice => fields.actual_purchase_price_eur,
            FormField::PurchaseDate => return None,
        };
        Some(value)
    }
}

/// Re-evaluate the conditional residential-units rule for `property_type`.
///
/// Coercing a residential value below the minimum writes the field directly and does not
/// re-enter this function.
pub fn apply_property_type(form: ValuationForm, property_type: PropertyType) -> ValuationForm {
    let ValuationForm { mut fields, .. } = form;
    fields.property_type = property_type;

    let residential_units = match property_type {
        PropertyType::Residential => {
            // NaN compares false, so it is coerced as well.
            if !(fields.number_of_residential_units >= MIN_RESIDENTIAL_UNITS) {
                fields.number_of_residential_units = MIN_RESIDENTIAL_UNITS;
            }
            ResidentialUnitsRule::Required {
                min: MIN_RESIDENTIAL_UNITS,
            }
        }
        PropertyType::Commercial => {
            fields.number_of_residential_units = MIN_RESIDENTIAL_UNITS;
            ResidentialUnitsRule::Disabled
        }
    };

    ValuationForm {
        fields,
        residential_units,
    }
}

fn check_date(raw: &str, constraints: &[Constraint]) -> Result<Option<NaiveDate>, Violation> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return if constraints.contains(&Constraint::Required) {
            Err(Violation::Missing)
        } else {
            Ok(None)
        };
    }
    NaiveDate::parse_from_str(trimmed, PURCHASE_DATE_FORMAT)
        .map(Some)
        .map_err(|_| Violation::NotADate)
}

fn check_number(value: f64, constraints: &[Constraint]) -> Result<(), Violation> {
    if !value.is_finite() {
        return Err(Violation::NotANumber);
    }
    for constraint in constraints {
        match *constraint {
            Constraint::Required => {}
            Constraint::GreaterThan(min) if value <= min => {
                return Err(Violation::MustBeGreaterThan(min))
            }
            Constraint::AtLeast(min) if value < min => return Err(Violation::MustBeAtLeast(min)),
            Constraint::AtMost(max) if value > max => return Err(Violation::MustBeAtMost(max)),
            _ => {}
        }
    }
    Ok(())
}

/// Form that passed [`ValuationForm::validate`]; the only input the request mapper accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedForm {
    fields: RawFormFields,
    purchase_date: NaiveDate,
    include_residential_units: bool,
}

impl ValidatedForm {
    pub fn fields(&self) -> &RawFormFields {
        &self.fields
    }

    pub fn purchase_date(&self) -> NaiveDate {
        self.purchase_date
    }

    pub fn residential_units(&self) -> Option<f64> {
        self.include_residential_units
            .then_some(self.fields.number_of_residential_units)
    }
}
