use clap::Args;
use property_valuation::error::AppError;
use property_valuation::workflows::valuation::{
    FieldEdit, PropertyType, RawFormFields, ValuationForm,
};
use std::path::{Path, PathBuf};

/// Form input: an optional JSON file using the form's camelCase field names, overridden by flags.
#[derive(Args, Debug, Default)]
pub(crate) struct FormArgs {
    /// JSON file with form values (propertyType, purchaseDate, monthlyNetColdRentEur, ...)
    #[arg(long = "form")]
    pub(crate) form_path: Option<PathBuf>,
    /// residential|commercial (wohnen|gewerbe accepted)
    #[arg(long, value_parser = parse_property_type)]
    pub(crate) property_type: Option<PropertyType>,
    /// Purchase date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) purchase_date: Option<String>,
    /// Monthly net cold rent in EUR
    #[arg(long)]
    pub(crate) monthly_rent: Option<f64>,
    /// Living area in square metres
    #[arg(long)]
    pub(crate) living_area: Option<f64>,
    /// Residential units (ignored for commercial properties)
    #[arg(long)]
    pub(crate) residential_units: Option<f64>,
    /// Parking units
    #[arg(long)]
    pub(crate) parking_units: Option<f64>,
    /// Standard land value in EUR per square metre
    #[arg(long)]
    pub(crate) land_value_per_sqm: Option<f64>,
    /// Plot area in square metres
    #[arg(long)]
    pub(crate) plot_area: Option<f64>,
    /// Remaining useful life in years
    #[arg(long)]
    pub(crate) remaining_life: Option<f64>,
    /// Property yield in percent (0-100)
    #[arg(long)]
    pub(crate) property_yield: Option<f64>,
    /// Actual purchase price in EUR
    #[arg(long)]
    pub(crate) purchase_price: Option<f64>,
}

impl FormArgs {
    /// Flag values as edits, property type first so the units rule settles before other values land.
    fn edits(&self) -> Vec<FieldEdit> {
        let mut edits = Vec::new();
        if let Some(property_type) = self.property_type {
            edits.push(FieldEdit::PropertyType(property_type));
        }
        if let Some(date) = &self.purchase_date {
            edits.push(FieldEdit::PurchaseDate(date.clone()));
        }
        let numeric: [(Option<f64>, fn(f64) -> FieldEdit); 9] = [
            (self.monthly_rent, FieldEdit::MonthlyNetColdRent),
            (self.living_area, FieldEdit::LivingArea),
            (self.residential_units, FieldEdit::ResidentialUnits),
            (self.parking_units, FieldEdit::ParkingUnits),
            (self.land_value_per_sqm, FieldEdit::LandValuePerSqm),
            (self.plot_area, FieldEdit::PlotArea),
            (self.remaining_life, FieldEdit::RemainingUsefulLife),
            (self.property_yield, FieldEdit::PropertyYield),
            (self.purchase_price, FieldEdit::ActualPurchasePrice),
        ];
        edits.extend(
            numeric
                .into_iter()
                .filter_map(|(value, edit)| value.map(edit)),
        );
        edits
    }
}

pub(crate) fn load_form(args: &FormArgs) -> Result<ValuationForm, AppError> {
    let fields = match &args.form_path {
        Some(path) => read_form_file(path)?,
        None => RawFormFields::default(),
    };
    Ok(apply_overrides(ValuationForm::new(fields), args))
}

fn read_form_file(path: &Path) -> Result<RawFormFields, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let fields = serde_json::from_str(&raw)?;
    tracing::debug!(path = %path.display(), "loaded form file");
    Ok(fields)
}

fn apply_overrides(form: ValuationForm, args: &FormArgs) -> ValuationForm {
    args.edits()
        .into_iter()
        .fold(form, |form, edit| form.apply(edit))
}

pub(crate) fn parse_property_type(raw: &str) -> Result<PropertyType, String> {
    raw.parse::<PropertyType>().map_err(|err| err.to_string())
}
