use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::workflows::valuation::classify::CallFailure;
use crate::workflows::valuation::client::ValuationApi;
use crate::workflows::valuation::domain::{
    CpiReference, ManagementCosts, PropertyType, RawFormFields, ValuationResult,
};
use crate::workflows::valuation::mapping::ValuationRequest;

pub(crate) fn sample_result() -> ValuationResult {
    ValuationResult {
        building_share_percent: 48.63,
        land_share_percent: 51.37,
        actual_building_value: Some(243_150.0),
        actual_land_value: Some(256_850.0),
        theoretical_building_value: 189_347.1,
        theoretical_total_value: 389_347.1,
        land_value: 200_000.0,
        land_interest: 10_000.0,
        annual_gross_income: 24_000.0,
        annual_net_income: 20_369.5,
        building_net_income: 10_369.5,
        cpi_base_2001: 84.5,
        cpi_used: CpiReference {
            year: 2023,
            month: 10,
            index_value: 117.8,
            base_year: 2020,
        },
        index_factor: 1.394,
        management_costs: ManagementCosts {
            administration: 1_050.0,
            maintenance: 2_100.5,
            risk_of_rent_loss: 480.0,
            total: 3_630.5,
            risk_percentage: Some(2.0),
        },
        multiplier: 18.26,
        insight_text: None,
        input_data: None,
        extra: BTreeMap::new(),
        source: None,
    }
}

pub(crate) fn result_with_multiplier(multiplier: f64) -> ValuationResult {
    ValuationResult {
        multiplier,
        ..sample_result()
    }
}

pub(super) fn form_fields() -> RawFormFields {
    RawFormFields {
        property_type: PropertyType::Residential,
        purchase_date: "2024-01-15".to_string(),
        monthly_net_cold_rent_eur: 2000.0,
        area_sqm: 150.0,
        number_of_residential_units: 3.0,
        number_of_parking_units: 2.0,
        standard_land_value_eur_per_sqm: 500.0,
        plot_area_sqm: 400.0,
        remaining_useful_life_years: 50.0,
        property_yield_percent: 5.0,
        actual_purchase_price_eur: 500_000.0,
    }
}

/// Scripted reply, optionally held back until the gate is notified.
pub(super) struct Scripted<T> {
    outcome: Result<T, CallFailure>,
    gate: Option<Arc<Notify>>,
}

impl<T> Scripted<T> {
    pub(super) fn ok(value: T) -> Self {
        Self {
            outcome: Ok(value),
            gate: None,
        }
    }

    pub(super) fn fail(failure: CallFailure) -> Self {
        Self {
            outcome: Err(failure),
            gate: None,
        }
    }

    pub(super) fn gated(mut self, gate: &Arc<Notify>) -> Self {
        self.gate = Some(Arc::clone(gate));
        self
    }
}

/// Transport double that replays scripted replies in order and records what it was sent.
#[derive(Default)]
pub(super) struct ScriptedApi {
    calculations: Mutex<VecDeque<Scripted<ValuationResult>>>,
    analyses: Mutex<VecDeque<Scripted<String>>>,
    calculate_calls: AtomicUsize,
    analyze_calls: AtomicUsize,
    sent_requests: Mutex<Vec<ValuationRequest>>,
    analyzed: Mutex<Vec<ValuationResult>>,
}

impl ScriptedApi {
    pub(super) fn with_calculation(self, reply: Scripted<ValuationResult>) -> Self {
        self.calculations
            .lock()
            .expect("script mutex poisoned")
            .push_back(reply);
        self
    }

    pub(super) fn with_analysis(self, reply: Scripted<String>) -> Self {
        self.analyses
            .lock()
            .expect("script mutex poisoned")
            .push_back(reply);
        self
    }

    pub(super) fn calculate_calls(&self) -> usize {
        self.calculate_calls.load(Ordering::SeqCst)
    }

    pub(super) fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub(super) fn sent_requests(&self) -> Vec<ValuationRequest> {
        self.sent_requests
            .lock()
            .expect("request mutex poisoned")
            .clone()
    }

    pub(super) fn analyzed(&self) -> Vec<ValuationResult> {
        self.analyzed.lock().expect("payload mutex poisoned").clone()
    }
}

async fn replay<T>(queue: &Mutex<VecDeque<Scripted<T>>>) -> Result<T, CallFailure> {
    let next = queue.lock().expect("script mutex poisoned").pop_front();
    let Some(Scripted { outcome, gate }) = next else {
        return Err(CallFailure::unreachable("no scripted reply left"));
    };
    if let Some(gate) = gate {
        gate.notified().await;
    }
    outcome
}

impl ValuationApi for ScriptedApi {
    async fn calculate(&self, request: &ValuationRequest) -> Result<ValuationResult, CallFailure> {
        self.calculate_calls.fetch_add(1, Ordering::SeqCst);
        self.sent_requests
            .lock()
            .expect("request mutex poisoned")
            .push(request.clone());
        replay(&self.calculations).await
    }

    async fn analyze(&self, result: &ValuationResult) -> Result<String, CallFailure> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.analyzed
            .lock()
            .expect("payload mutex poisoned")
            .push(result.clone());
        replay(&self.analyses).await
    }
}
