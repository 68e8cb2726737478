//! # Feature Normalization
//!
//! Maps a loosely-typed `InputRecord` onto the fixed 14-slot vector the model
//! was trained against. The canonical order below is the implicit contract
//! between this module and every model artifact: vector position encodes
//! feature identity, so the order is never derived from the input.
//!
//! Normalization cannot fail. Missing fields, nulls and unparseable values all
//! resolve to a per-feature default.

use super::decode::{Categorical, ChestPain, Flag, RestingEcg, Sex, Slope, Thal};
use super::record::{FieldValue, InputRecord};
use ndarray::{Array1, ArrayView1};

/// Width of every feature vector.
pub const FEATURE_COUNT: usize = 14;

/// Logical features in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Age,
    Sex,
    Dataset,
    ChestPain,
    RestingBloodPressure,
    Cholesterol,
    FastingBloodSugar,
    RestingEcg,
    MaxHeartRate,
    ExerciseAngina,
    Oldpeak,
    Slope,
    Vessels,
    Thal,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Age,
        Feature::Sex,
        Feature::Dataset,
        Feature::ChestPain,
        Feature::RestingBloodPressure,
        Feature::Cholesterol,
        Feature::FastingBloodSugar,
        Feature::RestingEcg,
        Feature::MaxHeartRate,
        Feature::ExerciseAngina,
        Feature::Oldpeak,
        Feature::Slope,
        Feature::Vessels,
        Feature::Thal,
    ];

    /// Position in the canonical vector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical column name, as reported back to clients.
    pub fn name(self) -> &'static str {
        self.aliases()[0]
    }

    /// Accepted input field names, highest priority first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Feature::Age => &["age"],
            Feature::Sex => &["sex", "gender"],
            Feature::Dataset => &["dataset"],
            Feature::ChestPain => &["cp", "chestpain", "chest_pain"],
            Feature::RestingBloodPressure => &["trestbps", "trest_bp"],
            Feature::Cholesterol => &["chol", "cholesterol"],
            Feature::FastingBloodSugar => &["fbs", "fasting_bs"],
            Feature::RestingEcg => &["restecg", "rest_ecg"],
            Feature::MaxHeartRate => &["thalch", "thalach", "thal_ch", "thal_ach"],
            Feature::ExerciseAngina => &["exang", "exercise_angina", "exertional_angina"],
            Feature::Oldpeak => &["oldpeak", "old_peak"],
            Feature::Slope => &["slope"],
            Feature::Vessels => &["ca", "num_vessels", "vessels"],
            Feature::Thal => &["thal"],
        }
    }

    /// Decodes one raw value (or its absence) into this feature's numeric slot.
    fn decode(self, raw: Option<&FieldValue>) -> f64 {
        match self {
            Feature::Age
            | Feature::RestingBloodPressure
            | Feature::Cholesterol
            | Feature::MaxHeartRate
            | Feature::Oldpeak => raw.and_then(FieldValue::to_float).unwrap_or(0.0),
            Feature::Dataset | Feature::Vessels => raw
                .and_then(FieldValue::to_float)
                .map_or(0.0, f64::trunc),
            Feature::Sex => categorical::<Sex>(raw),
            Feature::ChestPain => categorical::<ChestPain>(raw),
            Feature::FastingBloodSugar | Feature::ExerciseAngina => categorical::<Flag>(raw),
            Feature::RestingEcg => categorical::<RestingEcg>(raw),
            Feature::Slope => categorical::<Slope>(raw),
            Feature::Thal => categorical::<Thal>(raw),
        }
    }
}

fn categorical<T: Categorical>(raw: Option<&FieldValue>) -> f64 {
    raw.map_or(T::DEFAULT, T::decode).code() as f64
}

/// Canonical feature names in vector order.
pub fn feature_order() -> [&'static str; FEATURE_COUNT] {
    Feature::ALL.map(Feature::name)
}

/// A complete, ordered, finite feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(&self.0[..])
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.0.to_vec())
    }
}

/// Builds the canonical feature vector for `record`.
pub fn normalize(record: &InputRecord) -> FeatureVector {
    let mut values = [0.0; FEATURE_COUNT];
    for feature in Feature::ALL {
        values[feature.index()] = feature.decode(record.lookup(feature.aliases()));
    }
    FeatureVector(values)
}
