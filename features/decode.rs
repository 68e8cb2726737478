//! # Categorical Decoding
//!
//! Each categorical clinical attribute is a small tagged type with a single
//! `decode` entry point. Decoding is total: every input, however malformed,
//! resolves to a definite variant, and every variant maps to the integer code
//! the model was trained against.
//!
//! Clients send these attributes either as the numeric code itself or as free
//! text ("typical angina", "downsloping", "fixed defect"). Numeric input always
//! wins and is truncated toward zero; text is matched against known keywords
//! and then, failing that, parsed as a number. Codes outside the documented
//! range are carried through as `Coded` rather than being clamped.

use super::record::FieldValue;

/// A categorical attribute with a total decoder and a documented default.
pub trait Categorical: Copy {
    /// Variant used when the field is absent or cannot be decoded.
    const DEFAULT: Self;

    fn decode(value: &FieldValue) -> Self;

    fn from_code(code: i64) -> Self;

    fn code(self) -> i64;
}

/// Truncates a finite number to an integer code. Values outside the `i64`
/// range count as a cast failure rather than saturating.
fn whole(n: f64) -> Option<i64> {
    let truncated = n.trunc();
    (truncated >= i64::MIN as f64 && truncated < i64::MAX as f64).then(|| truncated as i64)
}

/// Shared decoding path: numeric passthrough, then keyword matching on text,
/// then a numeric parse of the text, then the default.
fn decode_with<T: Categorical>(value: &FieldValue, keywords: impl Fn(&str) -> Option<T>) -> T {
    if let Some(n) = value.as_number() {
        return whole(n).map_or(T::DEFAULT, T::from_code);
    }
    let Some(text) = value.normalized_text() else {
        return T::DEFAULT;
    };
    keywords(&text)
        .or_else(|| text.parse::<f64>().ok().and_then(whole).map(T::from_code))
        .unwrap_or(T::DEFAULT)
}

const AFFIRMATIVE: [&str; 5] = ["1", "true", "t", "yes", "y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Female,
    Male,
    Coded(i64),
}

impl Categorical for Sex {
    const DEFAULT: Self = Sex::Female;

    /// Numbers pass through; text is male only for a fixed set of tokens.
    /// Text is never parsed as a number, so "2" decodes to female.
    fn decode(value: &FieldValue) -> Self {
        if let Some(n) = value.as_number() {
            return whole(n).map_or(Self::DEFAULT, Self::from_code);
        }
        match value.normalized_text() {
            Some(text) if text == "m" || text == "male" || AFFIRMATIVE.contains(&text.as_str()) => {
                Sex::Male
            }
            _ => Sex::Female,
        }
    }

    fn from_code(code: i64) -> Self {
        match code {
            0 => Sex::Female,
            1 => Sex::Male,
            other => Sex::Coded(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            Sex::Female => 0,
            Sex::Male => 1,
            Sex::Coded(c) => c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestPain {
    TypicalAngina,
    AtypicalAngina,
    NonAnginal,
    Asymptomatic,
    Coded(i64),
}

impl Categorical for ChestPain {
    const DEFAULT: Self = ChestPain::TypicalAngina;

    fn decode(value: &FieldValue) -> Self {
        decode_with(value, |text| {
            if text.starts_with("typ") {
                Some(ChestPain::TypicalAngina)
            } else if text.starts_with("aty") {
                Some(ChestPain::AtypicalAngina)
            } else if text.starts_with("non") {
                Some(ChestPain::NonAnginal)
            } else if text.starts_with("asy") {
                Some(ChestPain::Asymptomatic)
            } else {
                None
            }
        })
    }

    fn from_code(code: i64) -> Self {
        match code {
            0 => ChestPain::TypicalAngina,
            1 => ChestPain::AtypicalAngina,
            2 => ChestPain::NonAnginal,
            3 => ChestPain::Asymptomatic,
            other => ChestPain::Coded(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            ChestPain::TypicalAngina => 0,
            ChestPain::AtypicalAngina => 1,
            ChestPain::NonAnginal => 2,
            ChestPain::Asymptomatic => 3,
            ChestPain::Coded(c) => c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestingEcg {
    Normal,
    StTAbnormality,
    LeftVentricularHypertrophy,
    Coded(i64),
}

impl Categorical for RestingEcg {
    const DEFAULT: Self = RestingEcg::Normal;

    /// Substring checks run in a fixed order and "normal" is tested first, so
    /// any text containing "abnormal" decodes as `Normal`. Existing clients
    /// depend on this ordering.
    fn decode(value: &FieldValue) -> Self {
        decode_with(value, |text| {
            if text.contains("normal") {
                Some(RestingEcg::Normal)
            } else if text.contains("st") || text.contains("abnormal") {
                Some(RestingEcg::StTAbnormality)
            } else if text.contains("left") {
                Some(RestingEcg::LeftVentricularHypertrophy)
            } else {
                None
            }
        })
    }

    fn from_code(code: i64) -> Self {
        match code {
            0 => RestingEcg::Normal,
            1 => RestingEcg::StTAbnormality,
            2 => RestingEcg::LeftVentricularHypertrophy,
            other => RestingEcg::Coded(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            RestingEcg::Normal => 0,
            RestingEcg::StTAbnormality => 1,
            RestingEcg::LeftVentricularHypertrophy => 2,
            RestingEcg::Coded(c) => c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slope {
    Downsloping,
    Flat,
    Upsloping,
    Coded(i64),
}

impl Categorical for Slope {
    const DEFAULT: Self = Slope::Flat;

    fn decode(value: &FieldValue) -> Self {
        decode_with(value, |text| {
            if text.starts_with("up") {
                Some(Slope::Upsloping)
            } else if text.starts_with("flat") {
                Some(Slope::Flat)
            } else if text.starts_with("down") {
                Some(Slope::Downsloping)
            } else {
                None
            }
        })
    }

    fn from_code(code: i64) -> Self {
        match code {
            0 => Slope::Downsloping,
            1 => Slope::Flat,
            2 => Slope::Upsloping,
            other => Slope::Coded(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            Slope::Downsloping => 0,
            Slope::Flat => 1,
            Slope::Upsloping => 2,
            Slope::Coded(c) => c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thal {
    Normal,
    FixedDefect,
    ReversibleDefect,
    Coded(i64),
}

impl Categorical for Thal {
    const DEFAULT: Self = Thal::Normal;

    fn decode(value: &FieldValue) -> Self {
        decode_with(value, |text| {
            if text.contains("normal") {
                Some(Thal::Normal)
            } else if text.contains("fixed") {
                Some(Thal::FixedDefect)
            } else if text.contains("reversible") {
                Some(Thal::ReversibleDefect)
            } else {
                None
            }
        })
    }

    fn from_code(code: i64) -> Self {
        match code {
            1 => Thal::Normal,
            2 => Thal::FixedDefect,
            3 => Thal::ReversibleDefect,
            other => Thal::Coded(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            Thal::Normal => 1,
            Thal::FixedDefect => 2,
            Thal::ReversibleDefect => 3,
            Thal::Coded(c) => c,
        }
    }
}

/// Yes/no attributes (fasting blood sugar, exercise-induced angina).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    No,
    Yes,
}

impl Categorical for Flag {
    const DEFAULT: Self = Flag::No;

    /// `true` and any non-zero number are `Yes`; text is `Yes` only for the
    /// affirmative tokens.
    fn decode(value: &FieldValue) -> Self {
        let truthy = match value.as_number() {
            Some(n) => n != 0.0,
            None => value
                .normalized_text()
                .is_some_and(|text| AFFIRMATIVE.contains(&text.as_str())),
        };
        if truthy { Flag::Yes } else { Flag::No }
    }

    fn from_code(code: i64) -> Self {
        if code != 0 { Flag::Yes } else { Flag::No }
    }

    fn code(self) -> i64 {
        match self {
            Flag::No => 0,
            Flag::Yes => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::from(s)
    }

    #[test]
    fn sex_accepts_textual_and_numeric_forms() {
        assert_eq!(Sex::decode(&text("male")), Sex::Male);
        assert_eq!(Sex::decode(&text(" M ")), Sex::Male);
        assert_eq!(Sex::decode(&text("Yes")), Sex::Male);
        assert_eq!(Sex::decode(&text("female")), Sex::Female);
        assert_eq!(Sex::decode(&text("2")), Sex::Female);
        assert_eq!(Sex::decode(&FieldValue::from(1)), Sex::Male);
        assert_eq!(Sex::decode(&FieldValue::from(true)), Sex::Male);
        assert_eq!(Sex::decode(&FieldValue::from(2)).code(), 2);
    }

    #[test]
    fn chest_pain_prefixes_then_numeric_then_default() {
        assert_eq!(ChestPain::decode(&text("typical angina")).code(), 0);
        assert_eq!(ChestPain::decode(&text("atypical")).code(), 1);
        assert_eq!(ChestPain::decode(&text("non-anginal")).code(), 2);
        assert_eq!(ChestPain::decode(&text("Asymptomatic")).code(), 3);
        assert_eq!(ChestPain::decode(&text("2.0")).code(), 2);
        assert_eq!(ChestPain::decode(&text("unknown-garbage")).code(), 0);
        assert_eq!(ChestPain::decode(&FieldValue::from(3.7)).code(), 3);
        assert_eq!(ChestPain::decode(&FieldValue::from(f64::NAN)).code(), 0);
    }

    #[test]
    fn resting_ecg_substring_order_is_preserved() {
        assert_eq!(RestingEcg::decode(&text("normal")).code(), 0);
        assert_eq!(RestingEcg::decode(&text("ST-T wave abnormality")).code(), 0);
        assert_eq!(RestingEcg::decode(&text("st-t wave")).code(), 1);
        assert_eq!(
            RestingEcg::decode(&text("left ventricular hypertrophy")).code(),
            2
        );
        assert_eq!(RestingEcg::decode(&text("1")).code(), 1);
        assert_eq!(RestingEcg::decode(&text("???")).code(), 0);
    }

    #[test]
    fn slope_defaults_to_flat() {
        assert_eq!(Slope::decode(&text("upsloping")).code(), 2);
        assert_eq!(Slope::decode(&text("flat")).code(), 1);
        assert_eq!(Slope::decode(&text("downsloping")).code(), 0);
        assert_eq!(Slope::decode(&text("sideways")).code(), 1);
        assert_eq!(Slope::decode(&FieldValue::Null).code(), 1);
    }

    #[test]
    fn thal_keywords_and_unknown_spellings() {
        assert_eq!(Thal::decode(&text("normal")).code(), 1);
        assert_eq!(Thal::decode(&text("fixed defect")).code(), 2);
        assert_eq!(Thal::decode(&text("reversible defect")).code(), 3);
        assert_eq!(Thal::decode(&text("reversable defect")).code(), 1);
        assert_eq!(Thal::decode(&FieldValue::from(0)), Thal::Coded(0));
    }

    #[test]
    fn codes_beyond_integer_range_fall_back_to_default() {
        assert_eq!(ChestPain::decode(&FieldValue::from(1e300)).code(), 0);
        assert_eq!(Thal::decode(&FieldValue::from(-1e19)).code(), 1);
        assert_eq!(Slope::decode(&text("9.3e18")).code(), 1);
        assert_eq!(Sex::decode(&FieldValue::from(1e19)), Sex::Female);
        assert_eq!(Thal::decode(&FieldValue::from(9.0e18)).code(), 9_000_000_000_000_000_000);
    }

    #[test]
    fn flag_treats_any_nonzero_number_as_yes() {
        assert_eq!(Flag::decode(&text("Yes")), Flag::Yes);
        assert_eq!(Flag::decode(&text("t")), Flag::Yes);
        assert_eq!(Flag::decode(&text("no")), Flag::No);
        assert_eq!(Flag::decode(&FieldValue::from(0)), Flag::No);
        assert_eq!(Flag::decode(&FieldValue::from(2)), Flag::Yes);
        assert_eq!(Flag::decode(&FieldValue::from(true)), Flag::Yes);
        assert_eq!(Flag::from_code(5), Flag::Yes);
    }
}
