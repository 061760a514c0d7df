use std::collections::BTreeMap;

use crate::domain::contract::{Contact, ContractRequest, YesNo};

/// Name of the post-call feature that must never reach the classifier.
pub const LEAKAGE_FEATURE: &str = "duration";

/// Named classifier input rebuilt from a validated request, including the derived features the
/// classifier was trained with.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub numeric: BTreeMap<&'static str, f64>,
    pub categorical: BTreeMap<&'static str, &'static str>,
}

impl FeatureVector {
    pub fn from_request(req: &ContractRequest) -> Self {
        let numeric = BTreeMap::from([
            ("age", f64::from(req.age)),
            ("balance", req.balance as f64),
            ("day", f64::from(req.day)),
            ("campaign", f64::from(req.campaign)),
            ("pdays", f64::from(req.pdays)),
            ("previous", f64::from(req.previous)),
            ("has_credit", flag(req.loan == YesNo::Yes)),
            ("has_housing", flag(req.housing == YesNo::Yes)),
            (
                "contact_digital",
                flag(matches!(req.contact, Contact::Cellular | Contact::Telephone)),
            ),
        ]);

        let categorical = BTreeMap::from([
            ("job", req.job.as_str()),
            ("marital", req.marital.as_str()),
            ("education", req.education.as_str()),
            ("default", req.default.as_str()),
            ("housing", req.housing.as_str()),
            ("loan", req.loan.as_str()),
            ("contact", req.contact.as_str()),
            ("month", req.month.as_str()),
            ("poutcome", req.poutcome.as_str()),
            ("age_group", age_group(req.age)),
        ]);

        Self {
            numeric,
            categorical,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.numeric.contains_key(name) || self.categorical.contains_key(name)
    }
}

/// Training-time age bins: (0,30], (30,50], (50,100].
fn age_group(age: u8) -> &'static str {
    match age {
        0..=30 => "joven",
        31..=50 => "adulto",
        _ => "mayor",
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
