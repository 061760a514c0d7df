use serde::Serialize;

use crate::domain::sales::round_to;

/// Declares a closed, case-sensitive set of string values accepted from the API.
macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Comma-separated list of accepted values, for error messages.
            pub fn allowed() -> String {
                Self::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum!(Job {
    Admin => "admin.",
    BlueCollar => "blue-collar",
    Entrepreneur => "entrepreneur",
    Housemaid => "housemaid",
    Management => "management",
    Retired => "retired",
    SelfEmployed => "self-employed",
    Services => "services",
    Student => "student",
    Technician => "technician",
    Unemployed => "unemployed",
    Unknown => "unknown",
});

closed_enum!(Marital {
    Married => "married",
    Single => "single",
    Divorced => "divorced",
});

closed_enum!(Education {
    Primary => "primary",
    Secondary => "secondary",
    Tertiary => "tertiary",
    Unknown => "unknown",
});

closed_enum!(
    /// Shared by `default`, `housing` and `loan`.
    YesNo {
        Yes => "yes",
        No => "no",
    }
);

closed_enum!(Contact {
    Cellular => "cellular",
    Telephone => "telephone",
    Unknown => "unknown",
});

closed_enum!(Month {
    Jan => "jan",
    Feb => "feb",
    Mar => "mar",
    Apr => "apr",
    May => "may",
    Jun => "jun",
    Jul => "jul",
    Aug => "aug",
    Sep => "sep",
    Oct => "oct",
    Nov => "nov",
    Dec => "dec",
});

closed_enum!(Poutcome {
    Success => "success",
    Failure => "failure",
    Other => "other",
    Unknown => "unknown",
});

/// A validated client record for the contract classifier.
///
/// There is deliberately no call-duration field: it is only known after the call, so it can
/// never be part of the classifier input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractRequest {
    pub age: u8,
    pub job: Job,
    pub marital: Marital,
    pub education: Education,
    pub default: YesNo,
    pub balance: i64,
    pub housing: YesNo,
    pub loan: YesNo,
    pub contact: Contact,
    pub day: u8,
    pub month: Month,
    pub campaign: u32,
    pub pdays: i32,
    pub previous: u32,
    pub poutcome: Poutcome,
}

impl ContractRequest {
    pub fn summary(&self) -> ClientSummary {
        ClientSummary {
            age: self.age,
            job: self.job,
            education: self.education,
            balance: self.balance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Buckets a positive-class probability. The high check must run before the medium one:
    /// 0.70 and 0.30 are high, 0.60 and 0.40 are medium.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.70 || probability <= 0.30 {
            Confidence::High
        } else if probability >= 0.60 || probability <= 0.40 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContractPrediction {
    pub will_contract: bool,
    pub probability: f64,
    pub confidence: Confidence,
}

impl ContractPrediction {
    /// Rounds the raw classifier output to 4 decimals, then derives the decision and the
    /// confidence from the rounded value so the response never contradicts itself.
    pub fn from_probability(raw: f64) -> Self {
        let probability = round_to(raw, 4);
        Self {
            will_contract: probability >= 0.5,
            probability,
            confidence: Confidence::from_probability(probability),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClientSummary {
    pub age: u8,
    pub job: Job,
    pub education: Education,
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractResponse {
    pub status: &'static str,
    pub prediction: ContractPrediction,
    pub client_summary: ClientSummary,
}
