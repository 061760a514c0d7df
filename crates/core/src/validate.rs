//! Pure validation of raw JSON payloads into typed requests.

use serde_json::{Map, Value};

use crate::domain::contract::{
    Contact, ContractRequest, Education, Job, Marital, Month, Poutcome, YesNo,
};
use crate::domain::sales::{SalesForecastRequest, MAX_FORECAST_DAYS};
use crate::error::{ValidationError, ValidationErrors};

/// Field name reported when the payload itself is not a JSON object.
pub const BODY_FIELD: &str = "body";

pub fn validate_sales_request(payload: &Value) -> Result<SalesForecastRequest, ValidationErrors> {
    let obj = as_object(payload)?;
    let days = required_int(obj, "days")?;
    if !(1..=i64::from(MAX_FORECAST_DAYS)).contains(&days) {
        return Err(ValidationError::new(
            "days",
            format!("must be between 1 and {MAX_FORECAST_DAYS} (got {days})"),
        )
        .into());
    }
    // Range-checked above.
    Ok(SalesForecastRequest { days: days as u32 })
}

/// Validates every field independently and reports all failures together.
pub fn validate_contract_request(payload: &Value) -> Result<ContractRequest, ValidationErrors> {
    let obj = as_object(payload)?;
    let mut errors = Vec::new();

    let age = collect(&mut errors, int_in_range(obj, "age", 18, 100));
    let job = collect(&mut errors, category(obj, "job", Job::parse, Job::allowed));
    let marital = collect(
        &mut errors,
        category(obj, "marital", Marital::parse, Marital::allowed),
    );
    let education = collect(
        &mut errors,
        category(obj, "education", Education::parse, Education::allowed),
    );
    let default = collect(
        &mut errors,
        category(obj, "default", YesNo::parse, YesNo::allowed),
    );
    let balance = collect(&mut errors, required_int(obj, "balance"));
    let housing = collect(
        &mut errors,
        category(obj, "housing", YesNo::parse, YesNo::allowed),
    );
    let loan = collect(&mut errors, category(obj, "loan", YesNo::parse, YesNo::allowed));
    let contact = collect(
        &mut errors,
        category(obj, "contact", Contact::parse, Contact::allowed),
    );
    let day = collect(&mut errors, int_in_range(obj, "day", 1, 31));
    let month = collect(&mut errors, category(obj, "month", Month::parse, Month::allowed));
    let campaign = collect(&mut errors, int_in_range(obj, "campaign", 1, i64::from(u32::MAX)));
    let pdays = collect(
        &mut errors,
        required_int(obj, "pdays").and_then(|v| {
            if v == -1 || (0..=i64::from(i32::MAX)).contains(&v) {
                Ok(v)
            } else {
                Err(ValidationError::new(
                    "pdays",
                    format!("must be -1 (never contacted) or >= 0 (got {v})"),
                ))
            }
        }),
    );
    let previous = collect(&mut errors, int_in_range(obj, "previous", 0, i64::from(u32::MAX)));
    let poutcome = collect(
        &mut errors,
        category(obj, "poutcome", Poutcome::parse, Poutcome::allowed),
    );

    if let Some(errors) = ValidationErrors::from_vec(errors) {
        return Err(errors);
    }

    match (
        age, job, marital, education, default, balance, housing, loan, contact, day, month,
        campaign, pdays, previous, poutcome,
    ) {
        (
            Some(age),
            Some(job),
            Some(marital),
            Some(education),
            Some(default),
            Some(balance),
            Some(housing),
            Some(loan),
            Some(contact),
            Some(day),
            Some(month),
            Some(campaign),
            Some(pdays),
            Some(previous),
            Some(poutcome),
        ) => Ok(ContractRequest {
            // All integer casts below are range-checked by their validators.
            age: age as u8,
            job,
            marital,
            education,
            default,
            balance,
            housing,
            loan,
            contact,
            day: day as u8,
            month,
            campaign: campaign as u32,
            pdays: pdays as i32,
            previous: previous as u32,
            poutcome,
        }),
        _ => Err(ValidationError::new(BODY_FIELD, "incomplete payload").into()),
    }
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, ValidationError> {
    payload
        .as_object()
        .ok_or_else(|| ValidationError::new(BODY_FIELD, "request body must be a JSON object"))
}

fn collect<T>(errors: &mut Vec<ValidationError>, result: Result<T, ValidationError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn required<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::new(field, "is required")),
        Some(v) => Ok(v),
    }
}

/// Accepts JSON integers only; strings and fractional numbers are rejected rather than coerced.
fn required_int(obj: &Map<String, Value>, field: &str) -> Result<i64, ValidationError> {
    let value = required(obj, field)?;
    if let Some(v) = value.as_i64() {
        return Ok(v);
    }
    let reason = if value.is_u64() {
        format!("integer out of range (got {value})")
    } else {
        format!("must be an integer (got {value})")
    };
    Err(ValidationError::new(field, reason))
}

fn int_in_range(
    obj: &Map<String, Value>,
    field: &str,
    min: i64,
    max: i64,
) -> Result<i64, ValidationError> {
    let v = required_int(obj, field)?;
    if !(min..=max).contains(&v) {
        let reason = if max == i64::from(u32::MAX) {
            format!("must be >= {min} (got {v})")
        } else {
            format!("must be between {min} and {max} (got {v})")
        };
        return Err(ValidationError::new(field, reason));
    }
    Ok(v)
}

fn category<T>(
    obj: &Map<String, Value>,
    field: &str,
    parse: fn(&str) -> Option<T>,
    allowed: fn() -> String,
) -> Result<T, ValidationError> {
    let value = required(obj, field)?;
    let Some(s) = value.as_str() else {
        return Err(ValidationError::new(
            field,
            format!("must be a string (got {value})"),
        ));
    };
    parse(s).ok_or_else(|| {
        ValidationError::new(
            field,
            format!("unknown value '{s}' (expected one of: {})", allowed()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn readme_example() -> Value {
        json!({
            "age": 35,
            "job": "technician",
            "marital": "married",
            "education": "secondary",
            "default": "no",
            "balance": 1500,
            "housing": "yes",
            "loan": "no",
            "contact": "cellular",
            "day": 15,
            "month": "may",
            "campaign": 2,
            "pdays": -1,
            "previous": 0,
            "poutcome": "unknown"
        })
    }

    #[test]
    fn days_accepts_the_full_range() {
        for days in [1, 7, 180, 365] {
            let req = validate_sales_request(&json!({ "days": days })).unwrap();
            assert_eq!(req.days, days);
        }
    }

    #[test]
    fn days_rejections_name_the_field() {
        let bad = [
            json!({ "days": 0 }),
            json!({ "days": 366 }),
            json!({ "days": -3 }),
            json!({ "days": "abc" }),
            json!({ "days": "7" }),
            json!({ "days": 7.5 }),
            json!({ "days": null }),
            json!({}),
        ];
        for payload in bad {
            let err = validate_sales_request(&payload).unwrap_err();
            assert_eq!(err.first().field, "days", "payload={payload}");
        }
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = validate_sales_request(&json!([1, 2])).unwrap_err();
        assert_eq!(err.first().field, BODY_FIELD);
        let err = validate_contract_request(&json!("hello")).unwrap_err();
        assert_eq!(err.first().field, BODY_FIELD);
    }

    #[test]
    fn readme_example_validates() {
        let req = validate_contract_request(&readme_example()).unwrap();
        assert_eq!(req.age, 35);
        assert_eq!(req.job, Job::Technician);
        assert_eq!(req.month, Month::May);
        assert_eq!(req.pdays, -1);
        assert_eq!(req.balance, 1500);
    }

    #[test]
    fn unknown_job_names_the_field() {
        let mut payload = readme_example();
        payload["job"] = json!("painter");
        let err = validate_contract_request(&payload).unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.first().field, "job");
        assert!(err.first().reason.contains("painter"));
    }

    #[test]
    fn collects_every_field_error() {
        let mut payload = readme_example();
        payload["age"] = json!(17);
        payload["month"] = json!("May");
        payload["pdays"] = json!(-2);
        payload.as_object_mut().unwrap().remove("loan");
        let err = validate_contract_request(&payload).unwrap_err();
        let fields: Vec<&str> = err.fields().collect();
        assert_eq!(fields, vec!["age", "loan", "month", "pdays"]);
    }

    #[test]
    fn integer_bounds() {
        let cases = [
            ("age", json!(18), true),
            ("age", json!(100), true),
            ("age", json!(101), false),
            ("day", json!(0), false),
            ("day", json!(31), true),
            ("campaign", json!(0), false),
            ("campaign", json!(1), true),
            ("previous", json!(-1), false),
            ("previous", json!(0), true),
            ("pdays", json!(-1), true),
            ("pdays", json!(0), true),
            ("balance", json!(-25000), true),
            ("balance", json!("1500"), false),
        ];
        for (field, value, ok) in cases {
            let mut payload = readme_example();
            payload[field] = value.clone();
            let result = validate_contract_request(&payload);
            assert_eq!(result.is_ok(), ok, "{field}={value}");
            if let Err(err) = result {
                assert_eq!(err.first().field, field);
            }
        }
    }

    #[test]
    fn oversized_integers_are_out_of_range() {
        let err = validate_sales_request(&json!({ "days": u64::MAX })).unwrap_err();
        assert_eq!(err.first().field, "days");
        assert!(err.first().reason.contains("out of range"), "{}", err.first().reason);

        let mut payload = readme_example();
        payload["balance"] = json!(u64::MAX);
        let err = validate_contract_request(&payload).unwrap_err();
        assert_eq!(err.first().field, "balance");
        assert!(err.first().reason.contains("out of range"));
        assert!(!err.first().reason.contains("must be an integer"));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let mut payload = readme_example();
        payload["duration"] = json!(261);
        assert!(validate_contract_request(&payload).is_ok());
    }
}
