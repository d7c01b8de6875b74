//! Shape validation for payloads crossing a trust boundary.
//!
//! The remote endpoint checks every solve field by field before anything is
//! stored. A single malformed record rejects the whole payload.

use serde_json::Value;

use crate::{PushRequest, Settings, Solve, ValidationError};

/// Validate a raw push body and decode it.
///
/// Each solve must carry a string `id`, numeric `time`, string `scramble`,
/// string `date`, boolean `dnf` and boolean `plusTwo`. Settings must carry a
/// boolean `inspectionEnabled` and a numeric `inspectionTime`. Nothing else
/// is checked: any date string, puzzle tag or number that passes decodes.
pub fn validate_push_body(body: &Value) -> Result<PushRequest, ValidationError> {
    let object = body.as_object().ok_or(ValidationError::NotAnObject)?;

    let solves = match object.get("solves") {
        None => None,
        Some(value) => Some(validate_solves(value)?),
    };

    let settings = match object.get("settings") {
        None => None,
        Some(value) => Some(validate_settings(value)?),
    };

    Ok(PushRequest { solves, settings })
}

/// Validate and decode a solve list.
pub fn validate_solves(value: &Value) -> Result<Vec<Solve>, ValidationError> {
    let items = value.as_array().ok_or_else(|| ValidationError::Solves {
        reason: "expected an array".into(),
    })?;

    let mut solves = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        check_solve_shape(item).map_err(|reason| ValidationError::Solves {
            reason: format!("solve {}: {}", index, reason),
        })?;
        let solve: Solve =
            serde_json::from_value(item.clone()).map_err(|e| ValidationError::Solves {
                reason: format!("solve {}: {}", index, e),
            })?;
        solves.push(solve);
    }
    Ok(solves)
}

/// Validate and decode a settings object.
pub fn validate_settings(value: &Value) -> Result<Settings, ValidationError> {
    let object = value.as_object().ok_or_else(|| ValidationError::Settings {
        reason: "expected an object".into(),
    })?;

    if !object.get("inspectionEnabled").is_some_and(Value::is_boolean) {
        return Err(ValidationError::Settings {
            reason: "inspectionEnabled must be a boolean".into(),
        });
    }
    if !object.get("inspectionTime").is_some_and(Value::is_number) {
        return Err(ValidationError::Settings {
            reason: "inspectionTime must be a number".into(),
        });
    }

    serde_json::from_value(value.clone()).map_err(|e| ValidationError::Settings {
        reason: e.to_string(),
    })
}

fn check_solve_shape(item: &Value) -> Result<(), String> {
    let object = item.as_object().ok_or("expected an object")?;

    let checks: [(&str, fn(&Value) -> bool, &str); 6] = [
        ("id", Value::is_string, "a string"),
        ("time", Value::is_number, "a number"),
        ("scramble", Value::is_string, "a string"),
        ("date", Value::is_string, "a string"),
        ("dnf", Value::is_boolean, "a boolean"),
        ("plusTwo", Value::is_boolean, "a boolean"),
    ];

    for (field, is_valid, expected) in checks {
        match object.get(field) {
            Some(v) if is_valid(v) => {}
            Some(_) => return Err(format!("{} must be {}", field, expected)),
            None => return Err(format!("missing {}", field)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PuzzleType;
    use serde_json::json;

    fn valid_solve() -> Value {
        json!({
            "id": "a1",
            "time": 12345.6,
            "scramble": "R U R'",
            "date": "2024-05-01T12:00:00.000Z",
            "dnf": false,
            "plusTwo": false
        })
    }

    #[test]
    fn accepts_solves_only() {
        let body = json!({ "solves": [valid_solve()] });
        let req = validate_push_body(&body).unwrap();
        assert_eq!(req.solves.unwrap().len(), 1);
        assert!(req.settings.is_none());
    }

    #[test]
    fn accepts_settings_only() {
        let body = json!({ "settings": { "inspectionEnabled": true, "inspectionTime": 15 } });
        let req = validate_push_body(&body).unwrap();
        assert!(req.solves.is_none());
        assert!(req.settings.unwrap().inspection_enabled);
    }

    #[test]
    fn rejects_non_object_body() {
        assert_eq!(
            validate_push_body(&json!([1, 2])),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn rejects_whole_payload_on_one_bad_solve() {
        let mut bad = valid_solve();
        bad["time"] = json!("12.3");
        let body = json!({ "solves": [valid_solve(), bad] });
        match validate_push_body(&body) {
            Err(ValidationError::Solves { reason }) => {
                assert_eq!(reason, "solve 1: time must be a number");
            }
            other => panic!("expected solves error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_missing_plus_two() {
        let mut bad = valid_solve();
        bad.as_object_mut().unwrap().remove("plusTwo");
        let body = json!({ "solves": [bad] });
        assert!(matches!(
            validate_push_body(&body),
            Err(ValidationError::Solves { .. })
        ));
    }

    #[test]
    fn rejects_solves_that_are_not_an_array() {
        let body = json!({ "solves": { "id": "x" } });
        assert!(matches!(
            validate_push_body(&body),
            Err(ValidationError::Solves { .. })
        ));
    }

    #[test]
    fn rejects_settings_with_string_inspection_time() {
        let body = json!({ "settings": { "inspectionEnabled": true, "inspectionTime": "15" } });
        assert!(matches!(
            validate_push_body(&body),
            Err(ValidationError::Settings { .. })
        ));
    }

    #[test]
    fn shape_check_is_the_only_gate_for_solves() {
        let mut bare_date = valid_solve();
        bare_date["date"] = json!("2024-03-01");
        let mut unknown_puzzle = valid_solve();
        unknown_puzzle["puzzleType"] = json!("fto");
        let mut odd_extra = valid_solve();
        odd_extra["comment"] = json!({ "nested": [1, 2] });

        let body = json!({ "solves": [bare_date, unknown_puzzle, odd_extra] });
        let solves = validate_push_body(&body).unwrap().solves.unwrap();
        assert_eq!(solves.len(), 3);
        assert_eq!(solves[0].date.as_str(), "2024-03-01");
        assert_eq!(solves[1].puzzle(), PuzzleType::ThreeByThree);
    }

    #[test]
    fn fractional_inspection_time_is_accepted() {
        let body = json!({ "settings": { "inspectionEnabled": true, "inspectionTime": 15.5 } });
        let settings = validate_push_body(&body).unwrap().settings.unwrap();
        assert_eq!(settings.inspection_time, 16);
    }

    #[test]
    fn empty_object_is_an_empty_push() {
        let req = validate_push_body(&json!({})).unwrap();
        assert!(req.is_empty());
    }
}
