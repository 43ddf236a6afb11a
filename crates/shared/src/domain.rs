use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::DraftError;

/// Opaque user identifier issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Backend-assigned vehicle row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub i64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::Excellent,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Excellent => "excellent",
            Condition::Good => "good",
            Condition::Fair => "fair",
            Condition::Poor => "poor",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::ALL
            .into_iter()
            .find(|condition| condition.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DraftError::UnknownCondition(s.to_string()))
    }
}

/// A row of the `vehicles` table as returned by the backend.
///
/// Text and numeric columns are read leniently: `year` and `mileage` may come
/// back as numbers or as the text the user typed, and any column may be null.
/// A `condition` outside the four known values reads as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub make: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub mileage: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub vin: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient_condition")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected text or number, got {other}"
        ))),
    }
}

fn lenient_condition<'de, D>(deserializer: D) -> Result<Option<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => text.parse().ok(),
        _ => None,
    })
}

/// Ownership row of the `users_vehicles` link table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserVehicleLink {
    pub user_id: UserId,
    pub vehicle_id: VehicleId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Make,
    Model,
    Year,
    Mileage,
    Color,
    Vin,
    Nickname,
    Condition,
}

impl DraftField {
    pub const ALL: [DraftField; 8] = [
        DraftField::Make,
        DraftField::Model,
        DraftField::Year,
        DraftField::Mileage,
        DraftField::Color,
        DraftField::Vin,
        DraftField::Nickname,
        DraftField::Condition,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DraftField::Make => "make",
            DraftField::Model => "model",
            DraftField::Year => "year",
            DraftField::Mileage => "mileage",
            DraftField::Color => "color",
            DraftField::Vin => "vin",
            DraftField::Nickname => "nickname",
            DraftField::Condition => "condition",
        }
    }
}

impl FromStr for DraftField {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DraftField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| DraftError::UnknownField(s.to_string()))
    }
}

/// Unsubmitted vehicle form state.
///
/// Serialized verbatim as the insert body: `year` and `mileage` stay as the
/// text the user typed and are left to the backend to coerce.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormDraft {
    pub make: String,
    pub model: String,
    pub year: String,
    pub mileage: String,
    pub color: String,
    pub vin: String,
    pub nickname: String,
    pub condition: Condition,
}

impl FormDraft {
    pub fn set_field(
        &mut self,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<(), DraftError> {
        let value = value.into();
        match field {
            DraftField::Make => self.make = value,
            DraftField::Model => self.model = value,
            DraftField::Year => self.year = value,
            DraftField::Mileage => self.mileage = value,
            DraftField::Color => self.color = value,
            DraftField::Vin => self.vin = value,
            DraftField::Nickname => self.nickname = value,
            DraftField::Condition => self.condition = value.parse()?,
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_accepts_numeric_and_text_columns() {
        let numeric: Vehicle = serde_json::from_value(serde_json::json!({
            "id": 3,
            "make": "Toyota",
            "model": "Corolla",
            "year": 2018,
            "mileage": 40210,
            "color": null,
            "condition": "fair"
        }))
        .expect("numeric row");
        assert_eq!(numeric.year.as_deref(), Some("2018"));
        assert_eq!(numeric.mileage.as_deref(), Some("40210"));
        assert_eq!(numeric.color, None);
        assert_eq!(numeric.nickname, None);
        assert_eq!(numeric.condition, Some(Condition::Fair));
        assert_eq!(numeric.image_uri, None);

        let text: Vehicle = serde_json::from_value(serde_json::json!({
            "id": 4,
            "year": "2020",
            "mileage": "15000"
        }))
        .expect("text row");
        assert_eq!(text.year.as_deref(), Some("2020"));
        assert_eq!(text.mileage.as_deref(), Some("15000"));
    }

    #[test]
    fn vehicle_reads_empty_or_unknown_condition_as_missing() {
        for raw in [serde_json::json!(""), serde_json::json!("mint"), serde_json::json!(3)] {
            let vehicle: Vehicle = serde_json::from_value(serde_json::json!({
                "id": 8,
                "condition": raw
            }))
            .expect("row with off-list condition");
            assert_eq!(vehicle.condition, None, "condition {raw}");
        }

        let vehicle: Vehicle =
            serde_json::from_value(serde_json::json!({"id": 9, "condition": "Good"}))
                .expect("row");
        assert_eq!(vehicle.condition, Some(Condition::Good));
    }

    #[test]
    fn vehicle_rejects_structured_column_values() {
        let err = serde_json::from_value::<Vehicle>(serde_json::json!({
            "id": 5,
            "make": ["not", "text"]
        }))
        .expect_err("array make must fail");
        assert!(err.to_string().contains("expected text or number"));
    }

    #[test]
    fn draft_serializes_fields_verbatim() {
        let draft = FormDraft {
            year: "20x0".to_string(),
            condition: Condition::Poor,
            ..FormDraft::default()
        };
        let body = serde_json::to_value(&draft).expect("serialize");
        assert_eq!(body["year"], "20x0");
        assert_eq!(body["mileage"], "");
        assert_eq!(body["condition"], "poor");
        assert!(body.get("id").is_none());
    }

    #[test]
    fn set_field_routes_by_name_and_parses_condition() {
        let mut draft = FormDraft::default();
        for (name, value) in [("make", "Honda"), ("year", "2020"), ("condition", "Good")] {
            let field: DraftField = name.parse().expect("known field");
            draft.set_field(field, value).expect("set");
        }
        assert_eq!(draft.make, "Honda");
        assert_eq!(draft.year, "2020");
        assert_eq!(draft.condition, Condition::Good);

        assert_eq!(
            "wheels".parse::<DraftField>(),
            Err(DraftError::UnknownField("wheels".to_string()))
        );
        assert_eq!(
            draft.set_field(DraftField::Condition, "mint"),
            Err(DraftError::UnknownCondition("mint".to_string()))
        );
        assert_eq!(draft.condition, Condition::Good);
    }

    #[test]
    fn reset_restores_excellent_condition() {
        let mut draft = FormDraft {
            make: "Ford".to_string(),
            condition: Condition::Poor,
            ..FormDraft::default()
        };
        draft.reset();
        assert_eq!(draft, FormDraft::default());
        assert_eq!(draft.condition, Condition::Excellent);
    }
}
