//! Card view of a vehicle with the fallbacks the garage mosaic shows for
//! missing columns.

use std::fmt;

use shared::domain::Vehicle;

pub const DEFAULT_VEHICLE_IMAGE: &str = "/default-car.jpg";
pub const ADD_VEHICLE_LABEL: &str = "Add New Vehicle";
pub const HIDE_FORM_LABEL: &str = "Hide Form";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleCard {
    pub title: String,
    pub image_src: String,
    pub image_alt: String,
    pub nickname: String,
    pub color: String,
    pub mileage: String,
    pub condition: String,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

fn join_words(words: &[Option<&str>]) -> String {
    words
        .iter()
        .filter_map(|word| present(*word))
        .collect::<Vec<_>>()
        .join(" ")
}

impl From<&Vehicle> for VehicleCard {
    fn from(vehicle: &Vehicle) -> Self {
        let make = vehicle.make.as_deref();
        let model = vehicle.model.as_deref();
        Self {
            title: join_words(&[vehicle.year.as_deref(), make, model]),
            image_src: present(vehicle.image_uri.as_deref())
                .unwrap_or(DEFAULT_VEHICLE_IMAGE)
                .to_string(),
            image_alt: join_words(&[make, model]),
            nickname: present(vehicle.nickname.as_deref())
                .unwrap_or("N/A")
                .to_string(),
            color: present(vehicle.color.as_deref())
                .unwrap_or("Unknown")
                .to_string(),
            mileage: present(vehicle.mileage.as_deref())
                .unwrap_or("Unknown")
                .to_string(),
            condition: vehicle
                .condition
                .map(|condition| condition.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

impl fmt::Display for VehicleCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "  Image: {} ({})", self.image_src, self.image_alt)?;
        writeln!(f, "  Nickname: {}", self.nickname)?;
        writeln!(f, "  Color: {}", self.color)?;
        writeln!(f, "  Mileage: {} miles", self.mileage)?;
        write!(f, "  Condition: {}", self.condition)
    }
}

pub fn toggle_label(form_visible: bool) -> &'static str {
    if form_visible {
        HIDE_FORM_LABEL
    } else {
        ADD_VEHICLE_LABEL
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::{Condition, VehicleId};

    use super::*;

    fn bare_vehicle() -> Vehicle {
        Vehicle {
            id: VehicleId(1),
            make: None,
            model: None,
            year: None,
            mileage: None,
            color: None,
            vin: None,
            nickname: None,
            condition: None,
            image_uri: None,
        }
    }

    #[test]
    fn card_uses_fallbacks_for_missing_columns() {
        let mut vehicle = bare_vehicle();
        vehicle.make = Some("Mazda".to_string());
        vehicle.model = Some("MX-5".to_string());
        vehicle.nickname = Some(String::new());

        let card = VehicleCard::from(&vehicle);
        assert_eq!(card.title, "Mazda MX-5");
        assert_eq!(card.image_src, DEFAULT_VEHICLE_IMAGE);
        assert_eq!(card.image_alt, "Mazda MX-5");
        assert_eq!(card.nickname, "N/A");
        assert_eq!(card.color, "Unknown");
        assert_eq!(card.mileage, "Unknown");
        assert_eq!(card.condition, "Unknown");
        assert!(card.to_string().contains("Mileage: Unknown miles"));
    }

    #[test]
    fn card_renders_populated_vehicle() {
        let vehicle = Vehicle {
            year: Some("2020".to_string()),
            make: Some("Honda".to_string()),
            model: Some("Civic".to_string()),
            mileage: Some("15000".to_string()),
            color: Some("Blue".to_string()),
            nickname: Some("Blue Bolt".to_string()),
            condition: Some(Condition::Good),
            image_uri: Some("https://cdn.example/civic.jpg".to_string()),
            ..bare_vehicle()
        };

        let card = VehicleCard::from(&vehicle);
        assert_eq!(card.title, "2020 Honda Civic");
        assert_eq!(card.image_src, "https://cdn.example/civic.jpg");
        assert_eq!(card.nickname, "Blue Bolt");
        assert_eq!(card.condition, "good");
        assert!(card.to_string().contains("Mileage: 15000 miles"));
    }

    #[test]
    fn toggle_label_tracks_visibility() {
        assert_eq!(toggle_label(false), "Add New Vehicle");
        assert_eq!(toggle_label(true), "Hide Form");
    }
}
