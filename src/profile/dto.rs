use serde::{Deserialize, Serialize};
use time::Date;

use crate::nutrition::{ActivityLevel, Gender};
use crate::profile::repo::Profile;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpsertRequest {
    pub weight: f64,
    pub height: f64,
    pub birthdate: Date,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub food_intolerances: Vec<String>,
    #[serde(default)]
    pub smoking: bool,
    #[serde(default)]
    pub vegetarian: bool,
    #[serde(default)]
    pub vegan: bool,
    #[serde(default)]
    pub halal: bool,
    #[serde(default)]
    pub kosher: bool,
}

impl ProfileUpsertRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !(20.0..=500.0).contains(&self.weight) {
            return Err("weight must be between 20 and 500 kg".into());
        }
        if !(50.0..=280.0).contains(&self.height) {
            return Err("height must be between 50 and 280 cm".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub weight: f64,
    pub height: f64,
    pub birthdate: Date,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub medications: Vec<String>,
    pub food_intolerances: Vec<String>,
    pub smoking: bool,
    pub vegetarian: bool,
    pub vegan: bool,
    pub halal: bool,
    pub kosher: bool,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            weight: p.weight_kg,
            height: p.height_cm,
            birthdate: p.birthdate,
            gender: p.gender,
            activity_level: p.activity_level,
            medications: p.medications,
            food_intolerances: p.food_intolerances,
            smoking: p.smoking,
            vegetarian: p.vegetarian,
            vegan: p.vegan,
            halal: p.halal,
            kosher: p.kosher,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProfileUpsertRequest {
        serde_json::from_value(serde_json::json!({
            "weight": 70.0,
            "height": 180.0,
            "birthdate": "1994-03-02",
            "gender": "FEMALE",
            "activityLevel": "LIGHTLY_ACTIVE"
        }))
        .expect("valid profile json")
    }

    #[test]
    fn optional_fields_default_off() {
        let req = request();
        assert!(req.medications.is_empty());
        assert!(!req.smoking);
        assert!(!req.vegan);
    }

    #[test]
    fn rejects_implausible_measurements() {
        let mut req = request();
        req.weight = 1.0;
        assert!(req.validate().is_err());
        let mut req = request();
        req.height = 300.0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_unknown_activity_level() {
        let result = serde_json::from_value::<ProfileUpsertRequest>(serde_json::json!({
            "weight": 70.0,
            "height": 180.0,
            "birthdate": "1994-03-02",
            "gender": "FEMALE",
            "activityLevel": "COUCH_POTATO"
        }));
        assert!(result.is_err());
    }
}
