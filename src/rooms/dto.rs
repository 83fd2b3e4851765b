use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::rooms::repo::{Room, RoomWithOwner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "property_type")]
pub enum PropertyType {
    #[serde(rename = "1 BHK")]
    #[sqlx(rename = "1 BHK")]
    OneBhk,
    #[serde(rename = "2 BHK")]
    #[sqlx(rename = "2 BHK")]
    TwoBhk,
    #[serde(rename = "3 BHK")]
    #[sqlx(rename = "3 BHK")]
    ThreeBhk,
    #[serde(rename = "Shared Room")]
    #[sqlx(rename = "Shared Room")]
    SharedRoom,
    #[serde(rename = "Private Room")]
    #[sqlx(rename = "Private Room")]
    PrivateRoom,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::OneBhk => "1 BHK",
            PropertyType::TwoBhk => "2 BHK",
            PropertyType::ThreeBhk => "3 BHK",
            PropertyType::SharedRoom => "Shared Room",
            PropertyType::PrivateRoom => "Private Room",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1 BHK" => Ok(PropertyType::OneBhk),
            "2 BHK" => Ok(PropertyType::TwoBhk),
            "3 BHK" => Ok(PropertyType::ThreeBhk),
            "Shared Room" => Ok(PropertyType::SharedRoom),
            "Private Room" => Ok(PropertyType::PrivateRoom),
            other => Err(format!("unknown property type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tenant_preference")]
pub enum TenantPreference {
    Bachelor,
    Family,
    #[serde(rename = "Girls Only")]
    #[sqlx(rename = "Girls Only")]
    GirlsOnly,
    #[serde(rename = "Boys Only")]
    #[sqlx(rename = "Boys Only")]
    BoysOnly,
    #[serde(rename = "Working Professionals")]
    #[sqlx(rename = "Working Professionals")]
    WorkingProfessionals,
    Any,
}

impl TenantPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantPreference::Bachelor => "Bachelor",
            TenantPreference::Family => "Family",
            TenantPreference::GirlsOnly => "Girls Only",
            TenantPreference::BoysOnly => "Boys Only",
            TenantPreference::WorkingProfessionals => "Working Professionals",
            TenantPreference::Any => "Any",
        }
    }
}

impl fmt::Display for TenantPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bachelor" => Ok(TenantPreference::Bachelor),
            "Family" => Ok(TenantPreference::Family),
            "Girls Only" => Ok(TenantPreference::GirlsOnly),
            "Boys Only" => Ok(TenantPreference::BoysOnly),
            "Working Professionals" => Ok(TenantPreference::WorkingProfessionals),
            "Any" => Ok(TenantPreference::Any),
            other => Err(format!("unknown tenant preference: {}", other)),
        }
    }
}

/// Optional search filters, carried as URL query parameters. Every supplied
/// filter narrows the result set; absent ones impose no constraint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFilters {
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub property_type: Option<PropertyType>,
    pub preference: Option<TenantPreference>,
}

impl RoomFilters {
    /// ILIKE pattern for the location term, matched against both title and
    /// location. Empty or whitespace-only terms impose no constraint.
    pub fn like_pattern(&self) -> Option<String> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!("%{}%", t))
    }
}

/// Mutable listing fields, shared by create (multipart) and edit (JSON).
/// Images are deliberately absent: the edit flow never touches them.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub address: String,
    pub location: String,
    pub price: f64,
    pub property_type: PropertyType,
    pub tenant_preference: TenantPreference,
    pub contact_number: String,
}

/// Listing as rendered in search results and the owner dashboard.
#[derive(Debug, Serialize)]
pub struct RoomCard {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub price: f64,
    pub property_type: PropertyType,
    pub tenant_preference: TenantPreference,
    pub images: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl From<Room> for RoomCard {
    fn from(r: Room) -> Self {
        Self {
            id: r.id,
            title: r.title,
            location: r.location,
            price: r.price,
            property_type: r.property_type,
            tenant_preference: r.tenant_preference,
            images: r.images,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OwnerContact {
    pub full_name: String,
    pub email: String,
}

/// Full listing joined with the owning profile's contact card.
#[derive(Debug, Serialize)]
pub struct RoomDetails {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub location: String,
    pub price: f64,
    pub property_type: PropertyType,
    pub tenant_preference: TenantPreference,
    pub contact_number: String,
    pub images: Vec<String>,
    pub created_at: OffsetDateTime,
    pub owner: OwnerContact,
}

impl From<RoomWithOwner> for RoomDetails {
    fn from(r: RoomWithOwner) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            address: r.address,
            location: r.location,
            price: r.price,
            property_type: r.property_type,
            tenant_preference: r.tenant_preference,
            contact_number: r.contact_number,
            images: r.images,
            created_at: r.created_at,
            owner: OwnerContact {
                full_name: r.owner_name,
                email: r.owner_email,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_wire_names_round_trip() {
        assert_eq!(
            serde_json::to_string(&PropertyType::TwoBhk).unwrap(),
            r#""2 BHK""#
        );
        assert_eq!(
            serde_json::from_str::<PropertyType>(r#""Shared Room""#).unwrap(),
            PropertyType::SharedRoom
        );
        assert_eq!(
            serde_json::to_string(&TenantPreference::WorkingProfessionals).unwrap(),
            r#""Working Professionals""#
        );
        assert_eq!(
            serde_json::from_str::<TenantPreference>(r#""Any""#).unwrap(),
            TenantPreference::Any
        );
    }

    #[test]
    fn enum_from_str_matches_wire_names() {
        for pt in [
            PropertyType::OneBhk,
            PropertyType::TwoBhk,
            PropertyType::ThreeBhk,
            PropertyType::SharedRoom,
            PropertyType::PrivateRoom,
        ] {
            assert_eq!(pt.as_str().parse::<PropertyType>().unwrap(), pt);
        }
        for tp in [
            TenantPreference::Bachelor,
            TenantPreference::Family,
            TenantPreference::GirlsOnly,
            TenantPreference::BoysOnly,
            TenantPreference::WorkingProfessionals,
            TenantPreference::Any,
        ] {
            assert_eq!(tp.as_str().parse::<TenantPreference>().unwrap(), tp);
        }
        assert!("2BHK".parse::<PropertyType>().is_err());
    }

    #[test]
    fn like_pattern_wraps_the_term() {
        let f = RoomFilters {
            location: Some("Goa".into()),
            ..Default::default()
        };
        assert_eq!(f.like_pattern().as_deref(), Some("%Goa%"));
    }

    #[test]
    fn like_pattern_ignores_blank_terms() {
        assert_eq!(RoomFilters::default().like_pattern(), None);
        let f = RoomFilters {
            location: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(f.like_pattern(), None);
    }

    #[test]
    fn filters_deserialize_from_camel_case_params() {
        let f: RoomFilters = serde_json::from_value(serde_json::json!({
            "location": "Pune",
            "minPrice": 5000.0,
            "maxPrice": 10000.0,
            "propertyType": "2 BHK",
            "preference": "Family"
        }))
        .unwrap();
        assert_eq!(f.min_price, Some(5000.0));
        assert_eq!(f.max_price, Some(10000.0));
        assert_eq!(f.property_type, Some(PropertyType::TwoBhk));
        assert_eq!(f.preference, Some(TenantPreference::Family));
    }

    #[test]
    fn form_description_defaults_to_empty() {
        let form: RoomForm = serde_json::from_value(serde_json::json!({
            "title": "Sunny 1BHK",
            "address": "12 Hill Rd",
            "location": "Bandra, Mumbai",
            "price": 18000.0,
            "property_type": "1 BHK",
            "tenant_preference": "Bachelor",
            "contact_number": "+91 98765 43210"
        }))
        .unwrap();
        assert_eq!(form.description, "");
    }
}
