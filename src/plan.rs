//! Weekly plan: which template goes on which weekday.

use jiff::{
    Span,
    civil::{Date, Weekday},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One day of a week plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlanDay {
    #[serde(serialize_with = "weekday_name", deserialize_with = "parse_weekday")]
    pub weekday: Weekday,

    /// Key of a built-in template, e.g. `strength-a`.
    pub template: String,

    #[serde(default)]
    pub slot: u8,
}

impl PlanDay {
    pub fn new(weekday: Weekday, template: &str) -> Self {
        Self {
            weekday,
            template: template.to_string(),
            slot: 0,
        }
    }
}

/// Strength on Monday, Wednesday and Friday, an easy run on Saturday.
pub fn default_week_plan() -> Vec<PlanDay> {
    vec![
        PlanDay::new(Weekday::Monday, "strength-a"),
        PlanDay::new(Weekday::Wednesday, "strength-b"),
        PlanDay::new(Weekday::Friday, "strength-c"),
        PlanDay::new(Weekday::Saturday, "easy-run"),
    ]
}

/// The next `weekday` strictly after `reference`. A reference that already
/// falls on `weekday` rolls to the following week.
pub fn next_weekday(reference: Date, weekday: Weekday) -> Result<Date, jiff::Error> {
    let current = i64::from(reference.weekday().to_monday_zero_offset());
    let wanted = i64::from(weekday.to_monday_zero_offset());
    let days = match (wanted - current).rem_euclid(7) {
        0 => 7,
        n => n,
    };
    reference.checked_add(Span::new().days(days))
}

/// Parses `monday`, `Mon`, or a Monday-based index `0..=6`.
pub fn weekday_from_str(raw: &str) -> Option<Weekday> {
    let token = raw.trim().to_lowercase();
    if let Ok(index) = token.parse::<i8>() {
        return (0..=6)
            .contains(&index)
            .then(|| Weekday::from_monday_zero_offset(index).ok())
            .flatten();
    }
    let weekday = match token.as_str() {
        "mon" | "monday" => Weekday::Monday,
        "tue" | "tuesday" => Weekday::Tuesday,
        "wed" | "wednesday" => Weekday::Wednesday,
        "thu" | "thursday" => Weekday::Thursday,
        "fri" | "friday" => Weekday::Friday,
        "sat" | "saturday" => Weekday::Saturday,
        "sun" | "sunday" => Weekday::Sunday,
        _ => return None,
    };
    Some(weekday)
}

pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "monday",
        Weekday::Tuesday => "tuesday",
        Weekday::Wednesday => "wednesday",
        Weekday::Thursday => "thursday",
        Weekday::Friday => "friday",
        Weekday::Saturday => "saturday",
        Weekday::Sunday => "sunday",
    }
}

fn parse_weekday<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Index(i64),
        Name(String),
    }

    let raw = match Raw::deserialize(deserializer)? {
        Raw::Index(i) => i.to_string(),
        Raw::Name(name) => name,
    };
    weekday_from_str(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown weekday '{raw}'")))
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's serialize_with signature
fn weekday_name<S: Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(weekday_label(*weekday))
}
