//! Parsers from raw Jolpica F1 JSON to typed records
//!
//! Each record parser checks that every required field is present, coerces
//! numeric strings, and composes the parsers of nested records. A failure
//! affects only the record being parsed: the collection helpers log the
//! offending element and carry on with the rest.

use chrono::{NaiveDate, NaiveTime};
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use super::{
    Circuit, Constructor, ConstructorStanding, Driver, DriverStanding, QualifyingResult, Race,
    RaceResult,
};

type Object = Map<String, Value>;

/// Placeholder code for drivers the API lists without one
const UNKNOWN_DRIVER_CODE: &str = "???";

/// Why a single record could not be parsed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{record} data is not a JSON object")]
    NotAnObject { record: &'static str },

    #[error("{record} data missing required field(s): {}", .fields.join(", "))]
    MissingFields {
        record: &'static str,
        fields: Vec<&'static str>,
    },

    #[error("{record} field '{field}' has invalid value: {value}")]
    InvalidValue {
        record: &'static str,
        field: &'static str,
        value: String,
    },
}

fn object<'a>(value: &'a Value, record: &'static str) -> Result<&'a Object, ParseError> {
    value.as_object().ok_or(ParseError::NotAnObject { record })
}

/// Fails with every missing (absent or null) field named at once
fn require(obj: &Object, record: &'static str, fields: &[&'static str]) -> Result<(), ParseError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .copied()
        .filter(|field| obj.get(*field).map_or(true, Value::is_null))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ParseError::MissingFields {
            record,
            fields: missing,
        })
    }
}

fn invalid(record: &'static str, field: &'static str, value: &Value) -> ParseError {
    ParseError::InvalidValue {
        record,
        field,
        value: value.to_string(),
    }
}

fn field<'a>(obj: &'a Object, record: &'static str, field: &'static str) -> Result<&'a Value, ParseError> {
    obj.get(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ParseError::MissingFields {
            record,
            fields: vec![field],
        })
}

/// String field; numbers are accepted and rendered as text
fn text(obj: &Object, record: &'static str, name: &'static str) -> Result<String, ParseError> {
    match field(obj, record, name)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(invalid(record, name, other)),
    }
}

fn optional_text(obj: &Object, name: &str) -> Option<String> {
    obj.get(name).and_then(Value::as_str).map(str::to_string)
}

/// Numeric field given either as a JSON number or a numeric string
fn number<T: FromStr>(obj: &Object, record: &'static str, name: &'static str) -> Result<T, ParseError> {
    let value = field(obj, record, name)?;
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => return Err(invalid(record, name, other)),
    };
    raw.parse::<T>().map_err(|_| invalid(record, name, value))
}

pub fn parse_circuit(value: &Value) -> Result<Circuit, ParseError> {
    const RECORD: &str = "Circuit";
    let obj = object(value, RECORD)?;
    require(obj, RECORD, &["circuitId", "circuitName", "Location"])?;

    let location = object(&obj["Location"], "Circuit location")?;
    require(location, "Circuit location", &["locality", "country"])?;

    Ok(Circuit {
        circuit_id: text(obj, RECORD, "circuitId")?,
        circuit_name: text(obj, RECORD, "circuitName")?,
        locality: text(location, "Circuit location", "locality")?,
        country: text(location, "Circuit location", "country")?,
    })
}

pub fn parse_driver(value: &Value) -> Result<Driver, ParseError> {
    const RECORD: &str = "Driver";
    let obj = object(value, RECORD)?;
    require(obj, RECORD, &["driverId", "givenName", "familyName", "nationality"])?;

    Ok(Driver {
        driver_id: text(obj, RECORD, "driverId")?,
        code: optional_text(obj, "code").unwrap_or_else(|| UNKNOWN_DRIVER_CODE.to_string()),
        given_name: text(obj, RECORD, "givenName")?,
        family_name: text(obj, RECORD, "familyName")?,
        nationality: text(obj, RECORD, "nationality")?,
    })
}

pub fn parse_constructor(value: &Value) -> Result<Constructor, ParseError> {
    const RECORD: &str = "Constructor";
    let obj = object(value, RECORD)?;
    require(obj, RECORD, &["constructorId", "name", "nationality"])?;

    Ok(Constructor {
        constructor_id: text(obj, RECORD, "constructorId")?,
        name: text(obj, RECORD, "name")?,
        nationality: text(obj, RECORD, "nationality")?,
    })
}

/// Parses a race; `date` plus optional `time` (default midnight UTC)
pub fn parse_race(value: &Value) -> Result<Race, ParseError> {
    const RECORD: &str = "Race";
    let obj = object(value, RECORD)?;
    require(obj, RECORD, &["season", "round", "raceName", "Circuit", "date"])?;

    let date_value = &obj["date"];
    let date = date_value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .ok_or_else(|| invalid(RECORD, "date", date_value))?;

    let time = match obj.get("time") {
        None | Some(Value::Null) => NaiveTime::default(),
        Some(time_value) => time_value
            .as_str()
            .and_then(|s| s.trim_end_matches('Z').parse::<NaiveTime>().ok())
            .ok_or_else(|| invalid(RECORD, "time", time_value))?,
    };

    Ok(Race {
        season: number(obj, RECORD, "season")?,
        round: number(obj, RECORD, "round")?,
        race_name: text(obj, RECORD, "raceName")?,
        circuit: parse_circuit(&obj["Circuit"])?,
        date: date.and_time(time).and_utc(),
    })
}

pub fn parse_race_result(race: &Race, value: &Value) -> Result<RaceResult, ParseError> {
    const RECORD: &str = "Race result";
    let obj = object(value, RECORD)?;
    require(
        obj,
        RECORD,
        &["Driver", "Constructor", "position", "points", "grid", "laps", "status"],
    )?;

    Ok(RaceResult {
        race: race.clone(),
        driver: parse_driver(&obj["Driver"])?,
        constructor: parse_constructor(&obj["Constructor"])?,
        position: number(obj, RECORD, "position")?,
        points: number(obj, RECORD, "points")?,
        grid: number(obj, RECORD, "grid")?,
        laps: number(obj, RECORD, "laps")?,
        status: text(obj, RECORD, "status")?,
    })
}

pub fn parse_qualifying_result(race: &Race, value: &Value) -> Result<QualifyingResult, ParseError> {
    const RECORD: &str = "Qualifying result";
    let obj = object(value, RECORD)?;
    require(obj, RECORD, &["Driver", "Constructor", "position"])?;

    Ok(QualifyingResult {
        race: race.clone(),
        driver: parse_driver(&obj["Driver"])?,
        constructor: parse_constructor(&obj["Constructor"])?,
        position: number(obj, RECORD, "position")?,
        q1: optional_text(obj, "Q1"),
        q2: optional_text(obj, "Q2"),
        q3: optional_text(obj, "Q3"),
    })
}

pub fn parse_driver_standing(value: &Value) -> Result<DriverStanding, ParseError> {
    const RECORD: &str = "Driver standing";
    let obj = object(value, RECORD)?;
    require(obj, RECORD, &["Driver", "Constructors", "position", "points", "wins"])?;

    let constructors = &obj["Constructors"];
    let first = constructors
        .as_array()
        .and_then(|list| list.first())
        .ok_or_else(|| invalid(RECORD, "Constructors", constructors))?;

    Ok(DriverStanding {
        driver: parse_driver(&obj["Driver"])?,
        constructor: parse_constructor(first)?,
        position: number(obj, RECORD, "position")?,
        points: number(obj, RECORD, "points")?,
        wins: number(obj, RECORD, "wins")?,
    })
}

pub fn parse_constructor_standing(value: &Value) -> Result<ConstructorStanding, ParseError> {
    const RECORD: &str = "Constructor standing";
    let obj = object(value, RECORD)?;
    require(obj, RECORD, &["Constructor", "position", "points", "wins"])?;

    Ok(ConstructorStanding {
        constructor: parse_constructor(&obj["Constructor"])?,
        position: number(obj, RECORD, "position")?,
        points: number(obj, RECORD, "points")?,
        wins: number(obj, RECORD, "wins")?,
    })
}

/// Applies `parse` to every element, skipping (and logging) failures
pub fn parse_each<T>(
    items: &[Value],
    what: &str,
    mut parse: impl FnMut(&Value) -> Result<T, ParseError>,
) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match parse(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(what, index, error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

fn array<'a>(body: &'a Value, pointer: &str) -> &'a [Value] {
    body.pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// `MRData.RaceTable.Races`, empty when absent
pub fn races(body: &Value) -> &[Value] {
    array(body, "/MRData/RaceTable/Races")
}

/// The `list_field` array of the first standings list, empty when absent
pub fn standings<'a>(body: &'a Value, list_field: &str) -> &'a [Value] {
    array(
        body,
        &format!("/MRData/StandingsTable/StandingsLists/0/{}", list_field),
    )
}

/// Whether the response carries a first standings list at all
pub fn has_standings(body: &Value) -> bool {
    body.pointer("/MRData/StandingsTable/StandingsLists/0").is_some()
}

/// Flattens the `Results` of every race accepted by `keep`
///
/// Races that fail to parse are skipped with all their results.
pub fn race_results(body: &Value, mut keep: impl FnMut(&Race) -> bool) -> Vec<RaceResult> {
    let mut results = Vec::new();
    for race_data in races(body) {
        let race = match parse_race(race_data) {
            Ok(race) => race,
            Err(e) => {
                warn!(error = %e, "skipping malformed race");
                continue;
            }
        };
        if !keep(&race) {
            continue;
        }
        let entries = array(race_data, "/Results");
        results.extend(parse_each(entries, "race result", |v| {
            parse_race_result(&race, v)
        }));
    }
    results
}

/// Qualifying results of the first race in the response
pub fn qualifying_results(body: &Value) -> Vec<QualifyingResult> {
    let Some(race_data) = races(body).first() else {
        return Vec::new();
    };
    match parse_race(race_data) {
        Ok(race) => parse_each(array(race_data, "/QualifyingResults"), "qualifying result", |v| {
            parse_qualifying_result(&race, v)
        }),
        Err(e) => {
            warn!(error = %e, "skipping malformed qualifying race");
            Vec::new()
        }
    }
}
