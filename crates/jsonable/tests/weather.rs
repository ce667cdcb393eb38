use std::collections::BTreeMap;

use jsonable::{
    from_jsonable, from_jsonable_list, to_jsonable, to_jsonable_list, Descriptor, Jsonable,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use time::macros::datetime;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Jsonable)]
enum WindDirection {
    #[jsonable(value = "N")]
    North,
    #[jsonable(value = "S")]
    South,
    #[jsonable(value = "W")]
    West,
    #[jsonable(value = "E")]
    East,
}

#[derive(Debug, Clone, PartialEq, Jsonable)]
struct Precipitation {
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Jsonable)]
struct WeatherData {
    temperatures: BTreeMap<PrimitiveDateTime, f64>,
    wind_direction: WindDirection,
    precipitations: Vec<Precipitation>,
    just_dict: Option<BTreeMap<String, String>>,
}

fn weather(just_dict: Option<BTreeMap<String, String>>) -> WeatherData {
    WeatherData {
        temperatures: BTreeMap::from([
            (datetime!(2022-12-28 17:48:00), 22.2),
            (datetime!(2022-12-28 17:48:01), 25.2),
        ]),
        wind_direction: WindDirection::North,
        precipitations: vec![
            Precipitation {
                start: datetime!(2022-12-28 10:48:00),
                end: datetime!(2022-12-28 12:48:00),
            },
            Precipitation {
                start: datetime!(2022-12-28 14:48:00),
                end: datetime!(2022-12-28 16:48:00),
            },
        ],
        just_dict,
    }
}

fn weather_json() -> serde_json::Value {
    json!({
        "precipitations": [
            {"end": "2022-12-28T12:48:00", "start": "2022-12-28T10:48:00"},
            {"end": "2022-12-28T16:48:00", "start": "2022-12-28T14:48:00"}
        ],
        "temperatures": {"2022-12-28T17:48:00": 22.2, "2022-12-28T17:48:01": 25.2},
        "wind_direction": "N"
    })
}

#[test]
fn weather_to_map() {
    let encoded = to_jsonable(&weather(Some(BTreeMap::new()))).unwrap();

    let mut expected = weather_json();
    expected["just_dict"] = json!({});
    assert_eq!(encoded, Jsonable::from(expected));
}

#[test]
fn weather_to_list() {
    let encoded = to_jsonable_list(&[weather(None)]).unwrap();

    let mut expected = weather_json();
    expected["just_dict"] = json!(null);
    assert_eq!(encoded, vec![Jsonable::from(expected)]);
}

#[test]
fn weather_from_map_defaults_absent_optional_field() {
    let descriptor = Descriptor::<WeatherData>::new().unwrap();
    let decoded = from_jsonable(descriptor, Jsonable::from(weather_json())).unwrap();
    assert_eq!(decoded, weather(None));
}

#[test]
fn weather_from_list() {
    let descriptor = Descriptor::<WeatherData>::new().unwrap();
    let decoded = from_jsonable_list(descriptor, vec![Jsonable::from(weather_json())]).unwrap();
    assert_eq!(decoded, vec![weather(None)]);
}

#[test]
fn enum_members_encode_by_value_not_name() {
    assert_eq!(
        to_jsonable(&WindDirection::North).unwrap(),
        Jsonable::from("N")
    );
    let descriptor = Descriptor::<WindDirection>::new().unwrap();
    assert_eq!(
        from_jsonable(descriptor, Jsonable::from("E")).unwrap(),
        WindDirection::East
    );
    assert!(from_jsonable(descriptor, Jsonable::from("North")).is_err());
}

#[test]
fn weather_survives_json_text() {
    let original = weather(Some(BTreeMap::from([("k".to_string(), "v".to_string())])));
    let text = jsonable::to_json_string(&original).unwrap();
    let decoded: WeatherData = jsonable::from_json_str(&text).unwrap();
    assert_eq!(decoded, original);
}
