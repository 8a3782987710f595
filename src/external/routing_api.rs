use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::RoutePlanner;
use crate::config::Config;
use crate::entities::{
    GeoPoint, Instruction, InstructionType, Route, RouteLeg, RoutePlanningOptions,
};
use crate::error::{invalid_input_error, routing_error, upstream_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Point {
    latitude: f64,
    longitude: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    length_in_meters: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Leg {
    points: Vec<Point>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuidanceInstruction {
    route_offset_in_meters: f64,
    #[serde(default)]
    combine_with_next: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Guidance {
    #[serde(default)]
    instructions: Vec<GuidanceInstruction>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ApiRoute {
    summary: Summary,
    legs: Vec<Leg>,
    #[serde(default)]
    guidance: Guidance,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response {
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

impl From<Point> for GeoPoint {
    fn from(point: Point) -> Self {
        GeoPoint::new(point.latitude, point.longitude)
    }
}

impl From<ApiRoute> for Route {
    fn from(route: ApiRoute) -> Self {
        let length = route.summary.length_in_meters;
        let instructions: Vec<Instruction> = route
            .guidance
            .instructions
            .into_iter()
            .map(|i| Instruction {
                route_offset: i.route_offset_in_meters,
                combine_with_next: i.combine_with_next,
            })
            .collect();

        let mut legs: Vec<RouteLeg> = route
            .legs
            .into_iter()
            .map(|leg| RouteLeg {
                points: leg.points.into_iter().map(GeoPoint::from).collect(),
                instructions: vec![],
            })
            .collect();

        // guidance is reported for the whole route
        if let Some(first) = legs.first_mut() {
            first.instructions = instructions;
        }

        Route::new(legs).with_length(length)
    }
}

fn into_routes(data: Response) -> Result<Vec<Route>, Error> {
    if data.routes.is_empty() {
        return Err(routing_error("no route found"));
    }

    Ok(data.routes.into_iter().map(Route::from).collect())
}

fn instructions_type(instruction_type: InstructionType) -> &'static str {
    match instruction_type {
        InstructionType::Coded => "coded",
        InstructionType::Text => "text",
        InstructionType::Tagged => "tagged",
    }
}

/// Plans routes with the online calculate-route endpoint.
#[derive(Clone, Debug)]
pub struct OnlineRoutePlanner {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl OnlineRoutePlanner {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let api_key = match &config.api_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => {
                tracing::warn!("online routing needs an api key");
                return Err(invalid_input_error());
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_base: config.routing_api_base.clone(),
            api_key,
        })
    }

    fn url(&self, options: &RoutePlanningOptions) -> String {
        let (origin, destination) = (options.itinerary.origin, options.itinerary.destination);

        format!(
            "https://{}/routing/1/calculateRoute/{},{}:{},{}/json",
            self.api_base,
            origin.latitude,
            origin.longitude,
            destination.latitude,
            destination.longitude
        )
    }
}

#[async_trait]
impl RoutePlanner for OnlineRoutePlanner {
    #[tracing::instrument(skip(self))]
    async fn plan_route(&self, options: &RoutePlanningOptions) -> Result<Vec<Route>, Error> {
        let res = self
            .client
            .get(self.url(options))
            .query(&[("key", self.api_key.as_str())])
            .query(&[(
                "instructionsType",
                instructions_type(options.guidance.instruction_type),
            )])
            .query(&[("travelMode", options.vehicle.travel_mode())])
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if (400..500).contains(&status_code) {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let data: Response = res.json().await?;

        into_routes(data)
    }
}

#[test]
fn parses_calculate_route_response() {
    let body = r#"{
        "formatVersion": "0.0.12",
        "routes": [{
            "summary": { "lengthInMeters": 1234, "travelTimeInSeconds": 160 },
            "legs": [{
                "summary": { "lengthInMeters": 1234 },
                "points": [
                    { "latitude": 52.3676, "longitude": 4.9041 },
                    { "latitude": 52.3700, "longitude": 4.8990 },
                    { "latitude": 52.3731, "longitude": 4.8922 }
                ]
            }],
            "guidance": {
                "instructions": [
                    { "routeOffsetInMeters": 0, "maneuver": "DEPART" },
                    { "routeOffsetInMeters": 600, "combineWithNext": true },
                    { "routeOffsetInMeters": 1234, "maneuver": "ARRIVE" }
                ]
            }
        }]
    }"#;

    let data: Response = serde_json::from_str(body).unwrap();
    let routes = into_routes(data).unwrap();

    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].length, 1234.0);
    assert_eq!(routes[0].geometry().len(), 3);
    assert_eq!(routes[0].destination(), Some(GeoPoint::new(52.3731, 4.8922)));

    let instructions = routes[0].instructions();
    assert_eq!(instructions.len(), 3);
    assert!(instructions[1].combine_with_next);
    assert!(!instructions[2].combine_with_next);
}

#[test]
fn empty_response_is_a_routing_failure() {
    let data: Response = serde_json::from_str(r#"{ "routes": [] }"#).unwrap();
    let err = into_routes(data).unwrap_err();

    assert!(err.is_routing_error());
    assert!(OnlineRoutePlanner::new(&Config::default()).is_err());
}

#[test]
fn url_encodes_itinerary() {
    use crate::entities::Itinerary;

    let config = Config {
        api_key: Some("key".into()),
        ..Config::default()
    };
    let planner = OnlineRoutePlanner::new(&config).unwrap();
    let options = RoutePlanningOptions::new(Itinerary::new(
        GeoPoint::new(52.5, 4.5),
        GeoPoint::new(52.25, 4.75),
    ));

    assert_eq!(
        planner.url(&options),
        "https://api.tomtom.com/routing/1/calculateRoute/52.5,4.5:52.25,4.75/json"
    );
}
