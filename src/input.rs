//! Permissive parsing of the raw coordinate form fields.
//! See [`CoordinateInputs`].

use std::str::FromStr;

use chumsky::{
    prelude::Simple,
    primitive::{end, just, one_of},
    text::{self, TextParser},
    Parser,
};
use color_eyre::Help;
use serde::{Deserialize, Serialize};

use crate::gis::Position;

/// The four raw strings entered by the user, exactly as typed.
///
/// Field names are serialized using the keys of the saved form (`myLat`, `myLng`, `missingLat`,
/// `missingLng`).
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateInputs {
    /// Latitude of your own position.
    #[serde(rename = "myLat")]
    pub my_latitude: String,
    /// Longitude of your own position.
    #[serde(rename = "myLng")]
    pub my_longitude: String,
    /// Latitude of the device being tracked.
    #[serde(rename = "missingLat")]
    pub target_latitude: String,
    /// Longitude of the device being tracked.
    #[serde(rename = "missingLng")]
    pub target_longitude: String,
}

impl CoordinateInputs {
    /// Construct from the four raw strings.
    pub fn new(
        my_latitude: impl Into<String>,
        my_longitude: impl Into<String>,
        target_latitude: impl Into<String>,
        target_longitude: impl Into<String>,
    ) -> Self {
        Self {
            my_latitude: my_latitude.into(),
            my_longitude: my_longitude.into(),
            target_latitude: target_latitude.into(),
            target_longitude: target_longitude.into(),
        }
    }

    /// Your own position, if both fields hold valid values.
    pub fn me(&self) -> Option<Position> {
        parse_position(&self.my_latitude, &self.my_longitude)
    }

    /// The tracked device position, if both fields hold valid values.
    pub fn target(&self) -> Option<Position> {
        parse_position(&self.target_latitude, &self.target_longitude)
    }

    /// Overwrite your own position fields with `position`.
    pub fn set_me(&mut self, position: &Position) {
        self.my_latitude = position.latitude.to_string();
        self.my_longitude = position.longitude.to_string();
    }

    /// Copy every non-empty field of `other` over the fields of `self`.
    pub fn overlay(&mut self, other: &CoordinateInputs) {
        let fields = [
            (&mut self.my_latitude, &other.my_latitude),
            (&mut self.my_longitude, &other.my_longitude),
            (&mut self.target_latitude, &other.target_latitude),
            (&mut self.target_longitude, &other.target_longitude),
        ];
        for (field, value) in fields {
            if !value.is_empty() {
                field.clone_from(value);
            }
        }
    }

    /// Resolve the inputs into a fresh [`TrackingState`].
    pub fn resolve(&self) -> TrackingState {
        TrackingState {
            me: self.me(),
            target: self.target(),
        }
    }
}

/// The resolved coordinates of one "track" action. Absent means the pair was empty, partial, or
/// invalid.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct TrackingState {
    /// Your own position.
    pub me: Option<Position>,
    /// The tracked device position.
    pub target: Option<Position>,
}

impl TrackingState {
    /// Number of positions present (0, 1 or 2).
    pub fn len(&self) -> usize {
        usize::from(self.me.is_some()) + usize::from(self.target.is_some())
    }

    /// Whether neither position is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parses the leading decimal number of a string, ignoring whatever follows it:
///
/// e.g:
/// + `40.7128`
/// + `-74.006`
/// + `.5`
/// + `12.`
/// + `1.5e-3`
/// + `45.5N` (parsed as `45.5`)
fn decimal_parser() -> impl Parser<char, f64, Error = Simple<char>> {
    let digits = || text::digits::<char, Simple<char>>(10);

    // `12`, `12.` or `12.34`
    let integral = digits()
        .then(
            just::<char, _, Simple<char>>('.')
                .ignore_then(digits().or_not())
                .or_not(),
        )
        .map(|(integer, fraction)| match fraction {
            Some(fraction) => format!(
                "{}.{}",
                integer,
                fraction.unwrap_or_else(|| "0".to_string())
            ),
            None => integer,
        });

    // `.34`
    let fractional = just::<char, _, Simple<char>>('.')
        .ignore_then(digits())
        .map(|fraction| format!("0.{}", fraction));

    let exponent = one_of::<char, _, Simple<char>>("eE")
        .ignore_then(one_of::<char, _, Simple<char>>("+-").or_not())
        .then(digits())
        .map(|(sign, digits)| {
            format!(
                "e{}{}",
                sign.map(String::from).unwrap_or_default(),
                digits
            )
        });

    one_of::<char, _, Simple<char>>("+-")
        .or_not()
        .then(integral.or(fractional))
        .then(exponent.or_not())
        .try_map(|((sign, mantissa), exponent), span| {
            let literal = format!(
                "{}{}{}",
                sign.map(String::from).unwrap_or_default(),
                mantissa,
                exponent.unwrap_or_default()
            );
            literal
                .parse::<f64>()
                .map_err(|e| Simple::custom(span, format!("{}", e)))
        })
}

/// Permissively parse one raw coordinate component.
///
/// Leading whitespace and anything after the number are ignored. Returns `None` when the string
/// does not start with a finite decimal number.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    decimal_parser()
        .padded()
        .parse(raw)
        .ok()
        .filter(|value| value.is_finite())
}

/// Parse a latitude/longitude pair of raw strings. Partial, unparseable or out of range pairs are
/// `None`.
pub fn parse_position(latitude: &str, longitude: &str) -> Option<Position> {
    let latitude = parse_decimal(latitude)?;
    let longitude = parse_decimal(longitude)?;
    match Position::try_new(latitude, longitude) {
        Ok(position) => Some(position),
        Err(error) => {
            tracing::debug!("Ignoring coordinate: {}", error);
            None
        }
    }
}

fn position_parser() -> impl Parser<char, Position, Error = Simple<char>> {
    decimal_parser()
        .then_ignore(just::<char, _, Simple<char>>(',').padded())
        .then(decimal_parser())
        .try_map(|(latitude, longitude), span| {
            Position::try_new(latitude, longitude)
                .map_err(|error| Simple::custom(span, error.to_string()))
        })
}

/// Convert parsing errors to an eyre formatted error.
pub fn errors_to_eyre(errors: Vec<Simple<char>>) -> eyre::Error {
    let mut errors_formatted = String::new();
    for (i, error) in errors.into_iter().enumerate() {
        errors_formatted.push_str(&format!("Error {}: {:#}, ", i, error))
    }
    eyre::eyre!("Error parsing Position from string. {}", errors_formatted)
}

impl FromStr for Position {
    type Err = eyre::Error;

    /// Strictly parse `latitude,longitude`, unlike the permissive form fields.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        position_parser()
            .padded()
            .then_ignore(end())
            .parse(s)
            .map_err(|errors| {
                errors_to_eyre(errors)
                    .suggestion("Expected a latitude,longitude in degrees like: `-24.0,45.0`")
            })
    }
}
