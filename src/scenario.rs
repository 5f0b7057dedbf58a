//! Scenario input parsing
//!
//! The input is a whitespace-delimited token stream:
//!
//! ```text
//! duration n_intersections n_streets n_cars bonus_points
//! i_start i_end name traversal_time        (n_streets times)
//! path_length street_1 ... street_k        (n_cars times)
//! ```

use std::str::{FromStr, SplitWhitespace};

use crate::simulation::Tick;

/// Errors for scenario text that does not follow the input format.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// The input ended before a required field.
    #[error("unexpected end of input while reading {field}")]
    UnexpectedEof { field: &'static str },

    /// A numeric field held something else.
    #[error("{field} must be a non-negative integer, got '{token}'")]
    InvalidInteger { field: &'static str, token: String },

    /// Streets need at least one tick to traverse.
    #[error("street '{street}' has a traversal time of 0")]
    ZeroTraversalTime { street: String },

    /// Tokens remained after the last car.
    #[error("unexpected trailing input starting at '{token}'")]
    TrailingInput { token: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetSpec {
    pub start: usize,
    pub end: usize,
    pub name: String,
    pub traversal_time: Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarSpec {
    pub path: Vec<String>,
}

/// A parsed scenario, before any network validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub duration: Tick,
    pub intersection_count: usize,
    pub bonus_points: u64,
    pub streets: Vec<StreetSpec>,
    pub cars: Vec<CarSpec>,
}

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn word(&mut self, field: &'static str) -> Result<&'a str, ParseError> {
        self.inner.next().ok_or(ParseError::UnexpectedEof { field })
    }

    fn number<T: FromStr>(&mut self, field: &'static str) -> Result<T, ParseError> {
        let token = self.word(field)?;
        token.parse().map_err(|_| ParseError::InvalidInteger {
            field,
            token: token.to_string(),
        })
    }
}

impl Scenario {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut tokens = Tokens {
            inner: input.split_whitespace(),
        };

        let duration = tokens.number("duration")?;
        let intersection_count = tokens.number("intersection count")?;
        let street_count: usize = tokens.number("street count")?;
        let car_count: usize = tokens.number("car count")?;
        let bonus_points = tokens.number("bonus points")?;

        let mut streets = Vec::with_capacity(street_count);
        for _ in 0..street_count {
            let start = tokens.number("street start")?;
            let end = tokens.number("street end")?;
            let name = tokens.word("street name")?.to_string();
            let traversal_time: Tick = tokens.number("traversal time")?;
            if traversal_time == 0 {
                return Err(ParseError::ZeroTraversalTime { street: name });
            }
            streets.push(StreetSpec {
                start,
                end,
                name,
                traversal_time,
            });
        }

        let mut cars = Vec::with_capacity(car_count);
        for _ in 0..car_count {
            let length: usize = tokens.number("path length")?;
            let path = (0..length)
                .map(|_| tokens.word("path street").map(str::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            cars.push(CarSpec { path });
        }

        if let Some(token) = tokens.inner.next() {
            return Err(ParseError::TrailingInput {
                token: token.to_string(),
            });
        }

        Ok(Self {
            duration,
            intersection_count,
            bonus_points,
            streets,
            cars,
        })
    }
}
