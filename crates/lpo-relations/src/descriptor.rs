//! libpq keyword/value connection descriptors.
//!
//! The legacy channel publishes descriptors such as
//! `host=h port=5432 dbname=d user=u password=p`. Values may be
//! single-quoted; inside quotes `\'` and `\\` are escapes.

use serde::{Deserialize, Serialize};

use crate::error::{RelationError, RelationResult};

/// A parsed connection descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: Option<u16>,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl ConnectionDescriptor {
    pub fn parse(input: &str) -> RelationResult<Self> {
        let mut host = None;
        let mut port = None;
        let mut dbname = None;
        let mut user = None;
        let mut password = None;

        for (key, value) in tokenize(input)? {
            match key.as_str() {
                "host" => host = Some(value),
                "port" => {
                    let parsed = value.parse::<u16>().map_err(|_| {
                        RelationError::InvalidDescriptor(format!("bad port {value:?}"))
                    })?;
                    port = Some(parsed);
                }
                "dbname" => dbname = Some(value),
                "user" => user = Some(value),
                "password" => password = Some(value),
                // Other libpq keywords (sslmode, fallback_application_name, ...) are ignored.
                _ => {}
            }
        }

        let missing = |field: &str| RelationError::InvalidDescriptor(format!("missing {field}"));
        Ok(Self {
            host: host.ok_or_else(|| missing("host"))?,
            port,
            dbname: dbname.ok_or_else(|| missing("dbname"))?,
            user: user.ok_or_else(|| missing("user"))?,
            password: password.ok_or_else(|| missing("password"))?,
        })
    }

    /// Parse a newline-separated list of descriptors, skipping blank lines.
    pub fn parse_list(input: &str) -> RelationResult<Vec<Self>> {
        input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Self::parse)
            .collect()
    }
}

fn tokenize(input: &str) -> RelationResult<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.next() != Some('=') {
            return Err(RelationError::InvalidDescriptor(format!(
                "expected '=' after {key:?}"
            )));
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'\'').is_some() {
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(c) => value.push(c),
                        None => break,
                    },
                    Some('\'') => break,
                    Some(c) => value.push(c),
                    None => {
                        return Err(RelationError::InvalidDescriptor(format!(
                            "unterminated quote in value of {key:?}"
                        )));
                    }
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
        }

        pairs.push((key, value));
    }

    Ok(pairs)
}
