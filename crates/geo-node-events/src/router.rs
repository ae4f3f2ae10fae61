// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns decoded events into collector payloads.
//!
//! Every node identifier is anonymised with [`hash`] before it leaves the handler. Structural
//! problems (wrong token count, unparsable numbers, neighbor count mismatch) are reported as
//! [`RouteError`] so the caller can log and drop the single event.

use std::str::FromStr;

use tracing::warn;

use crate::errors::RouteError;
use crate::event::{EventKind, RawEvent};
use crate::hash::hash;
use crate::payload::{Payload, Payment, Topology, TrustLine};

const TOPOLOGY_HEADER_TOKENS: usize = 3;
const TRUST_LINE_TOKENS: usize = 3;
const PAYMENT_HEADER_TOKENS: usize = 4;

/// Builds the payload for an event, picking the builder by event type.
pub fn route(event: &RawEvent) -> Result<Payload, RouteError> {
    let kind = event.kind().map_err(RouteError::UnknownOpcode)?;
    match kind {
        EventKind::Topology => topology(event).map(Payload::Topology),
        EventKind::TrustLineOpened => trust_line_opened(event).map(Payload::TrustLineOpened),
        EventKind::TrustLineClosed => trust_line_closed(event).map(Payload::TrustLineClosed),
        EventKind::Payment => payment(event).map(Payload::Payment),
    }
}

fn topology(event: &RawEvent) -> Result<Topology, RouteError> {
    let tokens = &event.tokens;
    if tokens.len() < TOPOLOGY_HEADER_TOKENS {
        return Err(token_count(event, "at least 3"));
    }

    let equivalent = parse_number(event, 0, "equivalent")?;
    let declared: usize = parse_number(event, 2, "neighbors count")?;
    let neighbors = &tokens[TOPOLOGY_HEADER_TOKENS..];
    if neighbors.len() != declared {
        return Err(RouteError::NeighborCountMismatch {
            declared,
            available: neighbors.len(),
        });
    }

    Ok(Topology {
        node: hash(&tokens[1]),
        neighbors: neighbors.iter().map(|neighbor| hash(neighbor)).collect(),
        equivalent,
    })
}

fn trust_line_opened(event: &RawEvent) -> Result<TrustLine, RouteError> {
    if event.tokens.len() != TRUST_LINE_TOKENS {
        return Err(token_count(event, "exactly 3"));
    }
    Ok(TrustLine {
        source: hash(&event.tokens[1]),
        destination: hash(&event.tokens[2]),
        equivalent: Some(parse_number(event, 0, "equivalent")?),
    })
}

fn trust_line_closed(event: &RawEvent) -> Result<TrustLine, RouteError> {
    if event.tokens.len() != TRUST_LINE_TOKENS {
        return Err(token_count(event, "exactly 3"));
    }
    Ok(TrustLine {
        source: hash(&event.tokens[1]),
        destination: hash(&event.tokens[2]),
        equivalent: None,
    })
}

fn payment(event: &RawEvent) -> Result<Payment, RouteError> {
    let tokens = &event.tokens;
    if tokens.len() < PAYMENT_HEADER_TOKENS {
        return Err(token_count(event, "at least 4"));
    }

    let equivalent = parse_number(event, 0, "equivalent")?;
    let destination = &tokens[3];
    let (paths, unterminated) = segment_paths(&tokens[PAYMENT_HEADER_TOKENS..], destination);
    if unterminated > 0 {
        warn!(
            "Payment {} has {} trailing path tokens not terminated by the receiver. Dropped",
            tokens[1], unterminated
        );
    }

    Ok(Payment {
        source: hash(&tokens[2]),
        destination: hash(destination),
        equivalent,
        transaction_id: tokens[1].clone(),
        paths,
    })
}

/// Splits the concatenated payment paths. Each path ends with the destination identifier, which
/// is kept as the path's last element. Returns the hashed paths and the number of trailing tokens
/// that were not terminated by the destination.
pub fn segment_paths(tokens: &[String], destination: &str) -> (Vec<Vec<String>>, usize) {
    let mut paths = Vec::new();
    let mut current = Vec::new();
    for token in tokens {
        current.push(hash(token));
        if token == destination {
            paths.push(std::mem::take(&mut current));
        }
    }
    (paths, current.len())
}

fn parse_number<T: FromStr>(
    event: &RawEvent,
    index: usize,
    field: &'static str,
) -> Result<T, RouteError> {
    let value = &event.tokens[index];
    value.parse::<T>().map_err(|_| RouteError::InvalidNumber {
        opcode: event.opcode,
        field,
        value: value.clone(),
    })
}

fn token_count(event: &RawEvent, expected: &'static str) -> RouteError {
    RouteError::TokenCount {
        opcode: event.opcode,
        got: event.tokens.len(),
        expected,
    }
}
