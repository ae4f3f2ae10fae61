// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decoding of the records a GEO node writes to its events FIFO.
//!
//! Every record is one line of tab-separated fields terminated by `\n`. The first field is the
//! integer event code, the remaining fields are specific to the event type and are kept as raw
//! strings until the router interprets them.

use crate::errors::DecodeError;

const RECORD_DELIMITER: u8 = b'\n';
const FIELD_SEPARATOR: char = '\t';

/// One decoded events line: the event code and the fields that followed it, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub opcode: i64,
    pub tokens: Vec<String>,
}

/// The event types a node reports, keyed by their event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Topology,
    TrustLineOpened,
    TrustLineClosed,
    Payment,
}

impl TryFrom<i64> for EventKind {
    type Error = i64;

    fn try_from(opcode: i64) -> Result<Self, Self::Error> {
        match opcode {
            0 => Ok(Self::Topology),
            1 => Ok(Self::TrustLineOpened),
            2 => Ok(Self::TrustLineClosed),
            3 => Ok(Self::Payment),
            unknown => Err(unknown),
        }
    }
}

impl RawEvent {
    pub fn kind(&self) -> Result<EventKind, i64> {
        EventKind::try_from(self.opcode)
    }
}

/// Parses one record. A single trailing `\n`, if present, is stripped before splitting.
pub fn decode(raw: &[u8]) -> Result<RawEvent, DecodeError> {
    let body = raw.strip_suffix(&[RECORD_DELIMITER]).unwrap_or(raw);
    let line = std::str::from_utf8(body).map_err(|_| DecodeError::InvalidUtf8)?;

    let mut fields = line.split(FIELD_SEPARATOR);
    let code = fields.next().unwrap_or_default();
    let opcode = code
        .parse::<i64>()
        .map_err(|_| DecodeError::InvalidOpcode(code.to_string()))?;

    Ok(RawEvent {
        opcode,
        tokens: fields.map(str::to_string).collect(),
    })
}
