// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::Method;
use serde::Serialize;

pub const TOPOLOGY_ENDPOINT: &str = "/api/v1/node-topology";
pub const TRUST_LINE_ENDPOINT: &str = "/api/v1/trustline";
pub const PAYMENT_ENDPOINT: &str = "/api/v1/payment";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    #[serde(rename = "hash")]
    pub node: String,
    pub neighbors: Vec<String>,
    pub equivalent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustLine {
    pub source: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equivalent: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    #[serde(rename = "coordinator")]
    pub source: String,
    #[serde(rename = "receiver")]
    pub destination: String,
    pub equivalent: u32,
    #[serde(rename = "transaction_uuid")]
    pub transaction_id: String,
    pub paths: Vec<Vec<String>>,
}

/// A payload ready to be published to the collecting-data service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Topology(Topology),
    TrustLineOpened(TrustLine),
    TrustLineClosed(TrustLine),
    Payment(Payment),
}

impl Payload {
    /// Path appended to the collector base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Topology(_) => TOPOLOGY_ENDPOINT,
            Self::TrustLineOpened(_) | Self::TrustLineClosed(_) => TRUST_LINE_ENDPOINT,
            Self::Payment(_) => PAYMENT_ENDPOINT,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::TrustLineClosed(_) => Method::DELETE,
            Self::Topology(_) | Self::TrustLineOpened(_) | Self::Payment(_) => Method::POST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_field_names() {
        let payment = Payload::Payment(Payment {
            source: "s".to_string(),
            destination: "d".to_string(),
            equivalent: 7,
            transaction_id: "tx".to_string(),
            paths: vec![vec!["a".to_string(), "d".to_string()]],
        });
        assert_eq!(
            serde_json::to_value(&payment).unwrap(),
            json!({
                "coordinator": "s",
                "receiver": "d",
                "equivalent": 7,
                "transaction_uuid": "tx",
                "paths": [["a", "d"]],
            })
        );
        assert_eq!(payment.endpoint(), "/api/v1/payment");
        assert_eq!(payment.method(), Method::POST);
    }

    #[test]
    fn test_closed_trust_line_omits_equivalent() {
        let closed = Payload::TrustLineClosed(TrustLine {
            source: "s".to_string(),
            destination: "d".to_string(),
            equivalent: None,
        });
        assert_eq!(
            serde_json::to_value(&closed).unwrap(),
            json!({ "source": "s", "destination": "d" })
        );
        assert_eq!(closed.endpoint(), "/api/v1/trustline");
        assert_eq!(closed.method(), Method::DELETE);
    }

    #[test]
    fn test_topology_field_names() {
        let topology = Payload::Topology(Topology {
            node: "n".to_string(),
            neighbors: vec![],
            equivalent: 1,
        });
        assert_eq!(
            serde_json::to_value(&topology).unwrap(),
            json!({ "hash": "n", "neighbors": [], "equivalent": 1 })
        );
        assert_eq!(topology.endpoint(), "/api/v1/node-topology");
    }
}
