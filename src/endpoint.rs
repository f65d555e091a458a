//! endpoint identifiers
//!
//! the gateway serves a subgraph either by its registry id (api key in the
//! url path) or by the content hash of one deployment (bearer auth).

use std::fmt;

/// prefix of ipfs-style deployment hashes
const DEPLOYMENT_PREFIX: &str = "Qm";

/// ids at or below this many characters are never deployment hashes
const DEPLOYMENT_MIN_EXCLUSIVE_LEN: usize = 40;

/// a subgraph or deployment reference on the gateway
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// registry id, sent as `<base>/<key>/subgraphs/id/<id>`
    Subgraph(String),
    /// deployment hash, sent as `<base>/deployments/id/<id>` with a bearer key
    Deployment(String),
}

impl Endpoint {
    /// classify a raw id
    ///
    /// anything that starts with `Qm` and is longer than 40 characters is a
    /// deployment hash. everything else is treated as a subgraph id. the id
    /// is not validated further.
    ///
    /// ```
    /// use graph_gateway::Endpoint;
    ///
    /// let deployment = Endpoint::classify("QmeB7YfNvLbM9AnSVeh5JvsfUwm1KVCtUDwaDLh5oxupGh");
    /// assert!(matches!(deployment, Endpoint::Deployment(_)));
    ///
    /// let subgraph = Endpoint::classify("5zvR82QoaXYFyDEKLZ9t6v9adgnptxYZ22YwKx9QqPWVTH7CZ");
    /// assert!(matches!(subgraph, Endpoint::Subgraph(_)));
    /// ```
    pub fn classify(id: impl Into<String>) -> Self {
        let id = id.into();
        if is_deployment_id(&id) {
            Endpoint::Deployment(id)
        } else {
            Endpoint::Subgraph(id)
        }
    }

    /// the raw id
    pub fn id(&self) -> &str {
        match self {
            Endpoint::Subgraph(id) | Endpoint::Deployment(id) => id,
        }
    }

    /// short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Endpoint::Subgraph(_) => "subgraph",
            Endpoint::Deployment(_) => "deployment",
        }
    }

    /// true if requests to this endpoint carry the key as a bearer token
    pub fn uses_bearer_auth(&self) -> bool {
        matches!(self, Endpoint::Deployment(_))
    }
}

fn is_deployment_id(id: &str) -> bool {
    id.starts_with(DEPLOYMENT_PREFIX) && id.chars().count() > DEPLOYMENT_MIN_EXCLUSIVE_LEN
}

impl From<&str> for Endpoint {
    fn from(id: &str) -> Self {
        Endpoint::classify(id)
    }
}

impl From<String> for Endpoint {
    fn from(id: String) -> Self {
        Endpoint::classify(id)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_deployment_hash() {
        let id = "QmeB7YfNvLbM9AnSVeh5JvsfUwm1KVCtUDwaDLh5oxupGh";
        assert_eq!(Endpoint::classify(id), Endpoint::Deployment(id.to_string()));
    }

    #[test]
    fn test_classify_subgraph_ids() {
        for id in [
            "HMuAwufqZ1YCRmzL2SfHTVkzZovC9VL2UAKhjvRqKiR1",
            "5zvR82QoaXYFyDEKLZ9t6v9adgnptxYZ22YwKx9QqPWVTH7CZ",
            "DZz4kDTdmzWLWsV373w2bSmoar3umKKH9y82SUKr5qmp",
            "",
        ] {
            assert_eq!(Endpoint::classify(id), Endpoint::Subgraph(id.to_string()));
        }
    }

    #[test]
    fn test_classify_length_boundary() {
        // `Qm` plus 38 characters is exactly 40 long: still a subgraph id
        let forty = format!("Qm{}", "a".repeat(38));
        assert!(matches!(Endpoint::classify(forty), Endpoint::Subgraph(_)));

        let forty_one = format!("Qm{}", "a".repeat(39));
        assert!(matches!(Endpoint::classify(forty_one), Endpoint::Deployment(_)));
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        let id = format!("qm{}", "a".repeat(44));
        assert!(matches!(Endpoint::classify(id), Endpoint::Subgraph(_)));
    }

    #[test]
    fn test_classify_counts_characters_not_bytes() {
        // 20 two-byte characters: 42 bytes but only 22 characters
        let id = format!("Qm{}", "é".repeat(20));
        assert!(matches!(Endpoint::classify(id), Endpoint::Subgraph(_)));
    }

    #[test]
    fn test_accessors() {
        let endpoint = Endpoint::from("abc");
        assert_eq!(endpoint.id(), "abc");
        assert_eq!(endpoint.kind(), "subgraph");
        assert!(!endpoint.uses_bearer_auth());
        assert_eq!(endpoint.to_string(), "subgraph:abc");

        let endpoint = Endpoint::Deployment("Qm".to_string());
        assert_eq!(endpoint.kind(), "deployment");
        assert!(endpoint.uses_bearer_auth());
    }
}
