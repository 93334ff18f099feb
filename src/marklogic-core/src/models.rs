use std::fmt;

pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_RDF_XML: &str = "application/rdf+xml";
pub const CONTENT_TYPE_TURTLE: &str = "text/turtle";

/// REST collection a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Documents,
    Graphs,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Documents => "documents",
            Collection::Graphs => "graphs",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graph that triples are merged into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphTarget {
    /// The server's unnamed default graph
    Default,
    Named(String),
}

impl GraphTarget {
    /// Query parameter identifying this graph.
    ///
    /// The default graph is selected by a `default` key with an empty value,
    /// never omitted and never `default=true`.
    pub fn query_param(&self) -> (&'static str, &str) {
        match self {
            GraphTarget::Default => ("default", ""),
            GraphTarget::Named(uri) => ("graph", uri.as_str()),
        }
    }
}

impl From<Option<&str>> for GraphTarget {
    fn from(graph_uri: Option<&str>) -> Self {
        match graph_uri {
            Some(uri) => GraphTarget::Named(uri.to_string()),
            None => GraphTarget::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_path_segment() {
        assert_eq!(Collection::Documents.to_string(), "documents");
        assert_eq!(Collection::Graphs.as_str(), "graphs");
    }

    #[test]
    fn test_default_graph_param() {
        let target = GraphTarget::from(None);
        assert_eq!(target, GraphTarget::Default);
        assert_eq!(target.query_param(), ("default", ""));
    }

    #[test]
    fn test_named_graph_param() {
        let target = GraphTarget::from(Some("http://example.org/inventory"));
        assert_eq!(
            target.query_param(),
            ("graph", "http://example.org/inventory")
        );
    }
}
