use super::FeatureRequest;

/// The fixed kinds of supporting file a project is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaffoldKind {
    ConnectionBootstrap,
    SchemaSync,
    SeedData,
    RouteHandler,
}

impl ScaffoldKind {
    pub fn label(self) -> &'static str {
        match self {
            ScaffoldKind::ConnectionBootstrap => "connection",
            ScaffoldKind::SchemaSync => "sync",
            ScaffoldKind::SeedData => "seed",
            ScaffoldKind::RouteHandler => "route",
        }
    }
}

/// One scaffold file that must exist after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldRequirement {
    ConnectionBootstrap,
    SchemaSync,
    SeedData,
    RouteHandler(FeatureRequest),
}

impl ScaffoldRequirement {
    pub fn kind(&self) -> ScaffoldKind {
        match self {
            ScaffoldRequirement::ConnectionBootstrap => ScaffoldKind::ConnectionBootstrap,
            ScaffoldRequirement::SchemaSync => ScaffoldKind::SchemaSync,
            ScaffoldRequirement::SeedData => ScaffoldKind::SeedData,
            ScaffoldRequirement::RouteHandler(_) => ScaffoldKind::RouteHandler,
        }
    }

    /// The full requirement list for a run: the three shared files, then one
    /// route handler per requested feature.
    pub fn for_features(features: &[FeatureRequest]) -> Vec<ScaffoldRequirement> {
        let mut out = vec![
            ScaffoldRequirement::ConnectionBootstrap,
            ScaffoldRequirement::SchemaSync,
            ScaffoldRequirement::SeedData,
        ];
        out.extend(features.iter().cloned().map(ScaffoldRequirement::RouteHandler));
        out
    }
}
