/// One requested feature: the route it is served under and the schema symbol
/// backing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureRequest {
    /// kebab-case, e.g. `top-tracks`
    pub route_name: String,
    /// camelCase, e.g. `topTracks`
    pub symbol_name: String,
}

impl FeatureRequest {
    pub fn new(route_name: impl Into<String>, symbol_name: impl Into<String>) -> Self {
        Self {
            route_name: route_name.into(),
            symbol_name: symbol_name.into(),
        }
    }
}
