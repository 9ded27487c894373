use std::fmt;

/// The two device collections served by the API.
///
/// Both share the same record shape and route layout, they differ in
/// their collection name and whether the `device` field is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Scd,
    Soil,
}

impl Resource {
    pub const ALL: [Resource; 2] = [Resource::Scd, Resource::Soil];

    /// First path segment of every route of this resource
    pub fn path(self) -> &'static str {
        match self {
            Resource::Scd => "scd",
            Resource::Soil => "soil",
        }
    }

    pub fn collection(self) -> &'static str {
        match self {
            Resource::Scd => "scd",
            Resource::Soil => "soil",
        }
    }

    pub fn unique_device(self) -> bool {
        matches!(self, Resource::Soil)
    }

    pub fn label(self) -> &'static str {
        match self {
            Resource::Scd => "SCD",
            Resource::Soil => "Soil",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Resource::Scd => "SCD Devices",
            Resource::Soil => "Soil Devices",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.path())
    }
}
