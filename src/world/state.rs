//! Block and fluid state identities reported by the world

use std::collections::BTreeMap;
use std::fmt;

/// Name of the empty block
pub const AIR: &str = "minecraft:air";

/// Block identity plus its variant properties (facing, half, ...)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockState {
    pub block: String,
    pub properties: BTreeMap<String, String>,
}

impl BlockState {
    /// Block state with no properties
    pub fn new(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            properties: BTreeMap::new(),
        }
    }

    /// The air block
    pub fn air() -> Self {
        Self::new(AIR)
    }

    /// Check if this is air
    pub fn is_air(&self) -> bool {
        self.block == AIR
    }

    /// Return a copy with a property set
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a property value
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl Default for BlockState {
    fn default() -> Self {
        Self::air()
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.block)?;
        if !self.properties.is_empty() {
            f.write_str("[")?;
            for (i, (k, v)) in self.properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{k}={v}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// Fluid occupying a block position
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FluidState {
    /// Fluid type, empty string for none
    pub fluid: String,
    /// Fluid height, 1-8 (8 = source/full)
    pub level: u8,
    /// Falling fluids render as full columns
    pub falling: bool,
}

impl FluidState {
    /// Create a still fluid of the given level
    pub fn new(fluid: impl Into<String>, level: u8) -> Self {
        Self {
            fluid: fluid.into(),
            level,
            falling: false,
        }
    }

    /// Source block of a fluid
    pub fn source(fluid: impl Into<String>) -> Self {
        Self::new(fluid, 8)
    }

    /// No fluid
    pub fn empty() -> Self {
        Self {
            fluid: String::new(),
            level: 0,
            falling: false,
        }
    }

    /// Check if no fluid is present
    pub fn is_empty(&self) -> bool {
        self.fluid.is_empty() || self.level == 0
    }

    /// Return a copy marked as falling
    pub fn falling(self) -> Self {
        Self { falling: true, ..self }
    }
}

impl Default for FluidState {
    fn default() -> Self {
        Self::empty()
    }
}
