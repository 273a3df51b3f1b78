//! Named, bounded tunables.
//!
//! Components expose their tuning knobs through [`Properties`] so that front ends can list and
//! override them by name without knowing the concrete configuration layout.

use anyhow::{anyhow, Result};

/// Object with custom properties.
pub trait Properties {
    /// Get available properties.
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut<'_>)> {
        vec![]
    }

    /// Snapshot of the current property values.
    fn props(&mut self) -> Vec<(&str, Property)> {
        self.props_mut()
            .into_iter()
            .map(|(n, p)| (n, p.into()))
            .collect()
    }

    /// Parse and assign a property by its name.
    ///
    /// Names are matched case-insensitively. The parsed value is clamped to the property's
    /// bounds.
    ///
    /// # Arguments
    ///
    /// * `name` - name of the property, as listed by `props_mut`.
    /// * `value` - textual value to parse.
    fn set_prop(&mut self, name: &str, value: &str) -> Result<()> {
        let (_, mut prop) = self
            .props_mut()
            .into_iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| anyhow!("Unknown property: {name}"))?;

        prop.parse_set(value)
    }
}

/// Property with a lower and upper bound.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct BoundedProp<T> {
    pub val: T,
    pub min: T,
    pub max: T,
}

impl<'a, T: Copy> From<BoundedPropMut<'a, T>> for BoundedProp<T> {
    fn from(BoundedPropMut { val, min, max }: BoundedPropMut<'a, T>) -> Self {
        Self {
            val: *val,
            min,
            max,
        }
    }
}

/// Describes the type of a property.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum Property {
    Float(BoundedProp<f32>),
    Double(BoundedProp<f64>),
    Usize(BoundedProp<usize>),
}

impl<'a> From<PropertyMut<'a>> for Property {
    fn from(prop: PropertyMut<'a>) -> Self {
        match prop {
            PropertyMut::Float(p) => Self::Float(p.into()),
            PropertyMut::Double(p) => Self::Double(p.into()),
            PropertyMut::Usize(p) => Self::Usize(p.into()),
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Float(p) => write!(f, "{} [{}; {}]", p.val, p.min, p.max),
            Self::Double(p) => write!(f, "{} [{}; {}]", p.val, p.min, p.max),
            Self::Usize(p) => write!(f, "{} [{}; {}]", p.val, p.min, p.max),
        }
    }
}

/// Property with a lower and upper bound.
pub struct BoundedPropMut<'a, T> {
    pub val: &'a mut T,
    pub min: T,
    pub max: T,
}

impl<'a, T: PartialOrd + Copy> BoundedPropMut<'a, T> {
    /// Clamp the underlying value between the lower and upper bounds.
    pub fn clamp(&mut self) {
        *self.val = clamp(*self.val, self.min, self.max);
    }
}

/// Describes the type of a property.
pub enum PropertyMut<'a> {
    Float(BoundedPropMut<'a, f32>),
    Double(BoundedPropMut<'a, f64>),
    Usize(BoundedPropMut<'a, usize>),
}

impl<'a> PropertyMut<'a> {
    /// Create a single precision floating point property.
    ///
    /// # Arguments
    ///
    /// * `val` - reference to the underlying float to be mutated.
    /// * `min` - lowest value for the property.
    /// * `max` - highest value for the property.
    pub fn float(val: &'a mut f32, min: f32, max: f32) -> Self {
        Self::Float(BoundedPropMut { val, min, max })
    }

    /// Create a double precision floating point property.
    ///
    /// Used for anything measured in timestamp units.
    pub fn double(val: &'a mut f64, min: f64, max: f64) -> Self {
        Self::Double(BoundedPropMut { val, min, max })
    }

    /// Create an integer property.
    ///
    /// # Arguments
    ///
    /// * `val` - reference to the underlying usize to be mutated.
    /// * `min` - lowest value for the property.
    /// * `max` - highest value for the property.
    pub fn usize(val: &'a mut usize, min: usize, max: usize) -> Self {
        Self::Usize(BoundedPropMut { val, min, max })
    }

    /// Parse a textual value into the property and clamp it to bounds.
    pub fn parse_set(&mut self, value: &str) -> Result<()> {
        let value = value.trim();

        match self {
            Self::Float(p) => {
                *p.val = value.parse()?;
                p.clamp();
            }
            Self::Double(p) => {
                *p.val = value.parse()?;
                p.clamp();
            }
            Self::Usize(p) => {
                *p.val = value.parse()?;
                p.clamp();
            }
        }

        Ok(())
    }
}

fn clamp<T: PartialOrd + Copy>(val: T, min: T, max: T) -> T {
    if val < min {
        min
    } else if val > max {
        max
    } else {
        val
    }
}
