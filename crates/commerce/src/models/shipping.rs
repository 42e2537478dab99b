//! Shipping address snapshot attached to an order.

use serde::{Deserialize, Serialize};

use grove_core::CountryCode;

/// One component of a formatted address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressPart {
    City,
    Line1,
    Line2,
    PostalCode,
    State,
}

/// A physical address. Every field is optional; formatting skips what is
/// missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<CountryCode>,
}

impl Address {
    fn part(&self, part: AddressPart) -> Option<&str> {
        match part {
            AddressPart::City => self.city.as_deref(),
            AddressPart::Line1 => self.line1.as_deref(),
            AddressPart::Line2 => self.line2.as_deref(),
            AddressPart::PostalCode => self.postal_code.as_deref(),
            AddressPart::State => self.state.as_deref(),
        }
    }
}

/// Shipping destination snapshot captured at purchase time.
///
/// Equality between snapshots is [`Shipping::matches`], a fixed field subset,
/// rather than a derived `PartialEq` - stored snapshots may carry extraneous
/// fields that must not affect comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shipping {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

impl Shipping {
    /// Render the address for display, ordered per destination country.
    ///
    /// Japan orders postal code first; everywhere else leads with the
    /// recipient name.
    #[must_use]
    pub fn formatted(&self, country: CountryCode) -> String {
        match country {
            CountryCode::JP => self.join(&[
                AddressPart::PostalCode,
                AddressPart::State,
                AddressPart::City,
                AddressPart::Line1,
                AddressPart::Line2,
            ]),
            _ => {
                let mut parts = Vec::new();
                if let Some(name) = self.name.as_deref() {
                    parts.push(name);
                }
                let tail = [
                    AddressPart::Line1,
                    AddressPart::Line2,
                    AddressPart::City,
                    AddressPart::State,
                    AddressPart::PostalCode,
                ];
                if let Some(address) = self.address.as_ref() {
                    parts.extend(tail.iter().filter_map(|&p| address.part(p)));
                }
                parts.join(" ")
            }
        }
    }

    /// Render an arbitrary ordering of address components.
    #[must_use]
    pub fn format(&self, parts: &[AddressPart]) -> String {
        self.join(parts)
    }

    fn join(&self, parts: &[AddressPart]) -> String {
        let Some(address) = self.address.as_ref() else {
            return String::new();
        };
        parts
            .iter()
            .filter_map(|&p| address.part(p))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Tolerant equality over (name, phone, country, state, city, line1,
    /// line2) only.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        let a = self.address.as_ref();
        let b = other.address.as_ref();
        self.name == other.name
            && self.phone == other.phone
            && a.and_then(|x| x.country) == b.and_then(|x| x.country)
            && a.and_then(|x| x.state.as_deref()) == b.and_then(|x| x.state.as_deref())
            && a.and_then(|x| x.city.as_deref()) == b.and_then(|x| x.city.as_deref())
            && a.and_then(|x| x.line1.as_deref()) == b.and_then(|x| x.line1.as_deref())
            && a.and_then(|x| x.line2.as_deref()) == b.and_then(|x| x.line2.as_deref())
    }
}
