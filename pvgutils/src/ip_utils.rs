use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Erreurs de parsing et de validation des adresses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid dotted-quad address: {0}")]
    InvalidAddress(String),
    #[error("Invalid address range: start {start} is greater than end {end}")]
    InvalidRange { start: Address, end: Address },
}

/// Adresse réseau de 32 bits, affichée en notation pointée.
///
/// La conversion numérique ↔ texte passe par [`std::net::Ipv4Addr`] et est
/// sans perte dans les deux sens : `Address::from_str(s).to_string() == s`
/// pour toute notation pointée valide.
///
/// # Examples
///
/// ```
/// use pvgutils::Address;
///
/// let addr = Address::from_u32(0x0A000001);
/// assert_eq!(addr.to_string(), "10.0.0.1");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(u32);

impl Address {
    /// Construit une adresse depuis sa valeur numérique.
    pub const fn from_u32(value: u32) -> Self {
        Address(value)
    }

    /// Valeur numérique de l'adresse.
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ipv4Addr::from(self.0).fmt(f)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv4Addr>()
            .map(|ip| Address(u32::from(ip)))
            .map_err(|_| AddressError::InvalidAddress(s.to_string()))
    }
}

impl From<Ipv4Addr> for Address {
    fn from(ip: Ipv4Addr) -> Self {
        Address(u32::from(ip))
    }
}

impl From<Address> for Ipv4Addr {
    fn from(addr: Address) -> Self {
        Ipv4Addr::from(addr.0)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

/// Bloc contigu d'adresses, borné par `start` et `end` (start ≤ end).
///
/// Le tirage aléatoire dans un bloc suit la convention demi-ouverte
/// `[start, end)` : `end` lui-même n'est jamais tiré, sauf pour le bloc
/// dégénéré `start == end` qui produit `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAddressRange")]
pub struct AddressRange {
    start: Address,
    end: Address,
}

/// Forme brute utilisée pour la désérialisation, avant validation.
#[derive(Deserialize)]
struct RawAddressRange {
    start: Address,
    end: Address,
}

impl TryFrom<RawAddressRange> for AddressRange {
    type Error = AddressError;

    fn try_from(raw: RawAddressRange) -> Result<Self, Self::Error> {
        AddressRange::new(raw.start, raw.end)
    }
}

impl AddressRange {
    /// Construit un bloc validé. Échoue si `start > end`.
    pub fn new(start: Address, end: Address) -> Result<Self, AddressError> {
        if start > end {
            return Err(AddressError::InvalidRange { start, end });
        }
        Ok(AddressRange { start, end })
    }

    pub fn start(&self) -> Address {
        self.start
    }

    pub fn end(&self) -> Address {
        self.end
    }

    /// Largeur du tirage demi-ouvert, soit `end - start`.
    pub fn span(&self) -> u32 {
        self.end.as_u32() - self.start.as_u32()
    }

    /// Teste l'appartenance selon la convention `[start, end)`.
    ///
    /// Le bloc dégénéré `start == end` contient uniquement `start`.
    pub fn contains(&self, addr: Address) -> bool {
        if self.span() == 0 {
            return addr == self.start;
        }
        addr >= self.start && addr < self.end
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip_from_text() {
        for s in ["0.0.0.0", "10.0.0.1", "154.16.255.255", "255.255.255.255"] {
            let addr: Address = s.parse().unwrap();
            assert_eq!(addr.to_string(), s, "text roundtrip should be lossless");
        }
    }

    #[test]
    fn test_address_roundtrip_from_numeric() {
        for value in [0u32, 1, 0x0A000001, 0x9A10FFFF, u32::MAX] {
            let addr = Address::from_u32(value);
            let reparsed: Address = addr.to_string().parse().unwrap();
            assert_eq!(reparsed.as_u32(), value, "numeric roundtrip should be lossless");
        }
    }

    #[test]
    fn test_address_rejects_malformed_input() {
        for s in ["", "10.0.0", "10.0.0.256", "a.b.c.d", "10.0.0.1.2"] {
            assert!(
                s.parse::<Address>().is_err(),
                "'{}' should not parse as an address",
                s
            );
        }
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let start = Address::from_u32(100);
        let end = Address::from_u32(10);
        assert_eq!(
            AddressRange::new(start, end),
            Err(AddressError::InvalidRange { start, end })
        );
    }

    #[test]
    fn test_range_contains_is_half_open() {
        let range = AddressRange::new(Address::from_u32(10), Address::from_u32(20)).unwrap();
        assert!(range.contains(Address::from_u32(10)));
        assert!(range.contains(Address::from_u32(19)));
        assert!(!range.contains(Address::from_u32(20)));
        assert!(!range.contains(Address::from_u32(9)));
    }

    #[test]
    fn test_degenerate_range_contains_start_only() {
        let range = AddressRange::new(Address::from_u32(42), Address::from_u32(42)).unwrap();
        assert_eq!(range.span(), 0);
        assert!(range.contains(Address::from_u32(42)));
        assert!(!range.contains(Address::from_u32(43)));
    }

    #[test]
    fn test_range_deserializes_from_dotted_quads() {
        let yaml = "start: \"10.0.0.0\"\nend: \"10.0.0.255\"\n";
        let range: AddressRange = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(range.start().to_string(), "10.0.0.0");
        assert_eq!(range.end().to_string(), "10.0.0.255");
    }

    #[test]
    fn test_range_deserialization_validates_bounds() {
        let yaml = "start: \"10.0.1.0\"\nend: \"10.0.0.0\"\n";
        assert!(serde_yaml::from_str::<AddressRange>(yaml).is_err());
    }
}
