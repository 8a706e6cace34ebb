/// Primitives d'adressage pour PVGrid.
///
/// Ce module fournit les types de base manipulés par le pool d'adresses :
/// [`Address`] (valeur 32 bits affichée en notation pointée) et
/// [`AddressRange`] (bloc contigu d'adresses).
///
/// # Examples
///
/// ```
/// use pvgutils::Address;
///
/// let addr: Address = "154.16.0.1".parse().unwrap();
/// assert_eq!(addr.to_string(), "154.16.0.1");
/// ```
mod ip_utils;

pub use ip_utils::{Address, AddressError, AddressRange};
