pub mod packed;
pub mod v1;

use crate::model::listing::place;
use crate::model::registry;

use bincode::Options;

pub use bincode::Error as SerializationError;

const MAGIC: &[u8] = b"pview";

#[derive(Debug, thiserror::Error)]
pub enum DeserializationError {
    #[error("not a saved view layout")]
    InvalidMagic,

    #[error("unsupported layout version {0}")]
    UnsupportedVersion(u16),

    #[error(transparent)]
    BincodeError(#[from] bincode::Error),
}

fn bincode_options() -> impl bincode::Options {
    bincode::DefaultOptions::new()
}

/// Saves the places of every open pseudocode view. Only unit addresses are
/// saved, never the grids themselves.
pub fn serialize_layout(places: &[place::GridPlace]) -> Result<Vec<u8>, SerializationError> {
    let mut vec: Vec<u8> = MAGIC.to_vec();
    vec.push(1); // version number MSB
    vec.push(0); // version number LSB

    vec.extend(bincode_options().serialize(&v1::Layout::from(places))?);

    Ok(vec)
}

/// Restores places saved by [serialize_layout], decompiling their units again
/// where the registry has no grid for them.
pub fn deserialize_layout(bytes: &[u8], registry: &registry::Registry, backend: &registry::Backend) -> Result<Vec<place::GridPlace>, DeserializationError> {
    let header = MAGIC.len() + 2;

    if bytes.len() < header || &bytes[0..MAGIC.len()] != MAGIC {
        return Err(DeserializationError::InvalidMagic);
    }

    let version = &bytes[MAGIC.len()..header];
    if version != [1, 0] {
        return Err(DeserializationError::UnsupportedVersion((version[0] as u16) << 8 | version[1] as u16));
    }

    let layout = bincode_options().deserialize::<v1::Layout>(&bytes[header..])?;
    Ok(layout.restore(registry, backend))
}
