use slotmap::new_key_type;

new_key_type! {
    /// Identifies a process (ship, repair crew, or generator) in the
    /// simulation context.
    pub struct ProcessId;

    /// Identifies a lock chamber (an exclusive resource).
    pub struct LockId;
}

/// Which ocean a ship comes from. Also names the two wait queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Atlantic,
    Pacific,
}

impl Side {
    /// The side a transiting ship exits on.
    pub fn opposite(self) -> Side {
        match self {
            Side::Atlantic => Side::Pacific,
            Side::Pacific => Side::Atlantic,
        }
    }
}

/// Ship size class. Determines cargo accounting and which generator
/// produced the ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ShipClass {
    /// Classic Panamax vessel; cargo counted in tonnage.
    Panamax,
    /// Neopanamax vessel; cargo counted in TEU.
    Neopanamax,
}
