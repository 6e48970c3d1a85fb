use std::fmt;
use std::marker::PhantomData;
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(PlantId);
entity_id!(LineId);
entity_id!(SubstationId);
entity_id!(NetworkId);
entity_id!(CustomerId);
entity_id!(MeterId);
entity_id!(ConsumptionId);
entity_id!(BillId);
entity_id!(MaintenanceId);
entity_id!(OutageId);

/// Hands out 1-based, strictly increasing ids for one entity type.
#[derive(Debug, Clone)]
pub struct IdSequence<T> {
    next: u64,
    _marker: PhantomData<T>,
}

impl<T: From<u64>> IdSequence<T> {
    pub fn new() -> Self {
        Self { next: 1, _marker: PhantomData }
    }

    pub fn next_id(&mut self) -> T {
        let id = self.next;
        self.next += 1;
        T::from(id)
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl<T: From<u64>> Default for IdSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}
