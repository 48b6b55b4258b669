//! Arena con claves tipadas.
//!
//! Todas las entidades del grafo (puertos, grupos, operadores y unidades)
//! viven en arenas propiedad de `Graph`. Las referencias cruzadas (puerto ->
//! grupo, operador -> unidad padre, unidad -> operador dueño) son claves de
//! arena, nunca punteros: no hay ciclos de propiedad y una clave eliminada
//! simplemente deja de resolver.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Clave estable de una arena.
pub trait ArenaId: Copy + Eq {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u32);

        impl ArenaId for $name {
            #[inline]
            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Identificador de un puerto.
    PortId, "port");
arena_id!(
    /// Identificador de un grupo de puertos.
    GroupId, "group");
arena_id!(
    /// Identificador de un operador.
    OperatorId, "op");
arena_id!(
    /// Identificador de una unidad de ejecución.
    UnitId, "unit");
arena_id!(
    /// Identificador de un extensor de pares de puertos.
    PairId, "pair");

/// Arena append-only con borrado por tombstone. Los índices nunca se reutilizan.
pub struct Arena<K: ArenaId, T> {
    slots: Vec<Option<T>>,
    live: usize,
    _key: PhantomData<K>,
}

impl<K: ArenaId, T> Arena<K, T> {
    pub fn new() -> Self {
        Self { slots: Vec::new(),
               live: 0,
               _key: PhantomData }
    }

    /// Clave que recibirá el próximo `insert`.
    pub fn next_id(&self) -> K {
        K::from_index(self.slots.len())
    }

    pub fn insert(&mut self, value: T) -> K {
        let id = self.next_id();
        self.slots.push(Some(value));
        self.live += 1;
        id
    }

    pub fn get(&self, id: K) -> Option<&T> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: K) -> Option<&mut T> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn remove(&mut self, id: K) -> Option<T> {
        let removed = self.slots.get_mut(id.index()).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    pub fn contains(&self, id: K) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (K::from_index(i), v)))
    }

    pub fn ids(&self) -> Vec<K> {
        self.iter().map(|(id, _)| id).collect()
    }
}

impl<K: ArenaId, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self::new()
    }
}
