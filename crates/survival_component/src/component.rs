//! Core [`Component`] trait and its type token.
//!
//! Every kind of data stored in the ECS implements [`Component`]. The world
//! keys its stores by [`ComponentTypeId`], which is derived from the
//! component's **string name** using FNV-1a 64. The name stays available for
//! logs and error messages while lookups stay integer-keyed.

/// A unique identifier for a component kind, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentTypeId`] from a component's name.
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// The [`ComponentTypeId`] of the component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

/// The core component trait.
///
/// Components must be `Send + Sync` because the world is moved into the
/// dedicated simulation task.
///
/// # Examples
///
/// ```rust
/// use survival_component::Component;
///
/// #[derive(Debug, Clone)]
/// struct Hunger(f32);
///
/// impl Component for Hunger {
///     fn type_name() -> &'static str { "Hunger" }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// A human-readable name for this component kind.
    fn type_name() -> &'static str;

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }
}
