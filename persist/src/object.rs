//! The persistable-object facet and the host lookup that yields it.
//!
//! Use `#[derive(Persist)]` from [`persist_macro`] to implement [`Persist`];
//! mark members with `#[key(..)]` and declare accessor pairs with
//! `#[property(..)]`.

use std::any::{Any, TypeId};

use crate::member::MemberSet;

/// An object with persisted members.
///
/// The trait is object-safe so hosts can hand out `&dyn Persist` facets.
///
/// # Deriving
///
/// ```ignore
/// #[derive(Default, Persist)]
/// #[property(name = "label", ty = String, get = label, set = set_label, key(4, "label"))]
/// struct Emitter {
///     #[key(0)]
///     rate: f32,
///     #[key(1, "burst")]
///     burst: u32,
///     cached_label: String,
/// }
/// ```
///
/// # Manual implementation
///
/// ```ignore
/// impl Persist for Emitter {
///     fn describe() -> PersistType {
///         PersistType::new::<Self>("Emitter", |members| {
///             members.field::<Self, f32>("rate", KeySpec::index(0), |e| &e.rate, |e| &mut e.rate);
///         })
///     }
///     fn persist_type(&self) -> PersistType { Self::describe() }
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
/// ```
pub trait Persist: Any + Send + Sync {
    /// Static description of the implementing type.
    fn describe() -> PersistType
    where
        Self: Sized;

    /// Description of the concrete type behind this facet.
    fn persist_type(&self) -> PersistType;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Runtime handle for a [`Persist`] type: identity plus the member
/// declaration function run once per registry.
#[derive(Clone, Copy, Debug)]
pub struct PersistType {
    id: TypeId,
    name: &'static str,
    declare: fn(&mut MemberSet),
}

impl PersistType {
    pub fn new<T: Persist>(name: &'static str, declare: fn(&mut MemberSet)) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
            declare,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn declare(&self, members: &mut MemberSet) {
        (self.declare)(members)
    }
}

/// Host-side lookup of the persistable facet of a container (an entity, a
/// scene node, a plugin object).
///
/// Hosts decide which object answers; a common choice is the container's own
/// facet, falling back to the first child that has one.
pub trait FacetHost {
    fn find_serializable_facet(&self) -> Option<&dyn Persist>;

    fn find_serializable_facet_mut(&mut self) -> Option<&mut dyn Persist>;
}
