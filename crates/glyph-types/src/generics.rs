//! Generic parameter sets of classes and protocols
//!
//! A concrete instance of a generic class carries one slot per generic
//! variable of the class *and of all its superclasses*. Slots are laid out
//! with the superclass positions first, so a reference into a superclass's
//! variables keeps its index in every subclass. Own variables follow at
//! `supertype total + position`.

use crate::error::TypeError;
use crate::ids::GenericOwner;
use crate::ty::{Type, TypeKind};
use rustc_hash::FxHashMap;

/// One declared generic variable
#[derive(Debug, Clone, PartialEq)]
pub struct GenericParameter {
    /// Variable name
    pub name: String,
    /// Constraint every argument must be compatible with
    pub constraint: Type,
}

/// Link to the supertype's generics
#[derive(Debug, Clone)]
struct SupertypeLink {
    /// Supertype's total argument count
    total: u16,
    /// Arguments applied to the supertype, flattened to `total`
    arguments: Option<Vec<Type>>,
}

/// Generic parameter set attached to a class or protocol
#[derive(Debug, Clone)]
pub struct GenericParameters {
    owner: GenericOwner,
    own: Vec<GenericParameter>,
    supertype: Option<SupertypeLink>,
    /// Combined variable-name → type map, filled at finalization
    variables: FxHashMap<String, Type>,
    finalized: bool,
}

impl GenericParameters {
    /// Empty, unfinalized parameter set
    pub fn new(owner: GenericOwner) -> Self {
        Self {
            owner,
            own: Vec::new(),
            supertype: None,
            variables: FxHashMap::default(),
            finalized: false,
        }
    }

    /// Definition these parameters belong to
    pub fn owner(&self) -> GenericOwner {
        self.owner
    }

    /// Variables declared on the type itself
    pub fn own(&self) -> &[GenericParameter] {
        &self.own
    }

    /// Number of variables declared on the type itself
    pub fn own_count(&self) -> u16 {
        self.own.len() as u16
    }

    /// Number of slots taken by supertype arguments
    pub fn super_count(&self) -> u16 {
        self.supertype.as_ref().map_or(0, |link| link.total)
    }

    /// Total argument count including supertype arguments
    pub fn total_count(&self) -> u16 {
        self.super_count() + self.own_count()
    }

    /// Arguments applied to the supertype (flattened), if linked
    pub fn super_arguments(&self) -> &[Type] {
        self.supertype
            .as_ref()
            .and_then(|link| link.arguments.as_deref())
            .unwrap_or(&[])
    }

    /// Whether [`finalize`](Self::finalize) already ran
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Declare the supertype's slot count. Must precede own variables so
    /// their positions are stable.
    pub fn link_supertype(&mut self, owner_name: &str, supertype_total: u16) -> Result<(), TypeError> {
        if self.finalized {
            return Err(TypeError::GenericsAlreadyFinalized {
                owner: owner_name.to_string(),
            });
        }
        if !self.own.is_empty() {
            return Err(TypeError::SupertypeLinkedLate {
                owner: owner_name.to_string(),
            });
        }
        self.supertype = Some(SupertypeLink {
            total: supertype_total,
            arguments: None,
        });
        Ok(())
    }

    /// Set the (flattened) arguments applied to the supertype
    pub fn set_super_arguments(&mut self, owner_name: &str, arguments: Vec<Type>) -> Result<(), TypeError> {
        if self.finalized {
            return Err(TypeError::GenericsAlreadyFinalized {
                owner: owner_name.to_string(),
            });
        }
        match &mut self.supertype {
            Some(link) if link.total as usize == arguments.len() => {
                link.arguments = Some(arguments);
                Ok(())
            }
            Some(link) => Err(TypeError::GenericArgumentCount {
                name: owner_name.to_string(),
                expected: link.total as usize,
                actual: arguments.len(),
            }),
            None => Err(TypeError::SupertypeNotLinked {
                owner: owner_name.to_string(),
            }),
        }
    }

    /// Append an own generic variable, returning the reference type for it
    pub fn add(&mut self, owner_name: &str, name: &str, constraint: Type) -> Result<Type, TypeError> {
        if self.finalized {
            return Err(TypeError::GenericsAlreadyFinalized {
                owner: owner_name.to_string(),
            });
        }
        if self.own.iter().any(|p| p.name == name) {
            return Err(TypeError::DuplicateGenericName {
                name: name.to_string(),
                owner: owner_name.to_string(),
            });
        }
        let index = self.total_count();
        self.own.push(GenericParameter {
            name: name.to_string(),
            constraint,
        });
        Ok(Type::reference(self.owner, index))
    }

    /// Replace the constraint of an own variable. Constraints may name
    /// types declared later, so they are resolved after declaration.
    pub fn set_constraint(&mut self, position: usize, constraint: Type) {
        if let Some(param) = self.own.get_mut(position) {
            param.constraint = constraint;
        }
    }

    /// Fix the combined variable map. `inherited` is the supertype's
    /// combined map, required when a supertype is linked.
    pub fn finalize(
        &mut self,
        owner_name: &str,
        inherited: Option<&FxHashMap<String, Type>>,
    ) -> Result<(), TypeError> {
        if self.finalized {
            return Err(TypeError::GenericsAlreadyFinalized {
                owner: owner_name.to_string(),
            });
        }

        let mut variables = FxHashMap::default();
        if let Some(link) = &self.supertype {
            let arguments = link.arguments.as_ref().ok_or_else(|| TypeError::SupertypeNotLinked {
                owner: owner_name.to_string(),
            })?;
            if let Some(inherited) = inherited {
                for (name, ty) in inherited {
                    variables.insert(name.clone(), substitute_positions(ty, arguments));
                }
            }
        }

        let offset = self.super_count();
        for (position, param) in self.own.iter().enumerate() {
            variables.insert(
                param.name.clone(),
                Type::reference(self.owner, offset + position as u16),
            );
        }

        self.variables = variables;
        self.finalized = true;
        Ok(())
    }

    /// Combined variable map (empty before finalization)
    pub fn variables(&self) -> &FxHashMap<String, Type> {
        &self.variables
    }

    /// Look up a generic variable by name. Returns `None` rather than
    /// failing so callers can continue with an enclosing context.
    pub fn fetch_variable(&self, name: &str, optional: bool) -> Option<Type> {
        let found = if self.finalized {
            self.variables.get(name).cloned()
        } else {
            let offset = self.super_count();
            self.own
                .iter()
                .position(|p| p.name == name)
                .map(|position| Type::reference(self.owner, offset + position as u16))
        };
        found.map(|ty| if optional { ty.into_optional() } else { ty })
    }

    /// Constraint of an own variable by flattened position
    pub fn constraint(&self, index: u16) -> Option<&Type> {
        index
            .checked_sub(self.super_count())
            .and_then(|position| self.own.get(position as usize))
            .map(|p| &p.constraint)
    }

    /// Name of an own variable by flattened position
    pub fn variable_name(&self, index: u16) -> Option<&str> {
        index
            .checked_sub(self.super_count())
            .and_then(|position| self.own.get(position as usize))
            .map(|p| p.name.as_str())
    }
}

/// Replace every definition-level reference by the argument at its
/// position. Used to reinterpret a supertype's variables through the
/// arguments a subtype applied to it.
pub fn substitute_positions(ty: &Type, arguments: &[Type]) -> Type {
    match &ty.kind {
        TypeKind::Reference { index, .. } => match arguments.get(*index as usize) {
            Some(argument) => {
                let mut resolved = argument.clone();
                resolved.optional |= ty.optional;
                resolved
            }
            None => ty.clone(),
        },
        TypeKind::Class { id, args } => Type {
            kind: TypeKind::Class {
                id: *id,
                args: args.iter().map(|a| substitute_positions(a, arguments)).collect(),
            },
            optional: ty.optional,
        },
        TypeKind::Protocol {
            id,
            args,
            self_referential,
        } => Type {
            kind: TypeKind::Protocol {
                id: *id,
                args: args.iter().map(|a| substitute_positions(a, arguments)).collect(),
                self_referential: *self_referential,
            },
            optional: ty.optional,
        },
        TypeKind::Callable { params, returns } => Type {
            kind: TypeKind::Callable {
                params: params.iter().map(|p| substitute_positions(p, arguments)).collect(),
                returns: Box::new(substitute_positions(returns, arguments)),
            },
            optional: ty.optional,
        },
        _ => ty.clone(),
    }
}
