//! Generics resolver
//!
//! Resolution walks outward from a [`TypeContext`]: method-level generic
//! variables first, then the variables of the type the code belongs to,
//! including inherited ones.

use crate::definition::TypeDefinitionWithGenerics;
use crate::error::TypeError;
use crate::generics::GenericParameter;
use crate::ids::GenericOwner;
use crate::program::Program;
use crate::ty::{Type, TypeKind};

/// Constraint chains longer than this are treated as unresolvable
const MAX_CONSTRAINT_DEPTH: usize = 32;

/// Where a type occurs: the type a member is looked up on and, optionally,
/// the generic method being compiled or called
#[derive(Debug, Clone)]
pub struct TypeContext<'a> {
    /// Type on which the member is called, or whose body is compiled
    pub callee: Type,
    /// Generic variables of the method
    pub method_generics: &'a [GenericParameter],
    /// Arguments supplied for the method's generic variables, if known
    pub method_arguments: Option<&'a [Type]>,
}

impl<'a> TypeContext<'a> {
    /// Context of a type without a method
    pub fn new(callee: Type) -> Self {
        Self {
            callee,
            method_generics: &[],
            method_arguments: None,
        }
    }

    /// Same context inside a generic method
    pub fn with_method(mut self, generics: &'a [GenericParameter]) -> Self {
        self.method_generics = generics;
        self
    }

    /// Same context with concrete method generic arguments
    pub fn with_method_arguments(mut self, arguments: &'a [Type]) -> Self {
        self.method_arguments = Some(arguments);
        self
    }
}

impl Program {
    /// Definition behind a class or protocol type
    fn callee_owner(ty: &Type) -> Option<GenericOwner> {
        match ty.kind {
            TypeKind::Class { id, .. } => Some(GenericOwner::Class(id)),
            TypeKind::Protocol { id, .. } => Some(GenericOwner::Protocol(id)),
            _ => None,
        }
    }

    /// Resolve a generic variable by name. Method generics shadow the
    /// variables of the enclosing type.
    pub fn resolve_variable(
        &self,
        ctx: &TypeContext<'_>,
        name: &str,
        optional: bool,
    ) -> Result<Type, TypeError> {
        if let Some(position) = ctx.method_generics.iter().position(|g| g.name == name) {
            return Ok(Type::local_reference(position as u16).with_optional(optional));
        }
        Self::callee_owner(&ctx.callee)
            .and_then(|owner| self.generics_of(owner).fetch_variable(name, optional))
            .ok_or_else(|| TypeError::UnresolvedGenericVariable {
                name: name.to_string(),
            })
    }

    fn can_resolve(&self, callee: GenericOwner, constraint: GenericOwner) -> bool {
        match callee {
            GenericOwner::Class(id) => self.class(id).can_be_used_to_resolve(self, constraint),
            GenericOwner::Protocol(id) => self.protocol(id).can_be_used_to_resolve(self, constraint),
        }
    }

    /// Resolve `ty` as seen from `ctx`: generic references are replaced by
    /// the callee's (or method's) arguments where known, and 🐕 by the
    /// callee type. 🐕 on a protocol callee yields the protocol type tagged
    /// as self-referential.
    pub fn resolve_on(&self, ty: &Type, ctx: &TypeContext<'_>) -> Type {
        match &ty.kind {
            TypeKind::Reference { owner, index } => {
                let callee_args = ctx.callee.generic_arguments();
                let resolvable = Self::callee_owner(&ctx.callee)
                    .map_or(false, |callee| self.can_resolve(callee, *owner));
                match callee_args.get(*index as usize) {
                    Some(arg) if resolvable => {
                        let resolved = arg.clone();
                        let optional = resolved.optional || ty.optional;
                        resolved.with_optional(optional)
                    }
                    _ => ty.clone(),
                }
            }
            TypeKind::LocalReference(index) => {
                match ctx.method_arguments.and_then(|args| args.get(*index as usize)) {
                    Some(arg) => {
                        let optional = arg.optional || ty.optional;
                        arg.clone().with_optional(optional)
                    }
                    None => ty.clone(),
                }
            }
            TypeKind::SelfType => match &ctx.callee.kind {
                TypeKind::Class { .. } => ctx.callee.clone().with_optional(ty.optional),
                TypeKind::Protocol { id, args, .. } => Type {
                    kind: TypeKind::Protocol {
                        id: *id,
                        args: args.clone(),
                        self_referential: true,
                    },
                    optional: ty.optional,
                },
                _ => ty.clone(),
            },
            TypeKind::Class { id, args } => Type {
                kind: TypeKind::Class {
                    id: *id,
                    args: args.iter().map(|a| self.resolve_on(a, ctx)).collect(),
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
                    args: args.iter().map(|a| self.resolve_on(a, ctx)).collect(),
                    self_referential: *self_referential,
                },
                optional: ty.optional,
            },
            TypeKind::Callable { params, returns } => Type {
                kind: TypeKind::Callable {
                    params: params.iter().map(|p| self.resolve_on(p, ctx)).collect(),
                    returns: Box::new(self.resolve_on(returns, ctx)),
                },
                optional: ty.optional,
            },
            _ => ty.clone(),
        }
    }

    /// Follow generic references to their constraints until a type that is
    /// not a generic variable is reached. A constraint may itself refer to
    /// another variable.
    pub fn resolve_constraint(&self, ty: &Type, ctx: &TypeContext<'_>) -> Result<Type, TypeError> {
        let mut current = ty.clone();
        for _ in 0..MAX_CONSTRAINT_DEPTH {
            let next = match &current.kind {
                TypeKind::Reference { owner, index } => self
                    .generics_of(*owner)
                    .constraint(*index)
                    .cloned()
                    .or_else(|| self.inherited_constraint(*owner, *index)),
                TypeKind::LocalReference(index) => ctx
                    .method_generics
                    .get(*index as usize)
                    .map(|g| g.constraint.clone()),
                _ => return Ok(current),
            };
            match next {
                Some(constraint) => {
                    let optional = current.optional || constraint.optional;
                    current = constraint.with_optional(optional);
                }
                None => break,
            }
        }
        Err(TypeError::UnresolvedGenericVariable {
            name: format!("{}", self.display(ty)),
        })
    }

    /// Constraint of a slot that belongs to one of a class's ancestors
    fn inherited_constraint(&self, owner: GenericOwner, index: u16) -> Option<Type> {
        let GenericOwner::Class(class) = owner else {
            return None;
        };
        self.ancestors(class)
            .find_map(|ancestor| self.class(ancestor).generics.constraint(index).cloned())
    }
}
