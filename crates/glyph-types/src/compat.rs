//! Type compatibility
//!
//! `compatible(from, to)` holds when a value of type `from` may be used
//! where `to` is expected. Generic arguments are invariant; callables are
//! contravariant in their parameters and covariant in their return type.

use crate::program::Program;
use crate::resolve::TypeContext;
use crate::ty::{args_identical, Type, TypeKind};

impl Program {
    /// Whether a value of type `from` can be used where `to` is expected.
    /// 🐕 and generic variables are interpreted in `ctx`.
    pub fn compatible(&self, from: &Type, to: &Type, ctx: &TypeContext<'_>) -> bool {
        if matches!(to.kind, TypeKind::Something) {
            return true;
        }
        if from.optional && !to.optional {
            return false;
        }

        match (&from.kind, &to.kind) {
            (TypeKind::Nothingness, TypeKind::Nothingness) => true,
            (TypeKind::Nothingness, _) => to.optional,

            (TypeKind::SelfType, TypeKind::SelfType) => true,
            (TypeKind::SelfType, _) => match ctx.callee.kind {
                TypeKind::SelfType => false,
                _ => self.compatible(&ctx.callee.clone().with_optional(from.optional), to, ctx),
            },
            (_, TypeKind::SelfType) => match ctx.callee.kind {
                TypeKind::SelfType => false,
                _ => self.compatible(from, &ctx.callee.clone().with_optional(to.optional), ctx),
            },

            (
                TypeKind::Reference { owner: a, index: i },
                TypeKind::Reference { owner: b, index: j },
            ) if a == b && i == j => true,
            (TypeKind::LocalReference(i), TypeKind::LocalReference(j)) if i == j => true,
            (TypeKind::Reference { .. } | TypeKind::LocalReference(_), _) => {
                match self.resolve_constraint(from, ctx) {
                    Ok(constraint) => self.compatible(&constraint, to, ctx),
                    Err(_) => false,
                }
            }
            (_, TypeKind::Reference { .. } | TypeKind::LocalReference(_)) => false,

            (
                TypeKind::Class { .. } | TypeKind::Protocol { .. } | TypeKind::SomeObject,
                TypeKind::SomeObject,
            ) => true,

            (TypeKind::Class { id: a, args: from_args }, TypeKind::Class { id: b, args: to_args }) => {
                if !self.inherits_from(*a, *b) {
                    return false;
                }
                let prefix = &from_args[..to_args.len().min(from_args.len())];
                args_identical(prefix, to_args)
            }

            (
                TypeKind::Class { id: class, .. },
                TypeKind::Protocol {
                    id: protocol,
                    args: to_args,
                    self_referential,
                },
            ) => match self.conformance(*class, *protocol) {
                None => false,
                Some(_) if *self_referential => true,
                Some((_, conformance)) => {
                    let as_class = TypeContext::new(from.clone().with_optional(false));
                    let declared = self.resolve_on(&conformance.ty, &as_class);
                    args_identical(declared.generic_arguments(), to_args)
                }
            },

            (
                TypeKind::Protocol {
                    id: protocol,
                    self_referential: true,
                    ..
                },
                TypeKind::Class { id: class, .. },
            ) => self.conformance(*class, *protocol).is_some(),

            (
                TypeKind::Protocol {
                    id: a,
                    args: from_args,
                    self_referential: from_self,
                },
                TypeKind::Protocol {
                    id: b,
                    args: to_args,
                    self_referential: to_self,
                },
            ) => a == b && (*from_self || *to_self || args_identical(from_args, to_args)),

            (TypeKind::Enum(a), TypeKind::Enum(b)) => a == b,

            (
                TypeKind::Callable {
                    params: from_params,
                    returns: from_returns,
                },
                TypeKind::Callable {
                    params: to_params,
                    returns: to_returns,
                },
            ) => {
                from_params.len() == to_params.len()
                    && to_params
                        .iter()
                        .zip(from_params)
                        .all(|(t, f)| self.compatible(t, f, ctx))
                    && self.compatible(from_returns, to_returns, ctx)
            }

            (a, b) => a == b && is_primitive(a),
        }
    }
}

fn is_primitive(kind: &TypeKind) -> bool {
    matches!(
        kind,
        TypeKind::Integer
            | TypeKind::Double
            | TypeKind::Boolean
            | TypeKind::Symbol
            | TypeKind::SomeObject
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Conformance;
    use crate::ids::{ClassId, GenericOwner, PackageId};
    use crate::program::PackageVersion;

    struct Fixture {
        program: Program,
        animal: ClassId,
        dog: ClassId,
        stone: ClassId,
    }

    fn fixture() -> Fixture {
        let mut program = Program::new();
        let pkg: PackageId = program.add_package("_", PackageVersion::default(), false).unwrap();
        let animal = program.declare_class(pkg, "🐾", None, None, false).unwrap();
        let dog = program.declare_class(pkg, "🐶", None, None, false).unwrap();
        let stone = program.declare_class(pkg, "🪨", None, None, false).unwrap();
        program.set_superclass(dog, animal).unwrap();
        let eq = program.declare_protocol(pkg, "😛", None, None, false).unwrap();
        program
            .class_mut(animal)
            .add_conformance(Conformance {
                ty: Type::protocol(eq, vec![]),
                protocol: eq,
                vtis: Vec::new(),
                span: None,
            })
            .unwrap();
        Fixture {
            program,
            animal,
            dog,
            stone,
        }
    }

    #[test]
    fn test_subclass_to_superclass() {
        let f = fixture();
        let ctx = TypeContext::new(Type::class(f.dog, vec![]));
        let dog = Type::class(f.dog, vec![]);
        let animal = Type::class(f.animal, vec![]);
        assert!(f.program.compatible(&dog, &animal, &ctx));
        assert!(!f.program.compatible(&animal, &dog, &ctx));
        assert!(!f.program.compatible(&Type::class(f.stone, vec![]), &animal, &ctx));
    }

    #[test]
    fn test_optionality() {
        let f = fixture();
        let ctx = TypeContext::new(Type::class(f.dog, vec![]));
        let animal = Type::class(f.animal, vec![]);
        assert!(f.program.compatible(&animal, &animal.clone().into_optional(), &ctx));
        assert!(!f.program.compatible(&animal.clone().into_optional(), &animal, &ctx));
        assert!(f.program.compatible(&Type::nothingness(), &animal.clone().into_optional(), &ctx));
        assert!(!f.program.compatible(&Type::nothingness(), &animal, &ctx));
        assert!(f.program.compatible(&animal.into_optional(), &Type::something(), &ctx));
    }

    #[test]
    fn test_conformance_is_inherited() {
        let f = fixture();
        let ctx = TypeContext::new(Type::class(f.dog, vec![]));
        let eq = Type::protocol(crate::ids::ProtocolId(0), vec![]);
        assert!(f.program.compatible(&Type::class(f.dog, vec![]), &eq, &ctx));
        assert!(!f.program.compatible(&Type::class(f.stone, vec![]), &eq, &ctx));
    }

    #[test]
    fn test_self_compares_as_callee() {
        let f = fixture();
        let ctx = TypeContext::new(Type::class(f.dog, vec![]));
        let animal = Type::class(f.animal, vec![]);
        assert!(f.program.compatible(&Type::self_type(), &animal, &ctx));
        assert!(f.program.compatible(&Type::self_type(), &Type::self_type(), &ctx));
    }

    #[test]
    fn test_callable_variance() {
        let f = fixture();
        let ctx = TypeContext::new(Type::class(f.dog, vec![]));
        let dog = Type::class(f.dog, vec![]);
        let animal = Type::class(f.animal, vec![]);
        let takes_animal_gives_dog = Type::callable(vec![animal.clone()], dog.clone());
        let takes_dog_gives_animal = Type::callable(vec![dog], animal);
        assert!(f
            .program
            .compatible(&takes_animal_gives_dog, &takes_dog_gives_animal, &ctx));
        assert!(!f
            .program
            .compatible(&takes_dog_gives_animal, &takes_animal_gives_dog, &ctx));
    }

    #[test]
    fn test_generic_reference_uses_constraint() {
        let mut f = fixture();
        let animal_ty = Type::class(f.animal, vec![]);
        let holder = f.stone;
        let t = f
            .program
            .class_mut(holder)
            .generics
            .add("🪨", "T", animal_ty.clone())
            .unwrap();
        let ctx = TypeContext::new(f.program.class(holder).self_type());
        assert!(f.program.compatible(&t, &animal_ty, &ctx));
        assert!(f.program.compatible(&t, &t, &ctx));
        assert!(!f.program.compatible(&animal_ty, &t, &ctx));
        assert_eq!(t, Type::reference(GenericOwner::Class(holder), 0));
    }

    #[test]
    fn test_primitives() {
        let f = fixture();
        let ctx = TypeContext::new(Type::class(f.dog, vec![]));
        assert!(f.program.compatible(&Type::integer(), &Type::integer(), &ctx));
        assert!(!f.program.compatible(&Type::integer(), &Type::double(), &ctx));
        assert!(!f.program.compatible(&Type::integer(), &Type::some_object(), &ctx));
    }
}
