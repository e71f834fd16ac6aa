//! Metadata serializer
//!
//! Writes a linked [`Program`] in the fixed binary layout the runtime
//! loads. Field order and widths are part of the format:
//!
//! ```text
//! u8  format version
//! u16 class count
//! u8  package count
//! per package:
//!     name, u16 major, u16 minor, u8 requires binary
//!     per class: 0x01, class record
//!     0x00
//! literal pool
//! u16 entry-point class index, u16 entry-point VTI
//! ```

use glyph_types::program::ENTRY_POINT_NAME;
use glyph_types::{Body, Class, ClassId, Member, MemberKind, PackageId, Program, Type, TypeKind};
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span, trace};

use crate::encoder::{fit_u16, MetadataWriter};
use crate::error::SerializeError;
use crate::strings::LiteralPool;

/// Format version written when none is configured
pub const DEFAULT_VERSION: u8 = 3;

/// Most packages a metadata image can carry
pub const MAX_PACKAGES: usize = 253;

/// Precedes every class record in a package's class list
pub const CLASS_CONTINUATION: u8 = 0x01;

/// Ends a package's class list
pub const CLASS_LIST_END: u8 = 0x00;

/// Member flag bits
pub mod flags {
    /// Cannot be overridden
    pub const FINAL: u8 = 1 << 0;
    /// Overrides a superclass member
    pub const OVERRIDE: u8 = 1 << 1;
    /// Implemented in the package's native binary
    pub const NATIVE: u8 = 1 << 2;
    /// Required initializer
    pub const REQUIRED: u8 = 1 << 3;
    /// Initializer that may produce ✨
    pub const CAN_RETURN_NOTHING: u8 = 1 << 4;
    /// Deprecated member
    pub const DEPRECATED: u8 = 1 << 5;
}

/// Type record tags
pub mod tags {
    #![allow(missing_docs)]
    pub const INTEGER: u8 = 0;
    pub const DOUBLE: u8 = 1;
    pub const BOOLEAN: u8 = 2;
    pub const SYMBOL: u8 = 3;
    pub const NOTHINGNESS: u8 = 4;
    pub const SOMETHING: u8 = 5;
    pub const SOME_OBJECT: u8 = 6;
    pub const SELF: u8 = 7;
    pub const CLASS: u8 = 8;
    pub const PROTOCOL: u8 = 9;
    pub const ENUM: u8 = 10;
    pub const REFERENCE: u8 = 11;
    pub const LOCAL_REFERENCE: u8 = 12;
    pub const CALLABLE: u8 = 13;
}

/// Serializer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Format version byte
    pub version: u8,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
        }
    }
}

/// Flag byte of a member record
pub fn member_flags(member: &Member) -> u8 {
    let mut bits = 0;
    if member.is_final {
        bits |= flags::FINAL;
    }
    if member.is_override {
        bits |= flags::OVERRIDE;
    }
    if member.body.is_native() {
        bits |= flags::NATIVE;
    }
    if member.required {
        bits |= flags::REQUIRED;
    }
    if member.can_return_nothing {
        bits |= flags::CAN_RETURN_NOTHING;
    }
    if member.deprecated {
        bits |= flags::DEPRECATED;
    }
    bits
}

/// Serialize a linked program
pub fn serialize(program: &Program, options: &SerializeOptions) -> Result<Vec<u8>, SerializeError> {
    let _span = debug_span!("serialize", version = options.version).entered();

    let entry = program.entry_point().ok_or(SerializeError::MissingEntryPoint)?;
    let entry_vti = program
        .entry_point_vti()
        .ok_or_else(|| SerializeError::UnassignedVti {
            class: program.class(entry.class).name.clone(),
            member: ENTRY_POINT_NAME.to_string(),
        })?;

    let layout = Layout::new(program)?;
    let mut serializer = Serializer {
        program,
        layout: &layout,
        pool: LiteralPool::new(),
        writer: MetadataWriter::with_capacity(4096),
    };
    serializer.program_header(options)?;
    for (package, classes) in &layout.packages {
        serializer.package(*package, classes)?;
    }

    let Serializer {
        pool, mut writer, ..
    } = serializer;
    pool.encode(&mut writer)?;
    writer.emit_u16(layout.index_of(program, entry.class)?);
    writer.emit_u16(entry_vti);

    debug!(
        bytes = writer.offset(),
        classes = layout.indices.len(),
        literals = pool.len(),
        "serialized program"
    );
    Ok(writer.into_bytes())
}

/// Class order and dense class indices
struct Layout {
    packages: Vec<(PackageId, Vec<ClassId>)>,
    indices: FxHashMap<ClassId, u16>,
}

impl Layout {
    /// Classes are grouped by package in load order, each package's classes
    /// in declaration order.
    fn new(program: &Program) -> Result<Self, SerializeError> {
        if program.packages().len() > MAX_PACKAGES {
            return Err(SerializeError::LimitExceeded {
                what: "packages",
                limit: MAX_PACKAGES,
                actual: program.packages().len(),
            });
        }
        let packages: Vec<(PackageId, Vec<ClassId>)> = program
            .packages()
            .iter()
            .map(|p| (p.id, p.classes.clone()))
            .collect();

        let mut indices = FxHashMap::default();
        for class in packages.iter().flat_map(|(_, classes)| classes) {
            let index = fit_u16("classes", indices.len())?;
            indices.insert(*class, index);
        }
        Ok(Self { packages, indices })
    }

    fn index_of(&self, program: &Program, class: ClassId) -> Result<u16, SerializeError> {
        self.indices
            .get(&class)
            .copied()
            .ok_or_else(|| SerializeError::MissingClass {
                class: program.class(class).name.clone(),
            })
    }
}

struct Serializer<'p> {
    program: &'p Program,
    layout: &'p Layout,
    pool: LiteralPool,
    writer: MetadataWriter,
}

impl<'p> Serializer<'p> {
    fn program_header(&mut self, options: &SerializeOptions) -> Result<(), SerializeError> {
        self.writer.emit_u8(options.version);
        self.writer.emit_count_u16("classes", self.layout.indices.len())?;
        self.writer.emit_count_u8("packages", self.layout.packages.len())
    }

    fn package(&mut self, id: PackageId, classes: &[ClassId]) -> Result<(), SerializeError> {
        let program = self.program;
        let package = program.package(id);
        self.writer.emit_package_name(&package.name)?;
        self.writer.emit_u16(package.version.major);
        self.writer.emit_u16(package.version.minor);
        self.writer.emit_bool(package.requires_binary);
        for &class in classes {
            self.writer.emit_u8(CLASS_CONTINUATION);
            self.class(class)?;
        }
        self.writer.emit_u8(CLASS_LIST_END);
        debug!(package = %package.name, classes = classes.len(), "package written");
        Ok(())
    }

    fn class(&mut self, id: ClassId) -> Result<(), SerializeError> {
        let program = self.program;
        let class = program.class(id);
        if !class.link.assigned || (!class.conformances.is_empty() && !class.link.conformance_checked) {
            return Err(SerializeError::UnlinkedClass {
                class: class.name.clone(),
            });
        }
        let start = self.writer.offset();

        self.writer.emit_string(&class.name)?;
        let inherit_from = program.superclass(id).unwrap_or(id);
        self.writer.emit_u16(self.layout.index_of(program, inherit_from)?);
        let link = &class.link;
        self.writer.emit_u16(link.instance_variable_total);
        self.writer.emit_u16(link.next_method_vti);
        self.writer.emit_u16(link.next_type_method_vti);
        self.writer.emit_bool(link.inherits_initializers);
        self.writer.emit_u16(link.next_initializer_vti);

        self.writer.emit_count_u16("methods", class.methods.len())?;
        self.writer.emit_count_u16("initializers", class.initializers.len())?;
        self.writer.emit_count_u16("type methods", class.type_methods.len())?;
        for kind in [MemberKind::Method, MemberKind::Initializer, MemberKind::TypeMethod] {
            for member in class.table(kind).iter() {
                self.member(class, member)?;
            }
        }

        self.conformances(class)?;
        trace!(class = %class.name, bytes = self.writer.offset() - start, "class written");
        Ok(())
    }

    fn conformances(&mut self, class: &Class) -> Result<(), SerializeError> {
        self.writer.emit_count_u16("conformances", class.conformances.len())?;
        let Some((min, max)) = class.protocol_index_range() else {
            return Ok(());
        };
        self.writer.emit_u16(fit_u16("protocols", min as usize)?);
        self.writer.emit_u16(fit_u16("protocols", max as usize)?);
        for conformance in &class.conformances {
            self.writer
                .emit_u16(fit_u16("protocols", conformance.protocol.index())?);
            self.writer
                .emit_count_u16("protocol methods", conformance.vtis.len())?;
            for vti in &conformance.vtis {
                self.writer.emit_u16(*vti);
            }
        }
        Ok(())
    }

    fn member(&mut self, class: &Class, member: &Member) -> Result<(), SerializeError> {
        let vti = member.vti.ok_or_else(|| SerializeError::UnassignedVti {
            class: class.name.clone(),
            member: member.name.clone(),
        })?;
        self.writer.emit_string(&member.name)?;
        self.writer.emit_u16(vti);
        self.writer.emit_u8(member.access.to_u8());
        self.writer.emit_u8(member_flags(member));

        self.writer.emit_count_u8("arguments", member.arguments.len())?;
        for ty in member.argument_types() {
            self.ty(ty)?;
        }
        if member.kind == MemberKind::Initializer {
            self.ty(&class.self_type().with_optional(member.can_return_nothing))?;
        } else {
            self.ty(&member.return_type)?;
        }

        match &member.body {
            Body::Native => {}
            Body::Code {
                locals,
                code,
                literals,
            } => {
                self.writer.emit_u16(*locals);
                let length = u32::try_from(code.len()).map_err(|_| SerializeError::LimitExceeded {
                    what: "code bytes",
                    limit: u32::MAX as usize,
                    actual: code.len(),
                })?;
                self.writer.emit_u32(length);
                self.writer.emit_bytes(code);
                self.writer.emit_count_u16("literals", literals.len())?;
                for literal in literals {
                    let index = self.pool.intern(literal)?;
                    self.writer.emit_u16(index);
                }
            }
            Body::Abstract => {
                self.writer.emit_u16(0);
                self.writer.emit_u32(0);
                self.writer.emit_u16(0);
            }
        }
        Ok(())
    }

    fn ty(&mut self, ty: &Type) -> Result<(), SerializeError> {
        let tag = match &ty.kind {
            TypeKind::Integer => tags::INTEGER,
            TypeKind::Double => tags::DOUBLE,
            TypeKind::Boolean => tags::BOOLEAN,
            TypeKind::Symbol => tags::SYMBOL,
            TypeKind::Nothingness => tags::NOTHINGNESS,
            TypeKind::Something => tags::SOMETHING,
            TypeKind::SomeObject => tags::SOME_OBJECT,
            TypeKind::SelfType => tags::SELF,
            TypeKind::Class { .. } => tags::CLASS,
            TypeKind::Protocol { .. } => tags::PROTOCOL,
            TypeKind::Enum(_) => tags::ENUM,
            TypeKind::Reference { .. } => tags::REFERENCE,
            TypeKind::LocalReference(_) => tags::LOCAL_REFERENCE,
            TypeKind::Callable { .. } => tags::CALLABLE,
        };
        self.writer.emit_u8(tag);
        self.writer.emit_bool(ty.optional);

        match &ty.kind {
            TypeKind::Class { id, args } => {
                let index = self.layout.index_of(self.program, *id)?;
                self.writer.emit_u16(index);
                self.type_list("generic arguments", args)?;
            }
            TypeKind::Protocol { id, args, .. } => {
                self.writer.emit_u16(fit_u16("protocols", id.index())?);
                self.type_list("generic arguments", args)?;
            }
            TypeKind::Enum(id) => self.writer.emit_u16(fit_u16("enums", id.index())?),
            TypeKind::Reference { index, .. } | TypeKind::LocalReference(index) => {
                self.writer.emit_u16(*index)
            }
            TypeKind::Callable { params, returns } => {
                self.type_list("callable parameters", params)?;
                self.ty(returns)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn type_list(&mut self, what: &'static str, types: &[Type]) -> Result<(), SerializeError> {
        self.writer.emit_count_u8(what, types.len())?;
        for ty in types {
            self.ty(ty)?;
        }
        Ok(())
    }
}
