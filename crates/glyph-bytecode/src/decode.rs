//! Metadata image decoding
//!
//! Reads the layout written by [`crate::serialize`] back into plain data,
//! for inspection and tests.

use std::fmt;

use glyph_types::{AccessLevel, PackageVersion};
use serde::Serialize;

use crate::encoder::MetadataReader;
use crate::error::DecodeError;
use crate::metadata::{flags, tags, CLASS_CONTINUATION, CLASS_LIST_END};
use crate::strings::LiteralPool;

/// Decoded metadata stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataImage {
    /// Format version byte
    pub version: u8,
    /// Class count from the header
    pub class_count: u16,
    /// Packages in load order
    pub packages: Vec<PackageImage>,
    /// Literal pool; entry 0 is the empty string
    pub literals: Vec<String>,
    /// Entry-point class index
    pub entry_class: u16,
    /// Entry-point type-method VTI
    pub entry_vti: u16,
}

/// One package and its classes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageImage {
    /// Package name
    pub name: String,
    /// Package version
    pub version: PackageVersion,
    /// Whether a native binary must be loaded
    pub requires_binary: bool,
    /// Class records in stream order
    pub classes: Vec<ClassImage>,
}

/// One class record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassImage {
    /// Class name
    pub name: String,
    /// Superclass index, or the class's own index for a root class
    pub inherit_from: u16,
    /// Instance variables including inherited ones
    pub instance_variables: u16,
    /// Method table size
    pub method_table: u16,
    /// Type-method table size
    pub type_method_table: u16,
    /// Reuses the superclass's initializer table
    pub inherits_initializers: bool,
    /// Initializer table size
    pub initializer_table: u16,
    /// Own methods
    pub methods: Vec<MemberImage>,
    /// Own initializers
    pub initializers: Vec<MemberImage>,
    /// Own type methods
    pub type_methods: Vec<MemberImage>,
    /// Smallest and largest protocol index conformed to
    pub protocol_range: Option<(u16, u16)>,
    /// Protocol dispatch tables
    pub conformances: Vec<ConformanceImage>,
}

/// Protocol dispatch table of a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConformanceImage {
    /// Protocol index
    pub protocol: u16,
    /// Method VTIs in protocol declaration order
    pub vtis: Vec<u16>,
}

/// One member record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberImage {
    /// Member name
    pub name: String,
    /// Slot
    pub vti: u16,
    /// Access level
    pub access: AccessLevel,
    /// Flag bits, see [`flags`]
    pub flags: u8,
    /// Argument types
    pub arguments: Vec<TypeImage>,
    /// Return type
    pub return_type: TypeImage,
    /// Body, absent for native members
    pub body: Option<BodyImage>,
}

impl MemberImage {
    /// Whether the flag bit is set
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

/// Compiled body of a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyImage {
    /// Local variable slots
    pub locals: u16,
    /// Instruction bytes
    pub code: Vec<u8>,
    /// Literal pool indices
    pub literals: Vec<u16>,
}

/// Decoded type record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeImage {
    /// Primitive or marker type, by tag
    Simple {
        /// Type tag
        tag: u8,
        /// Optional
        optional: bool,
    },
    /// Class instance
    Class {
        /// Class index
        index: u16,
        /// Generic arguments
        args: Vec<TypeImage>,
        /// Optional
        optional: bool,
    },
    /// Protocol value
    Protocol {
        /// Protocol index
        index: u16,
        /// Generic arguments
        args: Vec<TypeImage>,
        /// Optional
        optional: bool,
    },
    /// Enum value
    Enum {
        /// Enum index
        index: u16,
        /// Optional
        optional: bool,
    },
    /// Generic variable of the type definition
    Reference {
        /// Flattened position
        index: u16,
        /// Optional
        optional: bool,
    },
    /// Generic variable of the method
    LocalReference {
        /// Position
        index: u16,
        /// Optional
        optional: bool,
    },
    /// Closure
    Callable {
        /// Parameter types
        params: Vec<TypeImage>,
        /// Return type
        returns: Box<TypeImage>,
        /// Optional
        optional: bool,
    },
}

impl MetadataImage {
    /// Decode a complete metadata stream
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = MetadataReader::new(bytes);
        let version = reader.read_u8()?;
        let class_count = reader.read_u16()?;
        let package_count = reader.read_u8()? as usize;

        let mut packages = Vec::with_capacity(package_count);
        for _ in 0..package_count {
            packages.push(decode_package(&mut reader)?);
        }
        let found: usize = packages.iter().map(|p| p.classes.len()).sum();
        if found != class_count as usize {
            return Err(DecodeError::ClassCountMismatch {
                declared: class_count,
                found,
            });
        }

        let literals = LiteralPool::decode(&mut reader)?;
        let entry_class = reader.read_u16()?;
        let entry_vti = reader.read_u16()?;
        if reader.has_more() {
            return Err(DecodeError::TrailingBytes(reader.remaining()));
        }

        Ok(Self {
            version,
            class_count,
            packages,
            literals,
            entry_class,
            entry_vti,
        })
    }

    /// Every class record in index order
    pub fn classes(&self) -> impl Iterator<Item = &ClassImage> {
        self.packages.iter().flat_map(|p| p.classes.iter())
    }

    /// Class record by index
    pub fn class(&self, index: u16) -> Option<&ClassImage> {
        self.classes().nth(index as usize)
    }

    /// Class record by name
    pub fn class_named(&self, name: &str) -> Option<&ClassImage> {
        self.classes().find(|c| c.name == name)
    }
}

fn decode_package(reader: &mut MetadataReader<'_>) -> Result<PackageImage, DecodeError> {
    let name = reader.read_package_name()?;
    let version = PackageVersion {
        major: reader.read_u16()?,
        minor: reader.read_u16()?,
    };
    let requires_binary = reader.read_bool()?;

    let mut classes = Vec::new();
    loop {
        let offset = reader.position();
        match reader.read_u8()? {
            CLASS_CONTINUATION => classes.push(decode_class(reader)?),
            CLASS_LIST_END => break,
            byte => return Err(DecodeError::InvalidMarker { byte, offset }),
        }
    }
    Ok(PackageImage {
        name,
        version,
        requires_binary,
        classes,
    })
}

fn decode_class(reader: &mut MetadataReader<'_>) -> Result<ClassImage, DecodeError> {
    let name = reader.read_string()?;
    let inherit_from = reader.read_u16()?;
    let instance_variables = reader.read_u16()?;
    let method_table = reader.read_u16()?;
    let type_method_table = reader.read_u16()?;
    let inherits_initializers = reader.read_bool()?;
    let initializer_table = reader.read_u16()?;

    let method_count = reader.read_u16()?;
    let initializer_count = reader.read_u16()?;
    let type_method_count = reader.read_u16()?;
    let methods = decode_members(reader, method_count)?;
    let initializers = decode_members(reader, initializer_count)?;
    let type_methods = decode_members(reader, type_method_count)?;

    let conformance_count = reader.read_u16()?;
    let mut protocol_range = None;
    let mut conformances = Vec::with_capacity(conformance_count as usize);
    if conformance_count > 0 {
        protocol_range = Some((reader.read_u16()?, reader.read_u16()?));
        for _ in 0..conformance_count {
            let protocol = reader.read_u16()?;
            let count = reader.read_u16()?;
            let vtis = (0..count)
                .map(|_| reader.read_u16())
                .collect::<Result<Vec<_>, _>>()?;
            conformances.push(ConformanceImage { protocol, vtis });
        }
    }

    Ok(ClassImage {
        name,
        inherit_from,
        instance_variables,
        method_table,
        type_method_table,
        inherits_initializers,
        initializer_table,
        methods,
        initializers,
        type_methods,
        protocol_range,
        conformances,
    })
}

fn decode_members(reader: &mut MetadataReader<'_>, count: u16) -> Result<Vec<MemberImage>, DecodeError> {
    (0..count).map(|_| decode_member(reader)).collect()
}

fn decode_member(reader: &mut MetadataReader<'_>) -> Result<MemberImage, DecodeError> {
    let name = reader.read_string()?;
    let vti = reader.read_u16()?;
    let offset = reader.position();
    let value = reader.read_u8()?;
    let access = AccessLevel::from_u8(value).ok_or(DecodeError::InvalidAccess { value, offset })?;
    let flag_bits = reader.read_u8()?;

    let argument_count = reader.read_u8()?;
    let arguments = (0..argument_count)
        .map(|_| decode_type(reader))
        .collect::<Result<Vec<_>, _>>()?;
    let return_type = decode_type(reader)?;

    let body = if flag_bits & flags::NATIVE != 0 {
        None
    } else {
        let locals = reader.read_u16()?;
        let length = reader.read_u32()? as usize;
        let code = reader.read_bytes(length)?;
        let literal_count = reader.read_u16()?;
        let literals = (0..literal_count)
            .map(|_| reader.read_u16())
            .collect::<Result<Vec<_>, _>>()?;
        Some(BodyImage {
            locals,
            code,
            literals,
        })
    };

    Ok(MemberImage {
        name,
        vti,
        access,
        flags: flag_bits,
        arguments,
        return_type,
        body,
    })
}

fn decode_type(reader: &mut MetadataReader<'_>) -> Result<TypeImage, DecodeError> {
    let offset = reader.position();
    let tag = reader.read_u8()?;
    let optional = reader.read_bool()?;
    let ty = match tag {
        tags::INTEGER..=tags::SELF => TypeImage::Simple { tag, optional },
        tags::CLASS => TypeImage::Class {
            index: reader.read_u16()?,
            args: decode_type_list(reader)?,
            optional,
        },
        tags::PROTOCOL => TypeImage::Protocol {
            index: reader.read_u16()?,
            args: decode_type_list(reader)?,
            optional,
        },
        tags::ENUM => TypeImage::Enum {
            index: reader.read_u16()?,
            optional,
        },
        tags::REFERENCE => TypeImage::Reference {
            index: reader.read_u16()?,
            optional,
        },
        tags::LOCAL_REFERENCE => TypeImage::LocalReference {
            index: reader.read_u16()?,
            optional,
        },
        tags::CALLABLE => TypeImage::Callable {
            params: decode_type_list(reader)?,
            returns: Box::new(decode_type(reader)?),
            optional,
        },
        tag => return Err(DecodeError::InvalidTypeTag { tag, offset }),
    };
    Ok(ty)
}

fn decode_type_list(reader: &mut MetadataReader<'_>) -> Result<Vec<TypeImage>, DecodeError> {
    let count = reader.read_u8()?;
    (0..count).map(|_| decode_type(reader)).collect()
}

impl fmt::Display for TypeImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let optional = match self {
            TypeImage::Simple { optional, .. }
            | TypeImage::Class { optional, .. }
            | TypeImage::Protocol { optional, .. }
            | TypeImage::Enum { optional, .. }
            | TypeImage::Reference { optional, .. }
            | TypeImage::LocalReference { optional, .. }
            | TypeImage::Callable { optional, .. } => *optional,
        };
        if optional {
            write!(f, "🍬")?;
        }
        match self {
            TypeImage::Simple { tag, .. } => {
                let name = match *tag {
                    tags::INTEGER => "🚂",
                    tags::DOUBLE => "🚀",
                    tags::BOOLEAN => "👌",
                    tags::SYMBOL => "🔣",
                    tags::NOTHINGNESS => "✨",
                    tags::SOMETHING => "⚪",
                    tags::SOME_OBJECT => "🔵",
                    _ => "🐕",
                };
                f.write_str(name)
            }
            TypeImage::Class { index, args, .. } => {
                write!(f, "class#{index}")?;
                write_args(f, args)
            }
            TypeImage::Protocol { index, args, .. } => {
                write!(f, "protocol#{index}")?;
                write_args(f, args)
            }
            TypeImage::Enum { index, .. } => write!(f, "enum#{index}"),
            TypeImage::Reference { index, .. } => write!(f, "${index}"),
            TypeImage::LocalReference { index, .. } => write!(f, "$local{index}"),
            TypeImage::Callable { params, returns, .. } => {
                write!(f, "🍇")?;
                for param in params {
                    write!(f, "{param}")?;
                }
                write!(f, "➡️{returns}🍉")
            }
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[TypeImage]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    write!(f, "<")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    write!(f, ">")
}

impl fmt::Display for MetadataImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "version {}, {} classes, {} packages, {} literals",
            self.version,
            self.class_count,
            self.packages.len(),
            self.literals.len()
        )?;
        let mut index = 0usize;
        for package in &self.packages {
            write!(f, "package {} {}", package.name, package.version)?;
            if package.requires_binary {
                write!(f, " (native)")?;
            }
            writeln!(f)?;
            for class in &package.classes {
                write!(f, "  [{index}] {}", class.name)?;
                if class.inherit_from as usize != index {
                    write!(f, " < [{}]", class.inherit_from)?;
                }
                writeln!(
                    f,
                    "  ivars {}  methods {}  type methods {}  initializers {}{}",
                    class.instance_variables,
                    class.method_table,
                    class.type_method_table,
                    class.initializer_table,
                    if class.inherits_initializers { " (inherited)" } else { "" }
                )?;
                for (label, members) in [
                    ("method", &class.methods),
                    ("initializer", &class.initializers),
                    ("type method", &class.type_methods),
                ] {
                    for member in members {
                        write!(f, "    {label} {} @{} (", member.name, member.vti)?;
                        for (i, argument) in member.arguments.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{argument}")?;
                        }
                        writeln!(f, ") -> {}", member.return_type)?;
                    }
                }
                for conformance in &class.conformances {
                    writeln!(f, "    protocol #{} -> {:?}", conformance.protocol, conformance.vtis)?;
                }
                index += 1;
            }
        }
        write!(f, "entry point [{}] @{}", self.entry_class, self.entry_vti)
    }
}
