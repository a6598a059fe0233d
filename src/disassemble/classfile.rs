// Class file reader
//
// Parses the JVM class file container: constant pool, access flags, type
// hierarchy, members and raw attributes. Bytecode is decoded separately by
// the printer.

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum ClassFormatError {
    #[error("not a class file (magic {0:#010x})")]
    BadMagic(u32),

    #[error("unexpected end of data at offset {offset} (needed {needed} more bytes)")]
    Truncated { offset: usize, needed: usize },

    #[error("unknown constant pool tag {tag} at entry #{index}")]
    UnknownConstant { tag: u8, index: u16 },

    #[error("constant pool entry #{index} is not {expected}")]
    BadConstant { index: u16, expected: &'static str },

    #[error("invalid bytecode at offset {offset}: {reason}")]
    BadCode { offset: usize, reason: String },

    #[error("{0} trailing bytes after the class file")]
    TrailingBytes(usize),
}

pub type ClassResult<T> = Result<T, ClassFormatError>;

pub const MAGIC: u32 = 0xCAFE_BABE;

/// Big-endian cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, len: usize) -> ClassResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(ClassFormatError::Truncated {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> ClassResult<()> {
        self.take(len).map(|_| ())
    }

    pub fn u1(&mut self) -> ClassResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u2(&mut self) -> ClassResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u4(&mut self) -> ClassResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i1(&mut self) -> ClassResult<i8> {
        Ok(self.u1()? as i8)
    }

    pub fn i2(&mut self) -> ClassResult<i16> {
        Ok(self.u2()? as i16)
    }

    pub fn i4(&mut self) -> ClassResult<i32> {
        Ok(self.u4()? as i32)
    }

    fn u8(&mut self) -> ClassResult<u64> {
        let high = self.u4()? as u64;
        let low = self.u4()? as u64;
        Ok((high << 32) | low)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Slot 0 and the second slot of long/double entries.
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name: u16 },
    String { value: u16 },
    FieldRef { class: u16, name_and_type: u16 },
    MethodRef { class: u16, name_and_type: u16 },
    InterfaceMethodRef { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType { descriptor: u16 },
    Dynamic { bootstrap: u16, name_and_type: u16 },
    InvokeDynamic { bootstrap: u16, name_and_type: u16 },
    Module { name: u16 },
    Package { name: u16 },
}

#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn read(reader: &mut ByteReader<'_>) -> ClassResult<Self> {
        let count = reader.u2()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unusable);

        while entries.len() < count as usize {
            let index = entries.len() as u16;
            let tag = reader.u1()?;
            let constant = match tag {
                1 => {
                    let len = reader.u2()? as usize;
                    Constant::Utf8(decode_modified_utf8(reader.take(len)?))
                }
                3 => Constant::Integer(reader.i4()?),
                4 => Constant::Float(f32::from_bits(reader.u4()?)),
                5 => Constant::Long(reader.u8()? as i64),
                6 => Constant::Double(f64::from_bits(reader.u8()?)),
                7 => Constant::Class { name: reader.u2()? },
                8 => Constant::String { value: reader.u2()? },
                9 => Constant::FieldRef {
                    class: reader.u2()?,
                    name_and_type: reader.u2()?,
                },
                10 => Constant::MethodRef {
                    class: reader.u2()?,
                    name_and_type: reader.u2()?,
                },
                11 => Constant::InterfaceMethodRef {
                    class: reader.u2()?,
                    name_and_type: reader.u2()?,
                },
                12 => Constant::NameAndType {
                    name: reader.u2()?,
                    descriptor: reader.u2()?,
                },
                15 => Constant::MethodHandle {
                    kind: reader.u1()?,
                    reference: reader.u2()?,
                },
                16 => Constant::MethodType {
                    descriptor: reader.u2()?,
                },
                17 => Constant::Dynamic {
                    bootstrap: reader.u2()?,
                    name_and_type: reader.u2()?,
                },
                18 => Constant::InvokeDynamic {
                    bootstrap: reader.u2()?,
                    name_and_type: reader.u2()?,
                },
                19 => Constant::Module { name: reader.u2()? },
                20 => Constant::Package { name: reader.u2()? },
                _ => return Err(ClassFormatError::UnknownConstant { tag, index }),
            };

            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            entries.push(constant);
            if wide {
                entries.push(Constant::Unusable);
            }
        }

        Ok(Self { entries })
    }

    pub fn get(&self, index: u16) -> Option<&Constant> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => None,
            Some(constant) => Some(constant),
        }
    }

    pub fn utf8(&self, index: u16) -> ClassResult<&str> {
        match self.get(index) {
            Some(Constant::Utf8(value)) => Ok(value),
            _ => Err(ClassFormatError::BadConstant {
                index,
                expected: "a UTF-8 string",
            }),
        }
    }

    pub fn class_name(&self, index: u16) -> ClassResult<&str> {
        match self.get(index) {
            Some(Constant::Class { name }) => self.utf8(*name),
            _ => Err(ClassFormatError::BadConstant {
                index,
                expected: "a class",
            }),
        }
    }

    pub fn name_and_type(&self, index: u16) -> ClassResult<(&str, &str)> {
        match self.get(index) {
            Some(Constant::NameAndType { name, descriptor }) => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => Err(ClassFormatError::BadConstant {
                index,
                expected: "a name and type",
            }),
        }
    }

    /// Owner, name and descriptor of a field, method or interface method reference.
    pub fn member_ref(&self, index: u16) -> ClassResult<(&str, &str, &str)> {
        match self.get(index) {
            Some(
                Constant::FieldRef {
                    class,
                    name_and_type,
                }
                | Constant::MethodRef {
                    class,
                    name_and_type,
                }
                | Constant::InterfaceMethodRef {
                    class,
                    name_and_type,
                },
            ) => {
                let (name, descriptor) = self.name_and_type(*name_and_type)?;
                Ok((self.class_name(*class)?, name, descriptor))
            }
            _ => Err(ClassFormatError::BadConstant {
                index,
                expected: "a member reference",
            }),
        }
    }

    /// Render a loadable constant the way it appears as an instruction operand.
    pub fn render(&self, index: u16) -> ClassResult<String> {
        let constant = self.get(index).ok_or(ClassFormatError::BadConstant {
            index,
            expected: "a usable constant",
        })?;

        Ok(match constant {
            Constant::Utf8(value) => format!("{:?}", value),
            Constant::Integer(value) => value.to_string(),
            Constant::Float(value) => format!("{}F", value),
            Constant::Long(value) => format!("{}L", value),
            Constant::Double(value) => format!("{}D", value),
            Constant::Class { name } => format!("L{};", self.utf8(*name)?),
            Constant::String { value } => format!("{:?}", self.utf8(*value)?),
            Constant::FieldRef { .. }
            | Constant::MethodRef { .. }
            | Constant::InterfaceMethodRef { .. } => {
                let (owner, name, descriptor) = self.member_ref(index)?;
                format!("{}.{} {}", owner, name, descriptor)
            }
            Constant::NameAndType { name, descriptor } => {
                format!("{}:{}", self.utf8(*name)?, self.utf8(*descriptor)?)
            }
            Constant::MethodHandle { kind, reference } => {
                let (owner, name, descriptor) = self.member_ref(*reference)?;
                format!("{} {}.{} {}", handle_kind(*kind), owner, name, descriptor)
            }
            Constant::MethodType { descriptor } => self.utf8(*descriptor)?.to_string(),
            Constant::Dynamic {
                bootstrap,
                name_and_type,
            }
            | Constant::InvokeDynamic {
                bootstrap,
                name_and_type,
            } => {
                let (name, descriptor) = self.name_and_type(*name_and_type)?;
                format!("{} {} [bootstrap #{}]", name, descriptor, bootstrap)
            }
            Constant::Module { name } | Constant::Package { name } => {
                self.utf8(*name)?.to_string()
            }
            Constant::Unusable => unreachable!("filtered by get"),
        })
    }
}

fn handle_kind(kind: u8) -> &'static str {
    match kind {
        1 => "getField",
        2 => "getStatic",
        3 => "putField",
        4 => "putStatic",
        5 => "invokeVirtual",
        6 => "invokeStatic",
        7 => "invokeSpecial",
        8 => "newInvokeSpecial",
        9 => "invokeInterface",
        _ => "unknownHandle",
    }
}

/// Decode the JVM's modified UTF-8: `C0 80` for NUL and surrogate pairs
/// encoded as two three-byte sequences.
fn decode_modified_utf8(bytes: &[u8]) -> String {
    if let Ok(plain) = std::str::from_utf8(bytes) {
        return plain.to_string();
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 && i + 1 < bytes.len() {
            units.push((((b & 0x1F) as u16) << 6) | (bytes[i + 1] & 0x3F) as u16);
            i += 2;
        } else if b & 0xF0 == 0xE0 && i + 2 < bytes.len() {
            units.push(
                (((b & 0x0F) as u16) << 12)
                    | (((bytes[i + 1] & 0x3F) as u16) << 6)
                    | (bytes[i + 2] & 0x3F) as u16,
            );
            i += 3;
        } else {
            units.push(0xFFFD);
            i += 1;
        }
    }
    String::from_utf16_lossy(&units)
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub data: Vec<u8>,
}

impl Attribute {
    fn read_all(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> ClassResult<Vec<Self>> {
        let count = reader.u2()?;
        (0..count)
            .map(|_| {
                let name = pool.utf8(reader.u2()?)?.to_string();
                let len = reader.u4()? as usize;
                let data = reader.take(len)?.to_vec();
                Ok(Attribute { name, data })
            })
            .collect()
    }
}

/// A field or a method.
#[derive(Debug, Clone)]
pub struct Member {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<Attribute>,
}

impl Member {
    fn read_all(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> ClassResult<Vec<Self>> {
        let count = reader.u2()?;
        (0..count)
            .map(|_| {
                let access = reader.u2()?;
                let name = pool.utf8(reader.u2()?)?.to_string();
                let descriptor = pool.utf8(reader.u2()?)?.to_string();
                let attributes = Attribute::read_all(reader, pool)?;
                Ok(Member {
                    access,
                    name,
                    descriptor,
                    attributes,
                })
            })
            .collect()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct ExceptionHandler {
    pub start: u16,
    pub end: u16,
    pub handler: u16,
    /// `None` catches everything (`finally`).
    pub catch_type: Option<String>,
}

/// Body of a `Code` attribute.
#[derive(Debug, Clone)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub bytecode: Vec<u8>,
    pub handlers: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

impl Code {
    pub fn parse(data: &[u8], pool: &ConstantPool) -> ClassResult<Self> {
        let mut reader = ByteReader::new(data);
        let max_stack = reader.u2()?;
        let max_locals = reader.u2()?;
        let code_len = reader.u4()? as usize;
        let bytecode = reader.take(code_len)?.to_vec();

        let handler_count = reader.u2()?;
        let mut handlers = Vec::with_capacity(handler_count as usize);
        for _ in 0..handler_count {
            let start = reader.u2()?;
            let end = reader.u2()?;
            let handler = reader.u2()?;
            let catch_type = match reader.u2()? {
                0 => None,
                index => Some(pool.class_name(index)?.to_string()),
            };
            handlers.push(ExceptionHandler {
                start,
                end,
                handler,
                catch_type,
            });
        }

        let attributes = Attribute::read_all(&mut reader, pool)?;
        Ok(Self {
            max_stack,
            max_locals,
            bytecode,
            handlers,
            attributes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub pool: ConstantPool,
    pub access: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<Member>,
    pub methods: Vec<Member>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> ClassResult<Self> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader.u4()?;
        if magic != MAGIC {
            return Err(ClassFormatError::BadMagic(magic));
        }
        let minor_version = reader.u2()?;
        let major_version = reader.u2()?;
        let pool = ConstantPool::read(&mut reader)?;

        let access = reader.u2()?;
        let this_class = pool.class_name(reader.u2()?)?.to_string();
        let super_class = match reader.u2()? {
            0 => None,
            index => Some(pool.class_name(index)?.to_string()),
        };

        let interface_count = reader.u2()?;
        let interfaces = (0..interface_count)
            .map(|_| Ok(pool.class_name(reader.u2()?)?.to_string()))
            .collect::<ClassResult<Vec<_>>>()?;

        let fields = Member::read_all(&mut reader, &pool)?;
        let methods = Member::read_all(&mut reader, &pool)?;
        let attributes = Attribute::read_all(&mut reader, &pool)?;

        if !reader.is_empty() {
            return Err(ClassFormatError::TrailingBytes(reader.remaining()));
        }

        Ok(Self {
            minor_version,
            major_version,
            pool,
            access,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Value of the `SourceFile` attribute, if present and well formed.
    pub fn source_file(&self) -> Option<&str> {
        let data = &self.attribute("SourceFile")?.data;
        let index = ByteReader::new(data).u2().ok()?;
        self.pool.utf8(index).ok()
    }

    pub fn is_interface(&self) -> bool {
        self.access & 0x0200 != 0
    }
}

/// Which access flag table applies to a set of flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagTarget {
    Class,
    Field,
    Method,
}

pub struct AccessFlags {
    pub flags: u16,
    pub target: FlagTarget,
}

impl fmt::Display for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table: &[(u16, &str)] = match self.target {
            FlagTarget::Class => &[
                (0x0001, "public"),
                (0x0010, "final"),
                (0x0400, "abstract"),
                (0x1000, "synthetic"),
                (0x2000, "annotation"),
                (0x4000, "enum"),
                (0x8000, "module"),
            ],
            FlagTarget::Field => &[
                (0x0001, "public"),
                (0x0002, "private"),
                (0x0004, "protected"),
                (0x0008, "static"),
                (0x0010, "final"),
                (0x0040, "volatile"),
                (0x0080, "transient"),
                (0x1000, "synthetic"),
                (0x4000, "enum"),
            ],
            FlagTarget::Method => &[
                (0x0001, "public"),
                (0x0002, "private"),
                (0x0004, "protected"),
                (0x0008, "static"),
                (0x0010, "final"),
                (0x0020, "synchronized"),
                (0x0040, "bridge"),
                (0x0080, "varargs"),
                (0x0100, "native"),
                (0x0400, "abstract"),
                (0x0800, "strict"),
                (0x1000, "synthetic"),
            ],
        };

        for (bit, word) in table {
            // Interfaces are implicitly abstract.
            if self.target == FlagTarget::Class && *bit == 0x0400 && self.flags & 0x0200 != 0 {
                continue;
            }
            if self.flags & bit != 0 {
                write!(f, "{} ", word)?;
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_demo_class() {
        let class = ClassFile::parse(&fixtures::demo_class()).unwrap();
        assert_eq!(class.major_version, 52);
        assert_eq!(class.this_class, "com/example/Demo");
        assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
        assert_eq!(class.fields.len(), 1);
        assert_eq!(class.fields[0].name, "count");
        assert_eq!(class.methods[0].name, "<init>");
        assert_eq!(class.source_file(), Some("Demo.java"));

        let code = Code::parse(&class.methods[0].attribute("Code").unwrap().data, &class.pool)
            .unwrap();
        assert_eq!(code.bytecode, vec![0x2a, 0xb7, 0x00, 0x01, 0xb1]);
        assert_eq!(
            class.pool.member_ref(1).unwrap(),
            ("java/lang/Object", "<init>", "()V")
        );
    }

    #[test]
    fn test_bad_magic() {
        let err = ClassFile::parse(b"PK\x03\x04rest").unwrap_err();
        assert!(matches!(err, ClassFormatError::BadMagic(0x504B_0304)));
    }

    #[test]
    fn test_truncated_class() {
        let bytes = fixtures::demo_class();
        let err = ClassFile::parse(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, ClassFormatError::Truncated { .. }), "{:?}", err);
    }

    #[test]
    fn test_long_constants_take_two_slots() {
        let mut bytes = vec![0u8, 4, 5];
        bytes.extend_from_slice(&(1i64 << 40).to_be_bytes());
        bytes.extend_from_slice(&[1, 0, 1, b'x']);
        let pool = ConstantPool::read(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(pool.get(1), Some(&Constant::Long(1 << 40)));
        assert_eq!(pool.get(2), None);
        assert_eq!(pool.utf8(3).unwrap(), "x");
        assert_eq!(pool.render(1).unwrap(), "1099511627776L");
    }

    #[test]
    fn test_self_referencing_method_handle_is_rejected() {
        // #1 = MethodHandle invokeStatic -> #1
        let bytes = [0u8, 2, 15, 6, 0, 1];
        let pool = ConstantPool::read(&mut ByteReader::new(&bytes)).unwrap();
        let err = pool.render(1).unwrap_err();
        assert!(
            matches!(err, ClassFormatError::BadConstant { index: 1, .. }),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_mutually_referencing_method_handles_are_rejected() {
        let bytes = [0u8, 3, 15, 6, 0, 2, 15, 6, 0, 1];
        let pool = ConstantPool::read(&mut ByteReader::new(&bytes)).unwrap();
        assert!(pool.render(1).is_err());
        assert!(pool.render(2).is_err());
    }

    #[test]
    fn test_method_handle_renders_its_member() {
        let class = ClassFile::parse(&fixtures::demo_class()).unwrap();
        let mut pool = class.pool.clone();
        pool.entries.push(Constant::MethodHandle {
            kind: 7,
            reference: 1,
        });
        let index = (pool.entries.len() - 1) as u16;
        let (owner, name, descriptor) = class.pool.member_ref(1).unwrap();
        let text = pool.render(index).unwrap();
        assert!(
            text.ends_with(&format!("{}.{} {}", owner, name, descriptor)),
            "{}",
            text
        );
    }

    #[test]
    fn test_modified_utf8_nul() {
        assert_eq!(decode_modified_utf8(&[b'a', 0xC0, 0x80, b'b']), "a\0b");
    }

    #[test]
    fn test_access_flags_rendering() {
        let flags = AccessFlags {
            flags: 0x0609,
            target: FlagTarget::Method,
        };
        assert_eq!(flags.to_string(), "public static abstract ");
        let interface = AccessFlags {
            flags: 0x0601,
            target: FlagTarget::Class,
        };
        assert_eq!(interface.to_string(), "public ");
    }
}
